//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `AuthRepository`: owner of the single in-process session
//! - `SessionData` / `SessionStore`: the session record and its disk copy
//! - `CredentialStore`: secure OS-level credential storage via keyring
//!
//! At most one session is live per process; replacing or clearing it is
//! atomic with respect to concurrent readers.

pub mod credentials;
pub mod repository;
pub mod session;

pub use credentials::CredentialStore;
pub use repository::{AuthRepository, Credentials};
pub use session::{SessionData, SessionStore};
