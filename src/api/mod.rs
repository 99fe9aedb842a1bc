//! REST API client module for Moodle Web Services.
//!
//! This module provides the `MoodleClient` for communicating with a
//! Moodle-compatible backend to fetch course, schedule, and calendar
//! data.
//!
//! Authentication uses a web service token obtained through the
//! `login/token.php` endpoint; every data call passes the token as a
//! query parameter per the Moodle REST contract.

pub mod client;
pub mod error;

pub use client::MoodleClient;
pub use error::ApiError;
