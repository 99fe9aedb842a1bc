//! Session ownership: login, lookup, and invalidation.
//!
//! `AuthRepository` holds the single session slot for the process.
//! Lookups and invalidation are serialized through an `RwLock`; the
//! lock is never held across a network call - callers copy the token
//! out under the read guard and drop it before any I/O.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{ApiError, MoodleClient};
use crate::models::UserProfile;

use super::session::{SessionData, SessionStore};

/// Transient login credentials, held only for the duration of a login
/// call. Long-term storage goes through `CredentialStore`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Owns the single authentication session for the process.
/// Clone is cheap - the session slot is shared behind an Arc.
#[derive(Clone)]
pub struct AuthRepository {
    api: MoodleClient,
    store: Arc<SessionStore>,
    // Replaced wholesale under the write guard, so a reader never
    // observes fields from two different sessions.
    slot: Arc<RwLock<Option<SessionData>>>,
}

impl AuthRepository {
    pub fn new(api: MoodleClient, store: SessionStore) -> Self {
        Self {
            api,
            store: Arc::new(store),
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Restore a persisted session from disk, if present and not
    /// expired. Returns whether a session was restored.
    pub async fn restore(&self) -> bool {
        match self.store.load() {
            Ok(Some(data)) => {
                debug!(user = %data.username, "Restored session from disk");
                *self.slot.write().await = Some(data);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session");
                false
            }
        }
    }

    /// Authenticate and store the new session, replacing any prior one.
    ///
    /// The network round trips happen before the slot is touched: a
    /// failed login leaves an existing session in place.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionData, ApiError> {
        let token = self
            .api
            .login(&credentials.username, &credentials.password)
            .await?;
        let info = self.api.fetch_site_info(&token).await?;

        let data = SessionData::from_login(token, &info);
        {
            let mut slot = self.slot.write().await;
            *slot = Some(data.clone());
        }

        if let Err(e) = self.store.save(&data) {
            warn!(error = %e, "Failed to persist session");
        }

        info!(user = %data.username, "Login successful");
        Ok(data)
    }

    /// The cached session, without a network call.
    pub async fn current_session(&self) -> Option<SessionData> {
        self.slot.read().await.clone()
    }

    /// Token for request tagging, or None when there is no live
    /// session. A locally expired session is cleared on the way out.
    pub async fn token(&self) -> Option<String> {
        {
            let slot = self.slot.read().await;
            match slot.as_ref() {
                None => return None,
                Some(data) if !data.is_expired() => return Some(data.token.clone()),
                Some(_) => {}
            }
        }
        // Read guard dropped above; expired sessions are cleared here.
        debug!("Session expired locally");
        self.invalidate_session().await;
        None
    }

    /// Check if the user is authenticated with a valid session
    pub async fn is_authenticated(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|data| !data.is_expired())
            .unwrap_or(false)
    }

    /// Clear the session slot and its disk copy. Idempotent.
    pub async fn invalidate_session(&self) {
        let had_session = {
            let mut slot = self.slot.write().await;
            slot.take().is_some()
        };
        if had_session {
            debug!("Session invalidated");
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// The stored user profile, without a network call.
    pub async fn user_profile(&self) -> Option<UserProfile> {
        self.slot.read().await.as_ref().map(SessionData::profile)
    }

    /// Re-fetch site info under the current token and update the
    /// stored identity. The token itself is unchanged.
    pub async fn refresh_profile(&self) -> Result<UserProfile, ApiError> {
        let token = self.token().await.ok_or(ApiError::Unauthenticated)?;

        let info = match self.api.fetch_site_info(&token).await {
            Ok(info) => info,
            Err(ApiError::Unauthenticated) => {
                // Backend rejected the token: drop the dead session
                // before propagating.
                self.invalidate_session().await;
                return Err(ApiError::Unauthenticated);
            }
            Err(e) => return Err(e),
        };

        let updated = {
            let mut slot = self.slot.write().await;
            match slot.as_mut() {
                Some(data) => {
                    data.update_profile(&info);
                    Some(data.clone())
                }
                // Invalidated concurrently; don't resurrect it.
                None => None,
            }
        };

        match updated {
            Some(data) => {
                if let Err(e) = self.store.save(&data) {
                    warn!(error = %e, "Failed to persist session");
                }
                Ok(data.profile())
            }
            None => Err(ApiError::Unauthenticated),
        }
    }
}
