// Allow dead code: Infrastructure methods for future use
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{SiteInfo, UserProfile};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// A live authentication session: the web service token plus the
/// identity it was issued for.
///
/// Moodle publishes no token lifetime, so `valid_until` is usually
/// absent and expiry is detected reactively when the backend rejects
/// the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub site_name: Option<String>,
    pub avatar_url: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl SessionData {
    /// Build a session from a fresh token and the site info fetched
    /// with it.
    pub fn from_login(token: String, info: &SiteInfo) -> Self {
        Self {
            token,
            user_id: info.user_id,
            username: info.username.clone(),
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            full_name: info.full_name.clone(),
            site_name: info.site_name.clone(),
            avatar_url: info.avatar_url.clone(),
            issued_at: Utc::now(),
            valid_until: None,
        }
    }

    /// Replace the identity fields from re-fetched site info, keeping
    /// the token and timestamps.
    pub fn update_profile(&mut self, info: &SiteInfo) {
        self.user_id = info.user_id;
        self.username = info.username.clone();
        self.first_name = info.first_name.clone();
        self.last_name = info.last_name.clone();
        self.full_name = info.full_name.clone();
        self.site_name = info.site_name.clone();
        self.avatar_url = info.avatar_url.clone();
    }

    /// A session with no `valid_until` never expires locally.
    pub fn is_expired(&self) -> bool {
        match self.valid_until {
            Some(valid_until) => Utc::now() > valid_until,
            None => false,
        }
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.valid_until.map(|valid_until| valid_until - Utc::now())
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Disk persistence for the session, under the cache directory.
pub struct SessionStore {
    cache_dir: PathBuf,
}

impl SessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load a persisted session from disk. Expired sessions are
    /// reported as absent.
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let data: SessionData = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;

        if data.is_expired() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Save session to disk
    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Remove the persisted session, if any
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> SessionData {
        SessionData {
            token: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            user_id: 5,
            username: "jdoe".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            full_name: "Jane Doe".to_string(),
            site_name: Some("Example University".to_string()),
            avatar_url: None,
            issued_at: Utc::now(),
            valid_until: None,
        }
    }

    #[test]
    fn test_session_without_valid_until_never_expires() {
        assert!(!sample_session().is_expired());
    }

    #[test]
    fn test_session_expiry() {
        let mut session = sample_session();
        session.valid_until = Some(Utc::now() - Duration::minutes(1));
        assert!(session.is_expired());

        session.valid_until = Some(Utc::now() + Duration::minutes(30));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = SessionStore::new(dir.path().to_path_buf());

        assert!(store.load().expect("load empty").is_none());

        let session = sample_session();
        store.save(&session).expect("save session");

        let loaded = store.load().expect("load session").expect("session present");
        assert_eq!(loaded.token, session.token);
        assert_eq!(loaded.user_id, 5);

        store.clear().expect("clear session");
        assert!(store.load().expect("load cleared").is_none());
        // Clearing twice is fine
        store.clear().expect("clear again");
    }

    #[test]
    fn test_expired_session_not_loaded() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = SessionStore::new(dir.path().to_path_buf());

        let mut session = sample_session();
        session.valid_until = Some(Utc::now() - Duration::minutes(1));
        store.save(&session).expect("save session");

        assert!(store.load().expect("load expired").is_none());
    }
}
