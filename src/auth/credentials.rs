// Allow dead code: Infrastructure methods for future use
#![allow(dead_code)]

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "coursedesk";

/// OS-keychain storage for the backend password.
///
/// Entries are scoped per backend host so credentials for two sites
/// never collide.
pub struct CredentialStore {
    service: String,
}

impl CredentialStore {
    pub fn for_host(host: &str) -> Self {
        Self {
            service: format!("{}:{}", SERVICE_NAME, host),
        }
    }

    fn entry(&self, username: &str) -> Result<Entry> {
        Entry::new(&self.service, username).context("Failed to create keyring entry")
    }

    /// Store username and password in the OS keychain
    pub fn store(&self, username: &str, password: &str) -> Result<()> {
        self.entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve password for a username from the OS keychain
    pub fn get_password(&self, username: &str) -> Result<String> {
        self.entry(username)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete stored credentials for a username
    pub fn delete(&self, username: &str) -> Result<()> {
        self.entry(username)?
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check if credentials exist for a username
    pub fn has_credentials(&self, username: &str) -> bool {
        match self.entry(username) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }
}
