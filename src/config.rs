//! Application configuration management.
//!
//! This module handles loading and saving the application
//! configuration: the backend base URL, site name, and last used
//! username.
//!
//! Configuration is stored at `~/.config/coursedesk/config.json`.
//! `MOODLE_BASE_URL` overrides the configured base URL, which is how
//! tests and development point at a local server.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "coursedesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured base URL
const BASE_URL_ENV: &str = "MOODLE_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub site_name: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// The backend base URL: environment override first, then config.
    pub fn resolved_base_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                return Ok(url);
            }
        }
        self.base_url.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "No backend configured. Set {} or run: coursedesk login --url <site-url>",
                BASE_URL_ENV
            )
        })
    }

    /// Host portion of the resolved base URL, used to scope keychain
    /// and cache entries per site.
    pub fn backend_host(&self) -> Result<String> {
        Ok(Self::host_component(&self.resolved_base_url()?))
    }

    /// Cache directory, partitioned by backend host so two sites never
    /// mix data.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if let Ok(url) = self.resolved_base_url() {
            path = path.join(Self::host_component(&url));
        }
        Ok(path)
    }

    /// Extract a filesystem-safe host component from a URL.
    fn host_component(url: &str) -> String {
        let without_scheme = url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let host = without_scheme.split('/').next().unwrap_or(without_scheme);
        host.replace(':', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_component() {
        assert_eq!(
            Config::host_component("https://lms.example.edu/moodle"),
            "lms.example.edu"
        );
        assert_eq!(
            Config::host_component("http://127.0.0.1:8080"),
            "127.0.0.1_8080"
        );
        assert_eq!(Config::host_component("lms.example.edu"), "lms.example.edu");
    }
}
