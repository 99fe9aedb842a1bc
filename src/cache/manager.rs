// Allow dead code: Infrastructure methods for future use
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Course, Deadline, ScheduleEntry, UserProfile};

/// Consider cache stale after 1 hour.
/// Course lists and deadlines change slowly enough that an hour keeps
/// reads cheap without showing badly outdated data.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew (negative ages) as well
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    // ===== Courses =====

    pub fn load_courses(&self) -> Result<Option<CachedData<Vec<Course>>>> {
        self.load("courses")
    }

    pub fn save_courses(&self, courses: &[Course]) -> Result<()> {
        self.save("courses", &courses)
    }

    // ===== Deadlines =====

    pub fn load_deadlines(&self) -> Result<Option<CachedData<Vec<Deadline>>>> {
        self.load("deadlines")
    }

    pub fn save_deadlines(&self, deadlines: &[Deadline]) -> Result<()> {
        self.save("deadlines", &deadlines)
    }

    // ===== Per-Course Schedule =====

    pub fn load_schedule(&self, course_id: i64) -> Result<Option<CachedData<Vec<ScheduleEntry>>>> {
        self.load(&format!("schedule_{}", course_id))
    }

    pub fn save_schedule(&self, course_id: i64, entries: &[ScheduleEntry]) -> Result<()> {
        self.save(&format!("schedule_{}", course_id), &entries)
    }

    // ===== Profile =====

    pub fn load_profile(&self) -> Result<Option<CachedData<UserProfile>>> {
        self.load("profile")
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.save("profile", profile)
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(
        &self,
        name: &str,
        loader: impl FnOnce() -> Result<Option<CachedData<T>>>,
    ) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            courses: self.load_age("courses", || self.load_courses()),
            deadlines: self.load_age("deadlines", || self.load_deadlines()),
            profile: self.load_age("profile", || self.load_profile()),
        }
    }

    /// Helper to check staleness and log errors without failing
    fn is_cache_stale<T>(
        &self,
        name: &str,
        loader: impl FnOnce() -> Result<Option<CachedData<T>>>,
    ) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true, // No cache = stale
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true // Error reading = treat as stale
            }
        }
    }

    /// Check if any of the core cached data is stale
    pub fn any_stale(&self) -> bool {
        let stale_checks = [
            self.is_cache_stale("courses", || self.load_courses()),
            self.is_cache_stale("deadlines", || self.load_deadlines()),
        ];
        stale_checks.iter().any(|&stale| stale)
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub courses: Option<String>,
    pub deadlines: Option<String>,
    pub profile: Option<String>,
}

impl CacheAges {
    /// Returns the most recent update time across all cache types
    pub fn last_updated(&self) -> String {
        let ages = [&self.courses, &self.deadlines, &self.profile];

        for age in ages.iter().copied().flatten() {
            return age.clone();
        }

        "never".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_cache_ages_last_updated_with_values() {
        let ages = CacheAges {
            courses: Some("5m ago".to_string()),
            deadlines: None,
            profile: None,
        };
        assert_eq!(ages.last_updated(), "5m ago");
    }

    #[test]
    fn test_cache_ages_last_updated_empty() {
        let ages = CacheAges::default();
        assert_eq!(ages.last_updated(), "never");
    }

    #[test]
    fn test_courses_roundtrip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cache = CacheManager::new(dir.path().to_path_buf()).expect("create cache");

        assert!(cache.load_courses().expect("load empty").is_none());

        let courses = vec![Course {
            id: 42,
            name: "Intro to CS".to_string(),
            short_name: "CS101".to_string(),
            description: String::new(),
            image_url: None,
            progress: 62.5,
            favourite: false,
        }];
        cache.save_courses(&courses).expect("save courses");

        let loaded = cache
            .load_courses()
            .expect("load courses")
            .expect("courses present");
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data[0].id, 42);
        assert!(!loaded.is_stale());
    }
}
