//! Snapshot cache for fetched data.
//!
//! The cache keeps the last successful response for each data kind as
//! a JSON file with a `cached_at` timestamp. There is no freshness
//! promise beyond "replaced on the next successful fetch".

pub mod manager;

pub use manager::{CacheAges, CacheManager, CachedData};
