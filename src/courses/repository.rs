//! Course and schedule retrieval.
//!
//! Every operation resolves the session token from `AuthRepository`
//! first and fails `Unauthenticated` without touching the network when
//! there is none. When the backend reports the token dead, the session
//! is invalidated before the error propagates - the repository never
//! retries on its own.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;

use crate::api::{ApiError, MoodleClient};
use crate::auth::AuthRepository;
use crate::cache::{CacheManager, CachedData};
use crate::models::{Course, Deadline, ScheduleEntry, UrgentAlert};

// ============================================================================
// Constants
// ============================================================================

/// Days ahead scanned for upcoming deadlines.
/// A month matches the planner view the deadlines feed.
const DEADLINE_LOOKAHEAD_DAYS: i64 = 30;

/// Default number of deadlines fetched per request.
pub const DEFAULT_DEADLINE_LIMIT: u32 = 10;

/// Deadlines scanned when computing urgent alerts.
const ALERT_SCAN_LIMIT: u32 = 20;

/// Maximum number of urgent alerts surfaced at once.
const MAX_URGENT_ALERTS: usize = 3;

/// Retrieves course, schedule, and deadline data.
/// Clone is cheap - the client, auth repository, and cache are shared.
#[derive(Clone)]
pub struct CourseRepository {
    api: MoodleClient,
    auth: AuthRepository,
    cache: Arc<CacheManager>,
}

impl CourseRepository {
    pub fn new(api: MoodleClient, auth: AuthRepository, cache: CacheManager) -> Self {
        Self {
            api,
            auth,
            cache: Arc::new(cache),
        }
    }

    /// Session token and user id for the next request, or
    /// `Unauthenticated` without a network call when no live session
    /// exists. A locally expired session is invalidated on the way out.
    async fn session_token(&self) -> Result<(String, i64), ApiError> {
        match self.auth.current_session().await {
            Some(data) if !data.is_expired() => Ok((data.token, data.user_id)),
            Some(_) => {
                self.auth.invalidate_session().await;
                Err(ApiError::Unauthenticated)
            }
            None => Err(ApiError::Unauthenticated),
        }
    }

    /// Translate a ws failure. A token rejection invalidates the
    /// session first, so a subsequent `current_session()` correctly
    /// reports absence.
    async fn fail<T>(&self, err: ApiError) -> Result<T, ApiError> {
        if matches!(err, ApiError::Unauthenticated) {
            self.auth.invalidate_session().await;
        }
        Err(err)
    }

    /// Fetch the user's enrolled courses. The snapshot replaces the
    /// cached one on success.
    pub async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let (token, user_id) = self.session_token().await?;

        let fetched = match self.api.fetch_user_courses(&token, user_id).await {
            Ok(courses) => courses,
            Err(e) => return self.fail(e).await,
        };

        let courses: Vec<Course> = fetched.iter().map(Course::from_moodle).collect();

        if let Err(e) = self.cache.save_courses(&courses) {
            warn!(error = %e, "Failed to cache courses");
        }
        Ok(courses)
    }

    /// Fetch the activity schedule for a course, in backend order.
    /// Fails `NotFound` when the course id is unknown.
    pub async fn get_schedule(&self, course_id: i64) -> Result<Vec<ScheduleEntry>, ApiError> {
        let (token, _) = self.session_token().await?;

        let sections = match self.api.fetch_course_contents(&token, course_id).await {
            Ok(sections) => sections,
            Err(e) => return self.fail(e).await,
        };

        let entries = ScheduleEntry::from_contents(&sections);

        if let Err(e) = self.cache.save_schedule(course_id, &entries) {
            warn!(error = %e, course_id, "Failed to cache schedule");
        }
        Ok(entries)
    }

    /// A single course by id, from the course list.
    pub async fn course_details(&self, course_id: i64) -> Result<Course, ApiError> {
        let courses = self.list_courses().await?;
        courses
            .into_iter()
            .find(|course| course.id == course_id)
            .ok_or_else(|| ApiError::NotFound(format!("course {}", course_id)))
    }

    /// Deadlines over the next 30 days, soonest first.
    pub async fn upcoming_deadlines(&self, limit: u32) -> Result<Vec<Deadline>, ApiError> {
        let (token, _) = self.session_token().await?;

        let now = Utc::now();
        let from = now.timestamp();
        let to = (now + Duration::days(DEADLINE_LOOKAHEAD_DAYS)).timestamp();

        let events = match self.api.fetch_calendar_events(&token, from, to, limit).await {
            Ok(events) => events,
            Err(e) => return self.fail(e).await,
        };

        let mut deadlines: Vec<Deadline> = events.iter().map(Deadline::from_event).collect();
        deadlines.sort_by_key(|deadline| deadline.due_at);

        if let Err(e) = self.cache.save_deadlines(&deadlines) {
            warn!(error = %e, "Failed to cache deadlines");
        }
        Ok(deadlines)
    }

    /// Deadlines due within 24 hours, capped at three.
    pub async fn urgent_alerts(&self) -> Result<Vec<UrgentAlert>, ApiError> {
        let deadlines = self.upcoming_deadlines(ALERT_SCAN_LIMIT).await?;
        Ok(deadlines
            .iter()
            .filter(|deadline| deadline.urgent)
            .take(MAX_URGENT_ALERTS)
            .map(UrgentAlert::from_deadline)
            .collect())
    }

    // ===== Cached Snapshots =====
    //
    // Last successful fetch with age metadata; no freshness promise.

    pub fn cached_courses(&self) -> Option<CachedData<Vec<Course>>> {
        self.cache.load_courses().ok().flatten()
    }

    pub fn cached_schedule(&self, course_id: i64) -> Option<CachedData<Vec<ScheduleEntry>>> {
        self.cache.load_schedule(course_id).ok().flatten()
    }

    pub fn cached_deadlines(&self) -> Option<CachedData<Vec<Deadline>>> {
        self.cache.load_deadlines().ok().flatten()
    }
}
