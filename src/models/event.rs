// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format_time_remaining;

use super::schedule::ModuleKind;

/// Deadlines due within this many hours are flagged urgent.
const URGENT_WINDOW_HOURS: i64 = 24;

/// Calendar event as returned by
/// `core_calendar_get_action_events_by_timesort`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoodleEvent {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub format: Option<i32>,
    #[serde(rename = "courseid")]
    pub course_id: Option<i64>,
    #[serde(rename = "groupid")]
    pub group_id: Option<i64>,
    #[serde(rename = "userid")]
    pub user_id: Option<i64>,
    #[serde(rename = "modulename")]
    pub module_name: Option<String>,
    pub instance: Option<i64>,
    #[serde(rename = "eventtype")]
    pub event_type: Option<String>,
    #[serde(rename = "timestart")]
    pub time_start: i64,
    #[serde(rename = "timeduration")]
    pub time_duration: Option<i64>,
    pub visible: Option<i32>,
    pub url: Option<String>,
    pub course: Option<EventCourse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCourse {
    pub id: i64,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "shortname")]
    pub short_name: String,
}

/// Domain deadline model built from a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    pub id: i64,
    pub title: String,
    pub course_name: String,
    pub course_id: Option<i64>,
    pub due_at: DateTime<Utc>,
    pub kind: ModuleKind,
    pub url: Option<String>,
    pub urgent: bool,
}

impl Deadline {
    pub fn from_event(event: &MoodleEvent) -> Self {
        let due_at =
            DateTime::<Utc>::from_timestamp(event.time_start, 0).unwrap_or(DateTime::UNIX_EPOCH);

        let hours_until = (due_at - Utc::now()).num_hours();

        Self {
            id: event.id,
            title: event.name.clone(),
            course_name: event
                .course
                .as_ref()
                .map(|c| c.short_name.clone())
                .unwrap_or_default(),
            course_id: event.course_id,
            due_at,
            kind: ModuleKind::from_modname(event.module_name.as_deref()),
            url: event.url.clone(),
            urgent: (0..URGENT_WINDOW_HOURS).contains(&hours_until),
        }
    }

    /// Human time until due: "45m", "3h", "2d", or "overdue".
    pub fn time_remaining(&self) -> String {
        let minutes = (self.due_at - Utc::now()).num_minutes();
        format_time_remaining(minutes)
    }

    pub fn is_today(&self) -> bool {
        self.due_at.date_naive() == Utc::now().date_naive()
    }
}

/// Alert for a deadline closing soon, surfaced at the top of the
/// home view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgentAlert {
    pub id: i64,
    pub title: String,
    pub course_name: String,
    pub module_info: String,
    pub due_at: DateTime<Utc>,
    pub url: Option<String>,
    pub kind: ModuleKind,
}

impl UrgentAlert {
    pub fn from_deadline(deadline: &Deadline) -> Self {
        Self {
            id: deadline.id,
            title: deadline.title.clone(),
            course_name: deadline.course_name.clone(),
            module_info: deadline.kind.display_name().to_string(),
            due_at: deadline.due_at,
            url: deadline.url.clone(),
            kind: deadline.kind,
        }
    }

    pub fn time_remaining(&self) -> String {
        let minutes = (self.due_at - Utc::now()).num_minutes();
        format_time_remaining(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_due_in(hours: i64) -> MoodleEvent {
        MoodleEvent {
            id: 1,
            name: "Homework 1 is due".to_string(),
            description: None,
            format: None,
            course_id: Some(42),
            group_id: None,
            user_id: None,
            module_name: Some("assign".to_string()),
            instance: Some(3),
            event_type: Some("due".to_string()),
            time_start: (Utc::now() + Duration::hours(hours)).timestamp(),
            time_duration: None,
            visible: Some(1),
            url: Some("https://lms.example.edu/mod/assign/view.php?id=11".to_string()),
            course: Some(EventCourse {
                id: 42,
                full_name: "Intro to Computer Science".to_string(),
                short_name: "CS101".to_string(),
            }),
        }
    }

    #[test]
    fn test_deadline_urgency_window() {
        assert!(Deadline::from_event(&event_due_in(2)).urgent);
        assert!(!Deadline::from_event(&event_due_in(48)).urgent);
        // Already past: no longer urgent, just overdue
        assert!(!Deadline::from_event(&event_due_in(-2)).urgent);
    }

    #[test]
    fn test_deadline_from_event_fields() {
        let deadline = Deadline::from_event(&event_due_in(2));
        assert_eq!(deadline.course_name, "CS101");
        assert_eq!(deadline.kind, ModuleKind::Assignment);
        assert_eq!(deadline.time_remaining(), "1h");
    }

    #[test]
    fn test_parse_moodle_event() {
        let json = r#"{"id":99,"name":"Quiz 2 closes","description":null,"format":1,"courseid":7,"groupid":null,"userid":5,"modulename":"quiz","instance":12,"eventtype":"close","timestart":1757000000,"timeduration":0,"visible":1,"url":"https://lms.example.edu/mod/quiz/view.php?id=12","course":{"id":7,"fullname":"Calculus I","shortname":"MATH1"}}"#;

        let event: MoodleEvent = serde_json::from_str(json).expect("parse event JSON");
        assert_eq!(event.id, 99);
        assert_eq!(event.module_name.as_deref(), Some("quiz"));

        let deadline = Deadline::from_event(&event);
        assert_eq!(deadline.kind, ModuleKind::Quiz);
        assert_eq!(deadline.course_name, "MATH1");
    }

    #[test]
    fn test_urgent_alert_from_deadline() {
        let deadline = Deadline::from_event(&event_due_in(3));
        let alert = UrgentAlert::from_deadline(&deadline);
        assert_eq!(alert.title, deadline.title);
        assert_eq!(alert.module_info, "Assignment");
    }
}
