//! Data models for Moodle entities.
//!
//! This module contains all the data structures used to represent
//! course data from the backend:
//!
//! - `Course`: enrolled courses with progress
//! - `ScheduleEntry`, `ModuleKind`: per-course activity schedule
//! - `Deadline`, `UrgentAlert`: calendar deadlines and alerts
//! - `UserProfile`: the logged-in user
//!
//! Wire structs (`Moodle*`, `Site*`, `CourseSection`) mirror the raw
//! JSON; domain structs are the cleaned shapes consumers see.

pub mod course;
pub mod event;
pub mod schedule;
pub mod user;

pub use course::{Course, MoodleCourse, OverviewFile};
pub use event::{Deadline, EventCourse, MoodleEvent, UrgentAlert};
pub use schedule::{CourseModule, CourseSection, ModuleKind, ScheduleEntry};
pub use user::{SiteInfo, SiteUser, UserProfile};
