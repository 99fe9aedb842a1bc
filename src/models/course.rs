// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::utils::strip_html;

/// Enrolled course as returned by `core_enrol_get_users_courses`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoodleCourse {
    pub id: i64,
    #[serde(rename = "shortname")]
    pub short_name: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "displayname")]
    pub display_name: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "summaryformat")]
    pub summary_format: Option<i32>,
    #[serde(rename = "startdate")]
    pub start_date: Option<i64>,
    #[serde(rename = "enddate")]
    pub end_date: Option<i64>,
    pub visible: Option<i32>,
    pub progress: Option<f32>,
    #[serde(rename = "hasprogress")]
    pub has_progress: Option<bool>,
    #[serde(rename = "isfavourite")]
    pub is_favourite: Option<bool>,
    pub hidden: Option<bool>,
    #[serde(rename = "overviewfiles")]
    pub overview_files: Option<Vec<OverviewFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewFile {
    pub filename: Option<String>,
    pub filepath: Option<String>,
    #[serde(rename = "fileurl")]
    pub file_url: Option<String>,
    #[serde(rename = "mimetype")]
    pub mime_type: Option<String>,
}

/// Domain course model, decoupled from the API response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub progress: f32,
    pub favourite: bool,
}

impl Course {
    pub fn from_moodle(course: &MoodleCourse) -> Self {
        Self {
            id: course.id,
            // displayname can be missing or blank on older backends
            name: course
                .display_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| course.full_name.clone()),
            short_name: course.short_name.clone(),
            description: course.summary.as_deref().map(strip_html).unwrap_or_default(),
            image_url: course
                .overview_files
                .as_ref()
                .and_then(|files| files.first())
                .and_then(|f| f.file_url.clone()),
            progress: course.progress.unwrap_or(0.0),
            favourite: course.is_favourite.unwrap_or(false),
        }
    }

    pub fn progress_display(&self) -> String {
        format!("{:.0}%", self.progress)
    }
}
