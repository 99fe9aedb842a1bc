// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Course section as returned by `core_course_get_contents`.
/// Sections arrive in display order and modules in order within them.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseSection {
    pub id: i64,
    pub name: String,
    pub visible: Option<i32>,
    pub summary: Option<String>,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
}

/// Course module (activity) inside a section.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    pub name: String,
    pub instance: Option<i64>,
    #[serde(rename = "modname")]
    pub mod_name: Option<String>,
    #[serde(rename = "modplural")]
    pub mod_plural: Option<String>,
    pub visible: Option<i32>,
    pub url: Option<String>,
}

/// Activity kind derived from the backend module name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Assignment,
    Quiz,
    Forum,
    Resource,
    Url,
    Other,
}

impl ModuleKind {
    /// Map a Moodle `modname` to an activity kind.
    pub fn from_modname(modname: Option<&str>) -> Self {
        match modname {
            Some("assign") => ModuleKind::Assignment,
            Some("quiz") => ModuleKind::Quiz,
            Some("forum") => ModuleKind::Forum,
            Some("resource") | Some("folder") | Some("page") => ModuleKind::Resource,
            Some("url") => ModuleKind::Url,
            _ => ModuleKind::Other,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleKind::Assignment => "Assignment",
            ModuleKind::Quiz => "Quiz",
            ModuleKind::Forum => "Forum",
            ModuleKind::Resource => "Resource",
            ModuleKind::Url => "Link",
            ModuleKind::Other => "Activity",
        }
    }
}

/// One entry of a course schedule: a module with its section context.
/// Entries preserve the backend's section/module ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub section: String,
    pub title: String,
    pub kind: ModuleKind,
    pub url: Option<String>,
    pub visible: bool,
}

impl ScheduleEntry {
    /// Flatten course contents into ordered schedule entries.
    pub fn from_contents(sections: &[CourseSection]) -> Vec<ScheduleEntry> {
        let mut entries = Vec::new();
        for section in sections {
            for module in &section.modules {
                entries.push(ScheduleEntry {
                    id: module.id,
                    section: section.name.clone(),
                    title: module.name.clone(),
                    kind: ModuleKind::from_modname(module.mod_name.as_deref()),
                    url: module.url.clone(),
                    visible: module.visible.unwrap_or(1) != 0,
                });
            }
        }
        entries
    }
}
