// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Response of `core_webservice_get_site_info`: the logged-in user
/// plus site metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfo {
    #[serde(rename = "userid")]
    pub user_id: i64,
    pub username: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "sitename")]
    pub site_name: Option<String>,
    #[serde(rename = "userpictureurl")]
    pub avatar_url: Option<String>,
    pub lang: Option<String>,
}

/// A user record from `core_user_get_users_by_field`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteUser {
    pub id: i64,
    pub username: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub email: Option<String>,
    #[serde(rename = "profileimageurl")]
    pub profile_image_url: Option<String>,
}

/// Domain user profile, decoupled from the API response structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    pub fn from_site_info(info: &SiteInfo) -> Self {
        Self {
            id: info.user_id,
            username: info.username.clone(),
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            full_name: info.full_name.clone(),
            avatar_url: info.avatar_url.clone(),
        }
    }

    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next().map(|c| c.to_uppercase().to_string());
        let last = self.last_name.chars().next().map(|c| c.to_uppercase().to_string());
        format!("{}{}", first.unwrap_or_default(), last.unwrap_or_default())
    }

    /// "Jane D." style short form for narrow displays.
    pub fn short_name(&self) -> String {
        match self.last_name.chars().next() {
            Some(initial) => format!("{} {}.", self.first_name, initial),
            None => self.first_name.clone(),
        }
    }
}
