//! API client for communicating with a Moodle Web Services backend.
//!
//! This module provides the `MoodleClient` struct for making token-
//! authenticated REST calls to fetch course, schedule, and calendar
//! data.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::models::{CourseSection, MoodleCourse, MoodleEvent, SiteInfo, SiteUser};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Web service name registered for the mobile token endpoint.
/// Stock Moodle ships this service enabled for mobile clients.
const MOBILE_SERVICE: &str = "moodle_mobile_app";

/// Response format requested from server.php.
const REST_FORMAT: &str = "json";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    #[serde(rename = "privatetoken")]
    private_token: Option<String>,
    error: Option<String>,
    errorcode: Option<String>,
}

/// In-band failure body. Moodle replies HTTP 200 with this shape for
/// most web service errors.
#[derive(Debug, Deserialize)]
struct WsErrorBody {
    exception: Option<String>,
    errorcode: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarEventsResponse {
    #[serde(default)]
    events: Vec<MoodleEvent>,
}

/// API client for a Moodle backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
///
/// The client is stateless with respect to the session: the token is a
/// parameter on every authenticated call, mirroring the wire contract
/// where every server.php request carries `wstoken`.
#[derive(Clone)]
pub struct MoodleClient {
    client: Client,
    base_url: String,
}

impl MoodleClient {
    /// Create a new API client for the given site base URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a web service token.
    ///
    /// Bad credentials do not produce an HTTP error: the endpoint
    /// replies 200 with `{error, errorcode}` and no token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}/login/token.php", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", username),
                ("password", password),
                ("service", MOBILE_SERVICE),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("token response: {}", e)))?;

        match parsed.token {
            Some(token) => Ok(token),
            None => {
                let message = parsed
                    .error
                    .unwrap_or_else(|| "Invalid username or password".to_string());
                match parsed.errorcode.as_deref() {
                    Some("invalidlogin") | None => Err(ApiError::Authentication(message)),
                    Some(code) => Err(ApiError::from_ws_error(code, &message)),
                }
            }
        }
    }

    /// Fetch site info and the logged-in user's identity.
    pub async fn fetch_site_info(&self, token: &str) -> Result<SiteInfo, ApiError> {
        self.ws_get(token, "core_webservice_get_site_info", &[]).await
    }

    /// Fetch enrolled courses for a user.
    pub async fn fetch_user_courses(
        &self,
        token: &str,
        user_id: i64,
    ) -> Result<Vec<MoodleCourse>, ApiError> {
        self.ws_get(
            token,
            "core_enrol_get_users_courses",
            &[("userid", user_id.to_string())],
        )
        .await
    }

    /// Fetch course contents: ordered sections with ordered modules.
    pub async fn fetch_course_contents(
        &self,
        token: &str,
        course_id: i64,
    ) -> Result<Vec<CourseSection>, ApiError> {
        self.ws_get(
            token,
            "core_course_get_contents",
            &[("courseid", course_id.to_string())],
        )
        .await
    }

    /// Fetch action events (deadlines) in a time window, soonest first.
    pub async fn fetch_calendar_events(
        &self,
        token: &str,
        from: i64,
        to: i64,
        limit: u32,
    ) -> Result<Vec<MoodleEvent>, ApiError> {
        let response: CalendarEventsResponse = self
            .ws_get(
                token,
                "core_calendar_get_action_events_by_timesort",
                &[
                    ("timesortfrom", from.to_string()),
                    ("timesortto", to.to_string()),
                    ("limitnum", limit.to_string()),
                ],
            )
            .await?;
        Ok(response.events)
    }

    /// Fetch a single user profile by id.
    pub async fn fetch_user_profile(&self, token: &str, user_id: i64) -> Result<SiteUser, ApiError> {
        let users: Vec<SiteUser> = self
            .ws_get(
                token,
                "core_user_get_users_by_field",
                &[
                    ("field", "id".to_string()),
                    ("values[0]", user_id.to_string()),
                ],
            )
            .await?;

        users
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("user {}", user_id)))
    }

    /// Issue a GET against server.php for the given ws function.
    ///
    /// The body is checked for an in-band error object before
    /// deserializing the payload, since failures usually arrive with
    /// HTTP 200.
    async fn ws_get<T: DeserializeOwned>(
        &self,
        token: &str,
        function: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/webservice/rest/server.php", self.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("wstoken", token.to_string()),
            ("wsfunction", function.to_string()),
            ("moodlewsrestformat", REST_FORMAT.to_string()),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let response = self.client.get(&url).query(&query).send().await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;

        if let Some(err) = Self::ws_error(&text) {
            debug!(function, error = %err, "Web service call failed");
            return Err(err);
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", function, e)))
    }

    /// Detect an in-band error body. Array payloads never parse as an
    /// error object, and success objects carry no errorcode.
    fn ws_error(text: &str) -> Option<ApiError> {
        let parsed: WsErrorBody = serde_json::from_str(text).ok()?;
        let code = parsed.errorcode?;
        if parsed.exception.is_none() && parsed.message.is_none() && parsed.error.is_none() {
            return None;
        }
        let message = parsed.message.or(parsed.error).unwrap_or_default();
        Some(ApiError::from_ws_error(&code, &message))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_error_detects_error_body() {
        let body = r#"{"exception":"moodle_exception","errorcode":"invalidtoken","message":"Invalid token - token expired"}"#;
        let err = MoodleClient::ws_error(body).expect("should detect error body");
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn test_ws_error_ignores_success_object() {
        // Site info is an object but carries no errorcode
        let body = r#"{"userid":5,"username":"jdoe","firstname":"Jane","lastname":"Doe","fullname":"Jane Doe","sitename":"Example"}"#;
        assert!(MoodleClient::ws_error(body).is_none());
    }

    #[test]
    fn test_ws_error_ignores_array_payload() {
        let body = r#"[{"id":42,"shortname":"CS101","fullname":"Intro"}]"#;
        assert!(MoodleClient::ws_error(body).is_none());
    }

    #[test]
    fn test_parse_token_error_response() {
        let body = r#"{"error":"Invalid login, please try again","errorcode":"invalidlogin","stacktrace":null,"debuginfo":null}"#;
        let parsed: TokenResponse = serde_json::from_str(body).expect("parse token error");
        assert!(parsed.token.is_none());
        assert_eq!(parsed.errorcode.as_deref(), Some("invalidlogin"));
    }

    #[test]
    fn test_parse_token_success_response() {
        let body = r#"{"token":"d41d8cd98f00b204e9800998ecf8427e","privatetoken":"abcdef"}"#;
        let parsed: TokenResponse = serde_json::from_str(body).expect("parse token response");
        assert_eq!(parsed.token.as_deref(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = MoodleClient::new("https://lms.example.edu/").expect("build client");
        assert_eq!(client.base_url(), "https://lms.example.edu");
    }
}
