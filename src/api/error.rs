use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid credentials: {0}")]
    Authentication(String),

    #[error("Not authenticated - login required")]
    Unauthenticated,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthenticated,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Map a Moodle in-band error. The backend replies HTTP 200 with a
    /// JSON `{exception, errorcode, message}` object for most failures,
    /// so the errorcode carries the real classification.
    pub fn from_ws_error(errorcode: &str, message: &str) -> Self {
        let truncated = Self::truncate_body(message);
        match errorcode {
            "invalidtoken" => ApiError::Unauthenticated,
            "invalidlogin" => ApiError::Authentication(truncated),
            "accessexception" | "nopermissions" => ApiError::AccessDenied(truncated),
            "invalidrecord" | "invalidcourseid" => ApiError::NotFound(truncated),
            _ => ApiError::InvalidResponse(format!("{}: {}", errorcode, truncated)),
        }
    }
}
