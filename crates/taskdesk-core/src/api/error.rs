use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

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
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of a `{"detail": ...}` body.
    ///
    /// `detail` is either a string or, for request validation failures,
    /// a list of `{"msg": ...}` objects.
    fn extract_detail(body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        match value.get("detail")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            _ => None,
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_detail(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Server-supplied explanation, when there is one worth showing a user
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(m)
            | ApiError::AccessDenied(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m) => Some(m.as_str()).filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// True when the server rejected the credential itself
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Find an `ApiError` in an `anyhow` error chain
pub fn find_api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
}

/// Message to show a user for a failed call: the server's explanation when
/// it gave one, a connectivity hint for network failures, else `fallback`.
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    match find_api_error(err) {
        Some(api_err) => match api_err.detail() {
            Some(detail) => detail.to_string(),
            None if matches!(api_err, ApiError::NetworkError(e) if e.is_timeout()) => {
                "Connection timed out. Please try again.".to_string()
            }
            None if matches!(api_err, ApiError::NetworkError(_)) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            None => fallback.to_string(),
        },
        None => fallback.to_string(),
    }
}
