use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - please sign in again")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    /// The backend answered 200 but reported a failure in its envelope.
    #[error("{0}")]
    Backend(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error shapes the services emit: the backend's `{"error": ...}` envelope
/// and the auth service's `{"message": ...}`.
#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

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

    /// Prefer the service's own error message over the raw body.
    fn describe(body: &str) -> String {
        if let Ok(wire) = serde_json::from_str::<WireError>(body) {
            if let Some(msg) = wire.error.or(wire.message).filter(|m| !m.is_empty()) {
                return msg;
            }
        }
        Self::truncate_body(body)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let described = Self::describe(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(described),
            404 => ApiError::NotFound(described),
            500..=599 => ApiError::ServerError(described),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, described)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_to_variants() {
        let unauthorized = ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(matches!(unauthorized, ApiError::Unauthorized));

        let not_found = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "no such event");
        assert!(matches!(not_found, ApiError::NotFound(msg) if msg == "no such event"));

        let server = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "boom");
        assert!(matches!(server, ApiError::ServerError(_)));
    }

    #[test]
    fn extracts_service_error_messages() {
        let backend = ApiError::from_status(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"status": "Error", "error": "event with ID 9 not found"}"#,
        );
        assert!(matches!(backend, ApiError::NotFound(msg) if msg == "event with ID 9 not found"));

        let auth = ApiError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message": "token generation failed"}"#,
        );
        assert!(matches!(auth, ApiError::ServerError(msg) if msg == "token generation failed"));
    }

    #[test]
    fn truncates_oversized_bodies() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::ServerError(msg) => {
                assert!(msg.len() < body.len());
                assert!(msg.contains("truncated"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
