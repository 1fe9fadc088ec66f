//! Store error types

use thiserror::Error;

/// Store-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials were rejected (HTTP 401 or token exchange failure)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials could not be loaded or parsed
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Resource is not editable in its current state (HTTP 409 STATE_ERROR)
    #[error("State conflict: {body}")]
    StateConflict { body: String },

    /// Resource not found (HTTP 404 or empty lookup)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response, with the raw body preserved
    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },

    /// Caller supplied unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl StoreError {
    /// Maps a failed response to an error.
    ///
    /// 401 is handled by the clients, which add credential context.
    pub fn from_response(status: u16, body: String) -> Self {
        match status {
            409 if body.contains("STATE_ERROR") => StoreError::StateConflict { body },
            404 => StoreError::NotFound(body),
            _ => StoreError::ApiError { status, body },
        }
    }

    /// Whether the store refused the change because of the resource state.
    pub fn is_state_conflict(&self) -> bool {
        matches!(self, StoreError::StateConflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response() {
        let body = r#"{"errors":[{"code":"STATE_ERROR","status":"409"}]}"#.to_string();
        assert!(StoreError::from_response(409, body).is_state_conflict());

        let other_conflict = StoreError::from_response(409, "ENTITY_ERROR".to_string());
        assert!(matches!(
            other_conflict,
            StoreError::ApiError { status: 409, .. }
        ));

        assert!(StoreError::from_response(404, String::new()).is_not_found());

        match StoreError::from_response(500, "boom".to_string()) {
            StoreError::ApiError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
