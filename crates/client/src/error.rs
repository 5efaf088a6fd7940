//! Client error types.

use thiserror::Error;

/// Longest slice of a response body kept in log lines.
pub(crate) const LOGGED_BODY_LIMIT: usize = 1000;

/// Error returned by every client call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request failed with status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode response as {type_name}: {source}")]
    Deserialization {
        type_name: &'static str,
        content: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// HTTP status behind the error, when there is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::Conflict(_) => Some(409),
            Self::BadRequest(_) => Some(400),
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Cut `body` to at most [`LOGGED_BODY_LIMIT`] characters.
pub(crate) fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(LOGGED_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ClientError::Conflict("x".into()).status(), Some(409));
        assert_eq!(
            ClientError::Status {
                code: 502,
                body: String::new()
            }
            .status(),
            Some(502)
        );
        assert_eq!(ClientError::InvalidUrl("x".into()).status(), None);
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(LOGGED_BODY_LIMIT + 10);
        assert_eq!(truncate_body(&long).chars().count(), LOGGED_BODY_LIMIT);
        assert_eq!(truncate_body("short"), "short");
    }
}
