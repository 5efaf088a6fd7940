//! API response types.

use serde::Serialize;

/// Envelope for a single document.
#[derive(Debug, Serialize)]
pub struct DocResponse<T: Serialize> {
    pub doc: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> DocResponse<T> {
    pub const fn new(doc: T) -> Self {
        Self { doc, message: None }
    }

    pub fn with_message(doc: T, message: impl Into<String>) -> Self {
        Self {
            doc,
            message: Some(message.into()),
        }
    }
}

/// Answer to a successful delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub message: String,
}

/// Envelope for the current user.
#[derive(Debug, Serialize)]
pub struct UserResponse<T: Serialize> {
    pub user: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_omitted_when_absent() {
        let plain = serde_json::to_value(DocResponse::new(1)).unwrap_or_default();
        assert_eq!(plain, serde_json::json!({ "doc": 1 }));

        let created =
            serde_json::to_value(DocResponse::with_message(1, "Created")).unwrap_or_default();
        assert_eq!(created["message"], "Created");
    }
}
