//! Poll aggregate errors.

use lunchlab_common::AppError;
use thiserror::Error;

/// Rule violations reported by the poll aggregate.
///
/// All variants are terminal: retrying the same operation on the same snapshot
/// fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("poll {poll_id} is closed")]
    Closed { poll_id: String },

    #[error("user {user_id} has already voted for option {option_id}")]
    AlreadyVoted { option_id: String, user_id: String },
}

impl PollError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        let message = err.to_string();
        match err {
            PollError::Validation { .. } => Self::Validation(message),
            PollError::NotFound { .. } => Self::NotFound(message),
            PollError::Closed { .. } => Self::PollClosed(message),
            PollError::AlreadyVoted { .. } => Self::AlreadyVoted(message),
        }
    }
}
