//! Who may do what to a poll.
//!
//! Reading is open to everyone. Creating, adding options and voting need a
//! logged-in user, which callers express by holding an [`Actor`]. Structural
//! changes that affect other people's votes are reserved for admins and the
//! poll's creator.

use lunchlab_common::{AppError, AppResult};

use crate::models::{Role, User};
use crate::poll::Poll;

/// The identity performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins and the creator manage a poll.
    #[must_use]
    pub fn can_manage(&self, poll: &Poll) -> bool {
        self.is_admin() || poll.created_by() == self.id
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}

/// Fail with `Forbidden` unless `actor` may remove options from, close or delete `poll`.
pub fn ensure_can_manage(actor: &Actor, poll: &Poll, action: &str) -> AppResult<()> {
    if actor.can_manage(poll) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %actor.id,
            poll_id = %poll.id(),
            action,
            "Poll action denied"
        );
        Err(AppError::Forbidden(format!(
            "Only an admin or the poll creator may {action} this poll"
        )))
    }
}
