//! User collection.

use lunchlab_core::User;
use serde::Deserialize;

use crate::client::PayloadClient;
use crate::error::ClientResult;

#[derive(Deserialize)]
struct MeEnvelope {
    user: User,
}

/// Typed access to `/users`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    client: PayloadClient,
}

impl UserRepository {
    #[must_use]
    pub const fn new(client: PayloadClient) -> Self {
        Self { client }
    }

    /// The account the token belongs to.
    pub async fn me(&self, token: Option<&str>) -> ClientResult<User> {
        let envelope: MeEnvelope = self.client.get("users/me", token).await?;
        Ok(envelope.user)
    }
}
