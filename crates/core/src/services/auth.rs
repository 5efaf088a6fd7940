//! Credential resolution.
//!
//! Tokens are issued elsewhere; this service only verifies them and maps the
//! `id` claim to a known user.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use lunchlab_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use super::store::UserDirectoryRef;
use crate::models::User;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// Verifies HS256 access tokens and loads the user they name.
#[derive(Clone)]
pub struct AuthService {
    users: UserDirectoryRef,
    key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    #[must_use]
    pub fn new(users: UserDirectoryRef, jwt_secret: &str) -> Self {
        Self {
            users,
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Check signature and expiry.
    pub fn verify_token(&self, token: &str) -> AppResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized
            })
    }

    /// Resolve a token to the user it was issued for.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<User> {
        let claims = self.verify_token(token)?;
        self.users.fetch_user(&claims.id).await?.ok_or_else(|| {
            tracing::debug!(user_id = %claims.id, "Token names an unknown user");
            AppError::Unauthorized
        })
    }
}
