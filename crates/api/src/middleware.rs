//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use lunchlab_common::config::PollConfig;
use lunchlab_core::{
    AuthService, PollRenderer, PollService, RestaurantService,
    services::{PollStore, RestaurantCatalog, UserDirectory},
};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub poll_service: PollService,
    pub restaurant_service: RestaurantService,
    pub auth_service: AuthService,
    pub renderer: PollRenderer,
}

impl AppState {
    /// Wire every service to one storage backend.
    pub fn new<S>(store: Arc<S>, polls: PollConfig, jwt_secret: &str) -> Self
    where
        S: PollStore + RestaurantCatalog + UserDirectory + 'static,
    {
        Self {
            poll_service: PollService::new(store.clone(), store.clone(), polls),
            restaurant_service: RestaurantService::new(store.clone()),
            auth_service: AuthService::new(store.clone(), jwt_secret),
            renderer: PollRenderer::new(store.clone(), store),
        }
    }
}

/// Token carried by an `Authorization` header value.
///
/// Accepts `Bearer <token>` and the `JWT <token>` form.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("JWT "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware.
///
/// A valid token puts its user into the request extensions. Anything else
/// leaves the request anonymous; protected handlers reject it later.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = bearer_token(auth_str)
    {
        match state.auth_service.authenticate_by_token(token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Authenticated request");
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, path = %req.uri().path(), "Ignoring invalid credentials");
            }
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_prefixes() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("JWT abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
