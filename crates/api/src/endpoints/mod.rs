//! API endpoints.

mod health;
mod polls;
mod restaurants;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/polls", polls::router())
        .nest("/restaurants", restaurants::router())
        .nest("/users", users::router())
        .nest("/health", health::router())
}
