//! HTTP API layer for lunchlab.
//!
//! - **Endpoints**: polls, restaurants, the current user and a health check,
//!   answering with `{doc}` / paged `{docs, ...}` envelopes
//! - **Extractors**: authentication and error-mapped query/body parsing
//! - **Middleware**: bearer token resolution
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// The API mounted under `/api`, with credential resolution applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
