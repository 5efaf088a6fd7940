//! User endpoints.

use axum::{Json, Router, routing::get};
use lunchlab_core::User;

use crate::{extractors::AuthUser, middleware::AppState, response::UserResponse};

/// The user the request's token belongs to.
async fn me(AuthUser(user): AuthUser) -> Json<UserResponse<User>> {
    Json(UserResponse { user })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
