//! Poll endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use lunchlab_common::{AppError, AppResult};
use lunchlab_core::{
    Page, PollStatus,
    poll::PollDocument,
    services::{AddOptionInput, CreatePollInput, DEFAULT_PAGE_SIZE, PollFilter, PollSort},
};
use serde::Deserialize;

use crate::{
    extractors::{ApiJson, ApiQuery, AuthUser},
    middleware::AppState,
    response::{DeletedResponse, DocResponse},
};

/// Depth used by reads when the caller does not ask for one.
const DEFAULT_READ_DEPTH: u8 = 1;

/// Query parameters for listing polls.
#[derive(Debug, Default, Deserialize)]
pub struct ListPollsParams {
    #[serde(rename = "where[status][equals]")]
    pub status: Option<String>,
    #[serde(rename = "where[createdBy][equals]")]
    pub created_by: Option<String>,
    #[serde(rename = "where[endDate][greater_than]")]
    pub ends_after: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub depth: Option<u8>,
}

impl ListPollsParams {
    fn to_filter(&self) -> AppResult<PollFilter> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<PollStatus>)
            .transpose()?;
        let ends_after = self
            .ends_after
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| AppError::Validation(format!("endDate: {e}")))
            })
            .transpose()?;
        let sort = self
            .sort
            .as_deref()
            .map(str::parse::<PollSort>)
            .transpose()?
            .unwrap_or_default();

        Ok(PollFilter {
            status,
            created_by: self.created_by.clone(),
            ends_after,
            sort,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            ..PollFilter::default()
        })
    }
}

/// Rendering depth for a single document.
#[derive(Debug, Default, Deserialize)]
pub struct DepthParams {
    pub depth: Option<u8>,
}

/// List polls.
async fn list_polls(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListPollsParams>,
) -> AppResult<Json<Page<PollDocument>>> {
    let filter = params.to_filter()?;
    let page = state.poll_service.list_polls(filter).await?;
    let depth = params.depth.unwrap_or(DEFAULT_READ_DEPTH);
    Ok(Json(state.renderer.render_page(page, depth).await?))
}

/// Get a poll.
async fn show_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<DepthParams>,
) -> AppResult<Json<DocResponse<PollDocument>>> {
    let poll = state.poll_service.get_poll(&id).await?;
    let depth = params.depth.unwrap_or(DEFAULT_READ_DEPTH);
    Ok(Json(DocResponse::new(state.renderer.render(&poll, depth).await?)))
}

/// Create a poll.
async fn create_poll(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DepthParams>,
    ApiJson(input): ApiJson<CreatePollInput>,
) -> AppResult<(StatusCode, Json<DocResponse<PollDocument>>)> {
    let poll = state.poll_service.create_poll(&user.actor(), input).await?;
    let doc = state
        .renderer
        .render(&poll, params.depth.unwrap_or(0))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DocResponse::with_message(doc, "Poll successfully created.")),
    ))
}

/// Offer another restaurant.
async fn add_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<DepthParams>,
    ApiJson(input): ApiJson<AddOptionInput>,
) -> AppResult<Json<DocResponse<PollDocument>>> {
    let poll = state
        .poll_service
        .add_option(&user.actor(), &id, input)
        .await?;
    let doc = state
        .renderer
        .render(&poll, params.depth.unwrap_or(0))
        .await?;
    Ok(Json(DocResponse::new(doc)))
}

/// Remove an option and its votes.
async fn remove_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, option_id)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<DepthParams>,
) -> AppResult<Json<DocResponse<PollDocument>>> {
    let poll = state
        .poll_service
        .remove_option(&user.actor(), &id, &option_id)
        .await?;
    let doc = state
        .renderer
        .render(&poll, params.depth.unwrap_or(0))
        .await?;
    Ok(Json(DocResponse::new(doc)))
}

/// Vote for an option as the authenticated user.
async fn vote(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, option_id)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<DepthParams>,
) -> AppResult<Json<DocResponse<PollDocument>>> {
    let poll = state
        .poll_service
        .vote(&user.actor(), &id, &option_id)
        .await?;
    let doc = state
        .renderer
        .render(&poll, params.depth.unwrap_or(0))
        .await?;
    Ok(Json(DocResponse::new(doc)))
}

/// Close a poll.
async fn close_poll(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<DepthParams>,
) -> AppResult<Json<DocResponse<PollDocument>>> {
    let poll = state.poll_service.close_poll(&user.actor(), &id).await?;
    let doc = state
        .renderer
        .render(&poll, params.depth.unwrap_or(0))
        .await?;
    Ok(Json(DocResponse::new(doc)))
}

/// Delete a poll.
async fn delete_poll(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletedResponse>> {
    state.poll_service.delete_poll(&user.actor(), &id).await?;
    Ok(Json(DeletedResponse {
        id,
        message: "Poll successfully deleted.".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_polls).post(create_poll))
        .route("/{id}", get(show_poll).delete(delete_poll))
        .route("/{id}/options", post(add_option))
        .route("/{id}/options/{option_id}", delete(remove_option))
        .route("/{id}/options/{option_id}/votes", post(vote))
        .route("/{id}/close", post(close_poll))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunchlab_core::services::PollSortField;

    #[test]
    fn test_list_params_to_filter() {
        let params = ListPollsParams {
            status: Some("closed".to_string()),
            ends_after: Some("2025-03-14T12:00:00Z".to_string()),
            sort: Some("-endDate".to_string()),
            page: Some(2),
            ..ListPollsParams::default()
        };

        let filter = params.to_filter().unwrap_or_default();
        assert_eq!(filter.status, Some(PollStatus::Closed));
        assert!(filter.ends_after.is_some());
        assert_eq!(filter.sort.field, PollSortField::EndDate);
        assert!(filter.sort.descending);
        assert_eq!(filter.page, 2);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_list_params_reject_unknown_values() {
        let bad_status = ListPollsParams {
            status: Some("open".to_string()),
            ..ListPollsParams::default()
        };
        assert!(matches!(bad_status.to_filter(), Err(AppError::Validation(_))));

        let bad_date = ListPollsParams {
            ends_after: Some("tomorrow".to_string()),
            ..ListPollsParams::default()
        };
        assert!(matches!(bad_date.to_filter(), Err(AppError::Validation(_))));
    }
}
