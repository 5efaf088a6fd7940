//! Restaurant endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use lunchlab_common::AppResult;
use lunchlab_core::{
    Page, Restaurant,
    services::{DEFAULT_PAGE_SIZE, RestaurantFilter, RestaurantSort},
};
use serde::Deserialize;

use crate::{extractors::ApiQuery, middleware::AppState, response::DocResponse};

/// Query parameters for listing restaurants.
#[derive(Debug, Default, Deserialize)]
pub struct ListRestaurantsParams {
    #[serde(rename = "where[name][contains]")]
    pub name_contains: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListRestaurantsParams {
    fn into_filter(self) -> AppResult<RestaurantFilter> {
        let sort = match self.sort.as_deref() {
            Some(s) => s.parse::<RestaurantSort>()?,
            None => RestaurantSort::default(),
        };
        Ok(RestaurantFilter {
            name_contains: self.name_contains,
            sort,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

async fn list_restaurants(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListRestaurantsParams>,
) -> AppResult<Json<Page<Restaurant>>> {
    let filter = params.into_filter()?;
    Ok(Json(state.restaurant_service.list_restaurants(filter).await?))
}

async fn show_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DocResponse<Restaurant>>> {
    let restaurant = state.restaurant_service.get_restaurant(&id).await?;
    Ok(Json(DocResponse::new(restaurant)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants))
        .route("/{id}", get(show_restaurant))
}
