//! Restaurant service.

use lunchlab_common::{AppError, AppResult};

use super::store::{MAX_PAGE_SIZE, RestaurantCatalogRef, RestaurantFilter};
use crate::models::Restaurant;
use crate::page::Page;

/// Read-only access to the restaurant catalog.
#[derive(Clone)]
pub struct RestaurantService {
    catalog: RestaurantCatalogRef,
}

impl RestaurantService {
    #[must_use]
    pub const fn new(catalog: RestaurantCatalogRef) -> Self {
        Self { catalog }
    }

    pub async fn get_restaurant(&self, id: &str) -> AppResult<Restaurant> {
        self.catalog
            .fetch_restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restaurant not found: {id}")))
    }

    pub async fn list_restaurants(&self, mut filter: RestaurantFilter) -> AppResult<Page<Restaurant>> {
        filter.page = filter.page.max(1);
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        filter.name_contains = filter
            .name_contains
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        self.catalog.list_restaurants(&filter).await
    }
}
