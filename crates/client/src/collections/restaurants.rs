//! Restaurant collection.

use lunchlab_core::{Page, Restaurant};

use crate::client::PayloadClient;
use crate::error::ClientResult;
use crate::query::QueryBuilder;
use crate::repository::CollectionRepository;

/// Typed access to `/restaurants`.
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    inner: CollectionRepository<Restaurant>,
}

impl RestaurantRepository {
    #[must_use]
    pub const fn new(client: PayloadClient) -> Self {
        Self {
            inner: CollectionRepository::new(client, "restaurants"),
        }
    }

    pub async fn get_restaurant(
        &self,
        id: &str,
        token: Option<&str>,
    ) -> ClientResult<Option<Restaurant>> {
        self.inner.get_by_id(id, &QueryBuilder::new(), token).await
    }

    /// Restaurants whose name contains `name`.
    pub async fn get_by_name(&self, name: &str, token: Option<&str>) -> ClientResult<Page<Restaurant>> {
        let query = QueryBuilder::new()
            .where_("name", "contains", name)
            .depth(1);
        self.inner.find(&query, token).await
    }

    /// One page of name matches, sorted by name.
    pub async fn search_restaurants(
        &self,
        term: &str,
        page: u64,
        limit: u64,
        token: Option<&str>,
    ) -> ClientResult<Page<Restaurant>> {
        let query = QueryBuilder::new()
            .where_("name", "contains", term)
            .page(page)
            .limit(limit)
            .sort("name", true);
        self.inner.find(&query, token).await
    }

    pub async fn get_all_sorted(&self, token: Option<&str>) -> ClientResult<Page<Restaurant>> {
        let query = QueryBuilder::new().sort("name", true);
        self.inner.find(&query, token).await
    }
}
