//! Restaurant repository.

use std::sync::Arc;

use crate::entities::{Restaurant, restaurant};
use lunchlab_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
    sea_query::{Expr, Func},
};

/// Filter, ordering and paging for restaurant listings.
#[derive(Debug, Clone)]
pub struct RestaurantListQuery {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub order_by: restaurant::Column,
    pub descending: bool,
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
}

impl Default for RestaurantListQuery {
    fn default() -> Self {
        Self {
            name_contains: None,
            order_by: restaurant::Column::Name,
            descending: false,
            page: 1,
            limit: 10,
        }
    }
}

/// Restaurant repository for database operations.
#[derive(Clone)]
pub struct RestaurantRepository {
    db: Arc<DatabaseConnection>,
}

impl RestaurantRepository {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a restaurant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all restaurants with the given IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<restaurant::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Restaurant::find()
            .filter(restaurant::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List restaurants matching the query, returning one page and the total count.
    pub async fn find_page(
        &self,
        query: &RestaurantListQuery,
    ) -> AppResult<(Vec<restaurant::Model>, u64)> {
        let mut select = Restaurant::find();

        if let Some(term) = &query.name_contains {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(restaurant::Column::Name))).like(pattern),
            );
        }

        select = if query.descending {
            select.order_by_desc(query.order_by)
        } else {
            select.order_by_asc(query.order_by)
        };
        select = select.order_by_asc(restaurant::Column::Id);

        let paginator = select.paginate(self.db.as_ref(), query.limit.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let restaurants = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((restaurants, total))
    }

    /// Create a new restaurant.
    pub async fn create(&self, model: restaurant::ActiveModel) -> AppResult<restaurant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
