//! Storage collaborators.
//!
//! Services depend on these traits rather than on a concrete backend, so the
//! same poll logic runs on `PostgreSQL` ([`super::DbStore`]) or in memory
//! ([`super::MemoryStore`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lunchlab_common::AppResult;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{Restaurant, User};
use crate::page::Page;
use crate::poll::{Poll, PollError, PollStatus};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size a caller may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Field a poll listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    EndDate,
    Title,
}

/// Ordering of a poll listing, written `field` or `-field` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSort {
    pub field: PollSortField,
    pub descending: bool,
}

impl Default for PollSort {
    fn default() -> Self {
        Self {
            field: PollSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for PollSort {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = s.strip_prefix('-').map_or((false, s), |rest| (true, rest));
        let field = match name {
            "createdAt" => PollSortField::CreatedAt,
            "updatedAt" => PollSortField::UpdatedAt,
            "endDate" => PollSortField::EndDate,
            "title" => PollSortField::Title,
            other => {
                return Err(PollError::Validation {
                    field: "sort",
                    reason: format!("cannot sort polls by \"{other}\""),
                });
            }
        };
        Ok(Self { field, descending })
    }
}

/// Filter and paging for poll listings.
#[derive(Debug, Clone)]
pub struct PollFilter {
    /// Matched against the status as of `as_of`, so expired polls count as closed.
    pub status: Option<PollStatus>,
    pub created_by: Option<String>,
    /// Only polls ending strictly after this instant.
    pub ends_after: Option<DateTime<Utc>>,
    pub sort: PollSort,
    /// 1-based.
    pub page: u64,
    pub limit: u64,
    /// Instant lazy expiry is evaluated at.
    pub as_of: DateTime<Utc>,
}

impl Default for PollFilter {
    fn default() -> Self {
        Self {
            status: None,
            created_by: None,
            ends_after: None,
            sort: PollSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            as_of: Utc::now(),
        }
    }
}

impl PollFilter {
    /// Polls that still accept votes at `now`.
    #[must_use]
    pub fn active_at(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(PollStatus::Active),
            ends_after: Some(now),
            as_of: now,
            ..Self::default()
        }
    }
}

/// Field a restaurant listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestaurantSortField {
    #[default]
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestaurantSort {
    pub field: RestaurantSortField,
    pub descending: bool,
}

impl FromStr for RestaurantSort {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = s.strip_prefix('-').map_or((false, s), |rest| (true, rest));
        let field = match name {
            "name" => RestaurantSortField::Name,
            "createdAt" => RestaurantSortField::CreatedAt,
            other => {
                return Err(PollError::Validation {
                    field: "sort",
                    reason: format!("cannot sort restaurants by \"{other}\""),
                });
            }
        };
        Ok(Self { field, descending })
    }
}

/// Filter and paging for restaurant listings.
#[derive(Debug, Clone)]
pub struct RestaurantFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub sort: RestaurantSort,
    pub page: u64,
    pub limit: u64,
}

impl Default for RestaurantFilter {
    fn default() -> Self {
        Self {
            name_contains: None,
            sort: RestaurantSort::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Persistence for poll aggregates.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Load a poll; `NotFound` if it does not exist.
    async fn fetch_poll(&self, id: &str) -> AppResult<Poll>;

    /// Store a new poll at version 0.
    async fn insert_poll(&self, poll: Poll) -> AppResult<Poll>;

    /// Check-and-set write.
    ///
    /// Succeeds only if the stored version still equals `poll.version()`; the
    /// returned poll carries the incremented version. A stale snapshot yields
    /// `AppError::Conflict`.
    async fn save_poll(&self, poll: Poll) -> AppResult<Poll>;

    async fn list_polls(&self, filter: &PollFilter) -> AppResult<Page<Poll>>;

    /// Remove a poll; `NotFound` if it does not exist.
    async fn delete_poll(&self, id: &str) -> AppResult<()>;
}

/// Read access to restaurants.
#[async_trait]
pub trait RestaurantCatalog: Send + Sync {
    async fn fetch_restaurant(&self, id: &str) -> AppResult<Option<Restaurant>>;

    /// Restaurants among `ids` that exist, in no particular order.
    async fn fetch_restaurants(&self, ids: &[String]) -> AppResult<Vec<Restaurant>>;

    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Page<Restaurant>>;
}

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_user(&self, id: &str) -> AppResult<Option<User>>;

    /// Users among `ids` that exist, in no particular order.
    async fn fetch_users(&self, ids: &[String]) -> AppResult<Vec<User>>;
}

pub type PollStoreRef = Arc<dyn PollStore>;
pub type RestaurantCatalogRef = Arc<dyn RestaurantCatalog>;
pub type UserDirectoryRef = Arc<dyn UserDirectory>;
