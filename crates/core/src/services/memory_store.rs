//! In-memory storage backend.
//!
//! Used by tests and by servers started without a database. Data lives only as
//! long as the process.

use async_trait::async_trait;
use chrono::Utc;
use lunchlab_common::{AppError, AppResult};
use std::{cmp::Ordering, collections::HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{
    PollFilter, PollSortField, PollStore, RestaurantCatalog, RestaurantFilter,
    RestaurantSortField, UserDirectory,
};
use crate::models::{Restaurant, User};
use crate::page::Page;
use crate::poll::Poll;

/// Polls, restaurants and users held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    polls: RwLock<HashMap<String, Poll>>,
    restaurants: RwLock<HashMap<String, Restaurant>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a restaurant.
    pub async fn add_restaurant(&self, restaurant: Restaurant) {
        self.restaurants
            .write()
            .await
            .insert(restaurant.id.clone(), restaurant);
    }

    /// Add or replace a user.
    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

fn paginate<T>(items: Vec<T>, page: u64, limit: u64) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
    let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
    let take = usize::try_from(limit).unwrap_or(usize::MAX);

    let docs = items.into_iter().skip(skip).take(take).collect();
    Page::new(docs, total, page, limit)
}

fn compare_polls(a: &Poll, b: &Poll, field: PollSortField) -> Ordering {
    match field {
        PollSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        PollSortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        PollSortField::EndDate => a.end_date().cmp(&b.end_date()),
        PollSortField::Title => a.title().cmp(b.title()),
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn fetch_poll(&self, id: &str) -> AppResult<Poll> {
        self.polls
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {id}")))
    }

    async fn insert_poll(&self, poll: Poll) -> AppResult<Poll> {
        let mut polls = self.polls.write().await;
        if polls.contains_key(poll.id()) {
            return Err(AppError::Conflict(format!("Poll {} already exists", poll.id())));
        }

        let updated_at = poll.updated_at();
        let poll = poll.with_revision(0, updated_at);
        polls.insert(poll.id().to_string(), poll.clone());
        Ok(poll)
    }

    async fn save_poll(&self, poll: Poll) -> AppResult<Poll> {
        let mut polls = self.polls.write().await;
        let stored = polls
            .get(poll.id())
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {}", poll.id())))?;

        if stored.version() != poll.version() {
            debug!(
                poll_id = %poll.id(),
                expected_version = poll.version(),
                stored_version = stored.version(),
                "Stale poll snapshot"
            );
            return Err(AppError::Conflict(format!(
                "Poll {} was modified concurrently (expected version {})",
                poll.id(),
                poll.version()
            )));
        }

        let next = poll.version() + 1;
        let saved = poll.with_revision(next, Utc::now());
        polls.insert(saved.id().to_string(), saved.clone());
        Ok(saved)
    }

    async fn list_polls(&self, filter: &PollFilter) -> AppResult<Page<Poll>> {
        let mut matching: Vec<Poll> = self
            .polls
            .read()
            .await
            .values()
            .filter(|p| filter.status.is_none_or(|s| p.status_at(filter.as_of) == s))
            .filter(|p| {
                filter
                    .created_by
                    .as_deref()
                    .is_none_or(|c| p.created_by() == c)
            })
            .filter(|p| filter.ends_after.is_none_or(|t| p.end_date() > t))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare_polls(a, b, filter.sort.field);
            let ord = if filter.sort.descending { ord.reverse() } else { ord };
            ord.then_with(|| a.id().cmp(b.id()))
        });

        Ok(paginate(matching, filter.page, filter.limit))
    }

    async fn delete_poll(&self, id: &str) -> AppResult<()> {
        self.polls
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {id}")))
    }
}

#[async_trait]
impl RestaurantCatalog for MemoryStore {
    async fn fetch_restaurant(&self, id: &str) -> AppResult<Option<Restaurant>> {
        Ok(self.restaurants.read().await.get(id).cloned())
    }

    async fn fetch_restaurants(&self, ids: &[String]) -> AppResult<Vec<Restaurant>> {
        let restaurants = self.restaurants.read().await;
        Ok(ids.iter().filter_map(|id| restaurants.get(id).cloned()).collect())
    }

    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Page<Restaurant>> {
        let term = filter.name_contains.as_deref().map(str::to_lowercase);
        let mut matching: Vec<Restaurant> = self
            .restaurants
            .read()
            .await
            .values()
            .filter(|r| {
                term.as_deref()
                    .is_none_or(|t| r.name.to_lowercase().contains(t))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = match filter.sort.field {
                RestaurantSortField::Name => a.name.cmp(&b.name),
                RestaurantSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            let ord = if filter.sort.descending { ord.reverse() } else { ord };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        Ok(paginate(matching, filter.page, filter.limit))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn fetch_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn fetch_users(&self, ids: &[String]) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::poll::{NewPoll, PollStatus};
    use crate::services::store::PollSort;
    use chrono::Duration;

    fn new_poll(title: &str, created_by: &str, ends_in: Duration) -> Poll {
        Poll::create(
            NewPoll {
                title: title.to_string(),
                end_date: Utc::now() + ends_in,
                restaurant_ids: vec!["r1".to_string()],
                created_by: created_by.to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_requires_current_version() {
        let store = MemoryStore::new();
        let poll = store
            .insert_poll(new_poll("Lunch", "u1", Duration::hours(1)))
            .await
            .unwrap();
        let option = poll.options()[0].id.clone();

        let first = poll.vote(&option, "u1", Utc::now()).unwrap();
        let stale = poll.vote(&option, "u2", Utc::now()).unwrap();

        let saved = store.save_poll(first).await.unwrap();
        assert_eq!(saved.version(), 1);

        let err = store.save_poll(stale).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.fetch_poll(poll.id()).await.unwrap();
        assert_eq!(stored.total_votes(), 1);
        assert_eq!(stored.voted_options("u1"), vec![option.as_str()]);
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        for (title, owner, hours) in [("b", "u1", 1), ("a", "u1", 2), ("c", "u2", -1)] {
            store
                .insert_poll(new_poll(title, owner, Duration::hours(hours)))
                .await
                .unwrap();
        }

        let by_title = PollFilter {
            sort: PollSort {
                field: PollSortField::Title,
                descending: false,
            },
            limit: 2,
            ..PollFilter::default()
        };
        let page = store.list_polls(&by_title).await.unwrap();
        assert_eq!(page.total_docs, 3);
        assert_eq!(page.total_pages, 2);
        let titles: Vec<_> = page.docs.iter().map(Poll::title).collect();
        assert_eq!(titles, vec!["a", "b"]);

        let open = store.list_polls(&PollFilter::active_at(Utc::now())).await.unwrap();
        assert_eq!(open.total_docs, 2);

        let mine = PollFilter {
            created_by: Some("u2".to_string()),
            ..PollFilter::default()
        };
        let page = store.list_polls(&mine).await.unwrap();
        assert_eq!(page.docs.len(), 1);
        assert_eq!(page.docs[0].title(), "c");
    }

    #[tokio::test]
    async fn test_status_filter_is_evaluated_at_as_of() {
        let store = MemoryStore::new();
        store
            .insert_poll(new_poll("late", "u1", Duration::minutes(30)))
            .await
            .unwrap();
        let at = |status, offset: Duration| PollFilter {
            status: Some(status),
            as_of: Utc::now() + offset,
            ..PollFilter::default()
        };

        let now = Duration::zero();
        assert_eq!(store.list_polls(&at(PollStatus::Active, now)).await.unwrap().total_docs, 1);
        assert_eq!(store.list_polls(&at(PollStatus::Closed, now)).await.unwrap().total_docs, 0);

        let later = Duration::hours(1);
        assert_eq!(store.list_polls(&at(PollStatus::Active, later)).await.unwrap().total_docs, 0);
        assert_eq!(store.list_polls(&at(PollStatus::Closed, later)).await.unwrap().total_docs, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_poll() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete_poll("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
