//! `PostgreSQL` storage backend.

use async_trait::async_trait;
use chrono::Utc;
use lunchlab_common::{AppError, AppResult};
use lunchlab_db::{
    entities::{poll, restaurant, user},
    repositories::{
        PollListQuery, PollRepository, RestaurantListQuery, RestaurantRepository, UserRepository,
    },
};
use sea_orm::{DatabaseConnection, Set};
use std::sync::Arc;

use super::store::{
    PollFilter, PollSortField, PollStore, RestaurantCatalog, RestaurantFilter,
    RestaurantSortField, UserDirectory,
};
use crate::models::{Restaurant, User};
use crate::page::Page;
use crate::poll::{Poll, PollParts, PollStatus};

/// Storage backed by the sea-orm repositories.
#[derive(Clone)]
pub struct DbStore {
    poll_repo: PollRepository,
    restaurant_repo: RestaurantRepository,
    user_repo: UserRepository,
}

impl DbStore {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            poll_repo: PollRepository::new(Arc::clone(&db)),
            restaurant_repo: RestaurantRepository::new(Arc::clone(&db)),
            user_repo: UserRepository::new(db),
        }
    }
}

fn poll_from_model(model: poll::Model) -> AppResult<Poll> {
    let options = serde_json::from_value(model.options)
        .map_err(|e| AppError::Database(format!("Corrupt options in poll {}: {e}", model.id)))?;
    let status = model
        .status
        .parse::<PollStatus>()
        .map_err(|e| AppError::Database(format!("Corrupt status in poll {}: {e}", model.id)))?;

    Ok(Poll::from(PollParts {
        id: model.id,
        title: model.title,
        status,
        end_date: model.end_date.with_timezone(&Utc),
        options,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        version: model.version,
    }))
}

fn poll_to_model(poll: &Poll) -> AppResult<poll::Model> {
    let options = serde_json::to_value(poll.options())
        .map_err(|e| AppError::Internal(format!("Failed to encode poll options: {e}")))?;

    Ok(poll::Model {
        id: poll.id().to_string(),
        title: poll.title().to_string(),
        status: poll.status().as_str().to_string(),
        end_date: poll.end_date().into(),
        options,
        created_by: poll.created_by().to_string(),
        total_votes: i32::try_from(poll.total_votes()).unwrap_or(i32::MAX),
        most_voted: poll.most_voted().map(ToString::to_string),
        version: poll.version(),
        created_at: poll.created_at().into(),
        updated_at: poll.updated_at().into(),
    })
}

fn restaurant_from_model(model: restaurant::Model) -> Restaurant {
    Restaurant {
        id: model.id,
        name: model.name,
        description: model.description,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn user_from_model(model: user::Model) -> AppResult<User> {
    let role = model
        .role
        .parse()
        .map_err(|e| AppError::Database(format!("Corrupt role for user {}: {e}", model.id)))?;

    Ok(User {
        id: model.id,
        email: model.email,
        role,
        first_name: model.first_name,
        last_name: model.last_name,
        trigram: model.trigram,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

const fn poll_column(field: PollSortField) -> poll::Column {
    match field {
        PollSortField::CreatedAt => poll::Column::CreatedAt,
        PollSortField::UpdatedAt => poll::Column::UpdatedAt,
        PollSortField::EndDate => poll::Column::EndDate,
        PollSortField::Title => poll::Column::Title,
    }
}

#[async_trait]
impl PollStore for DbStore {
    async fn fetch_poll(&self, id: &str) -> AppResult<Poll> {
        poll_from_model(self.poll_repo.get_by_id(id).await?)
    }

    async fn insert_poll(&self, poll: Poll) -> AppResult<Poll> {
        let model = poll_to_model(&poll)?;
        let created = self
            .poll_repo
            .create(poll::ActiveModel {
                id: Set(model.id),
                title: Set(model.title),
                status: Set(model.status),
                end_date: Set(model.end_date),
                options: Set(model.options),
                created_by: Set(model.created_by),
                total_votes: Set(model.total_votes),
                most_voted: Set(model.most_voted),
                version: Set(0),
                created_at: Set(model.created_at),
                updated_at: Set(model.updated_at),
            })
            .await?;
        poll_from_model(created)
    }

    async fn save_poll(&self, poll: Poll) -> AppResult<Poll> {
        let expected_version = poll.version();
        let model = poll::Model {
            updated_at: Utc::now().into(),
            ..poll_to_model(&poll)?
        };
        poll_from_model(self.poll_repo.update_versioned(model, expected_version).await?)
    }

    async fn list_polls(&self, filter: &PollFilter) -> AppResult<Page<Poll>> {
        let query = PollListQuery {
            status: filter.status.map(|s| s.as_str().to_string()),
            created_by: filter.created_by.clone(),
            ends_after: filter.ends_after,
            as_of: filter.as_of,
            order_by: poll_column(filter.sort.field),
            descending: filter.sort.descending,
            page: filter.page.max(1),
            limit: filter.limit.max(1),
        };

        let (models, total) = self.poll_repo.find_page(&query).await?;
        let polls = models
            .into_iter()
            .map(poll_from_model)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(polls, total, query.page, query.limit))
    }

    async fn delete_poll(&self, id: &str) -> AppResult<()> {
        if self.poll_repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Poll not found: {id}")))
        }
    }
}

#[async_trait]
impl RestaurantCatalog for DbStore {
    async fn fetch_restaurant(&self, id: &str) -> AppResult<Option<Restaurant>> {
        Ok(self
            .restaurant_repo
            .find_by_id(id)
            .await?
            .map(restaurant_from_model))
    }

    async fn fetch_restaurants(&self, ids: &[String]) -> AppResult<Vec<Restaurant>> {
        Ok(self
            .restaurant_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(restaurant_from_model)
            .collect())
    }

    async fn list_restaurants(&self, filter: &RestaurantFilter) -> AppResult<Page<Restaurant>> {
        let query = RestaurantListQuery {
            name_contains: filter.name_contains.clone(),
            order_by: match filter.sort.field {
                RestaurantSortField::Name => restaurant::Column::Name,
                RestaurantSortField::CreatedAt => restaurant::Column::CreatedAt,
            },
            descending: filter.sort.descending,
            page: filter.page.max(1),
            limit: filter.limit.max(1),
        };

        let (models, total) = self.restaurant_repo.find_page(&query).await?;
        let restaurants = models.into_iter().map(restaurant_from_model).collect();
        Ok(Page::new(restaurants, total, query.page, query.limit))
    }
}

#[async_trait]
impl UserDirectory for DbStore {
    async fn fetch_user(&self, id: &str) -> AppResult<Option<User>> {
        self.user_repo
            .find_by_id(id)
            .await?
            .map(user_from_model)
            .transpose()
    }

    async fn fetch_users(&self, ids: &[String]) -> AppResult<Vec<User>> {
        self.user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(user_from_model)
            .collect()
    }
}
