//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, poll};
use chrono::{DateTime, Utc};
use lunchlab_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use tracing::debug;

/// Filter, ordering and paging for poll listings.
#[derive(Debug, Clone)]
pub struct PollListQuery {
    /// `"active"` or `"closed"`, judged at `as_of`: a poll past its end date is closed.
    pub status: Option<String>,
    pub created_by: Option<String>,
    /// Only polls whose end date is strictly after this instant.
    pub ends_after: Option<DateTime<Utc>>,
    pub order_by: poll::Column,
    pub descending: bool,
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
    /// Instant the status filter is evaluated at.
    pub as_of: DateTime<Utc>,
}

impl Default for PollListQuery {
    fn default() -> Self {
        Self {
            status: None,
            created_by: None,
            ends_after: None,
            order_by: poll::Column::CreatedAt,
            descending: true,
            page: 1,
            limit: 10,
            as_of: Utc::now(),
        }
    }
}

/// Status predicate that treats polls past their end date as closed.
fn status_condition(status: &str, as_of: DateTime<Utc>) -> Condition {
    let as_of = DateTimeWithTimeZone::from(as_of);
    match status {
        "active" => Condition::all()
            .add(poll::Column::Status.eq("active"))
            .add(poll::Column::EndDate.gt(as_of)),
        "closed" => Condition::any()
            .add(poll::Column::Status.eq("closed"))
            .add(poll::Column::EndDate.lte(as_of)),
        other => Condition::all().add(poll::Column::Status.eq(other)),
    }
}

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {id}")))
    }

    /// List polls matching the query, returning one page and the total count.
    pub async fn find_page(&self, query: &PollListQuery) -> AppResult<(Vec<poll::Model>, u64)> {
        let mut select = Poll::find();

        if let Some(status) = &query.status {
            select = select.filter(status_condition(status, query.as_of));
        }
        if let Some(created_by) = &query.created_by {
            select = select.filter(poll::Column::CreatedBy.eq(created_by.as_str()));
        }
        if let Some(ends_after) = query.ends_after {
            select = select.filter(poll::Column::EndDate.gt(DateTimeWithTimeZone::from(ends_after)));
        }

        select = if query.descending {
            select.order_by_desc(query.order_by)
        } else {
            select.order_by_asc(query.order_by)
        };
        // Stable order for rows sharing the sort key
        select = select.order_by_asc(poll::Column::Id);

        let paginator = select.paginate(self.db.as_ref(), query.limit.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let polls = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((polls, total))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a poll only if the stored row still carries `expected_version`.
    ///
    /// The stored version is incremented on success. Zero affected rows means another
    /// writer got there first and is reported as [`AppError::Conflict`].
    pub async fn update_versioned(
        &self,
        model: poll::Model,
        expected_version: i32,
    ) -> AppResult<poll::Model> {
        let result = Poll::update_many()
            .col_expr(poll::Column::Title, Expr::value(model.title.clone()))
            .col_expr(poll::Column::Status, Expr::value(model.status.clone()))
            .col_expr(poll::Column::EndDate, Expr::value(model.end_date))
            .col_expr(poll::Column::Options, Expr::value(model.options.clone()))
            .col_expr(poll::Column::TotalVotes, Expr::value(model.total_votes))
            .col_expr(poll::Column::MostVoted, Expr::value(model.most_voted.clone()))
            .col_expr(poll::Column::UpdatedAt, Expr::value(model.updated_at))
            .col_expr(
                poll::Column::Version,
                Expr::col(poll::Column::Version).add(1),
            )
            .filter(poll::Column::Id.eq(model.id.as_str()))
            .filter(poll::Column::Version.eq(expected_version))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            debug!(poll_id = %model.id, expected_version, "Versioned poll update matched no row");
            return Err(AppError::Conflict(format!(
                "Poll {} was modified concurrently (expected version {expected_version})",
                model.id
            )));
        }

        Ok(poll::Model {
            version: expected_version + 1,
            ..model
        })
    }

    /// Delete a poll. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Poll::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_poll(id: &str, version: i32) -> poll::Model {
        let now = Utc::now();
        poll::Model {
            id: id.to_string(),
            title: "Friday lunch".to_string(),
            status: "active".to_string(),
            end_date: (now + chrono::Duration::hours(2)).into(),
            options: json!([]),
            created_by: "user1".to_string(),
            total_votes: 0,
            most_voted: None,
            version,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let poll = create_test_poll("poll1", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[poll.clone()]])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.find_by_id("poll1").await.unwrap();

        assert_eq!(result.unwrap().title, "Friday lunch");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<poll::Model>::new()])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_versioned_bumps_version() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let updated = repo
            .update_versioned(create_test_poll("poll1", 4), 4)
            .await
            .unwrap();

        assert_eq!(updated.version, 5);
    }

    #[tokio::test]
    async fn test_update_versioned_stale_snapshot_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        let result = repo.update_versioned(create_test_poll("poll1", 2), 2).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PollRepository::new(db);
        assert!(!repo.delete("poll1").await.unwrap());
    }
}
