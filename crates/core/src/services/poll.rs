//! Poll service.
//!
//! Every command is one read-modify-write cycle: fetch the stored poll, apply
//! lazy expiry, check access, run the aggregate operation, then save with a
//! version check. A lost race re-runs the cycle on a fresh snapshot.

use chrono::{DateTime, Utc};
use lunchlab_common::{AppError, AppResult, config::PollConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use validator::Validate;

use super::access::{Actor, ensure_can_manage};
use super::store::{MAX_PAGE_SIZE, PollFilter, PollStoreRef, RestaurantCatalogRef};
use crate::page::Page;
use crate::poll::{NewPoll, Poll, PollError, PollStatus};

/// Input for creating a poll.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    #[validate(length(min = 1))]
    pub title: String,
    pub end_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub restaurant_ids: Vec<String>,
}

/// Input for adding an option.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddOptionInput {
    #[validate(length(min = 1))]
    pub restaurant_id: String,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    store: PollStoreRef,
    restaurants: RestaurantCatalogRef,
    config: PollConfig,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        store: PollStoreRef,
        restaurants: RestaurantCatalogRef,
        config: PollConfig,
    ) -> Self {
        Self {
            store,
            restaurants,
            config,
        }
    }

    /// Create a poll owned by `actor`.
    pub async fn create_poll(&self, actor: &Actor, input: CreatePollInput) -> AppResult<Poll> {
        input.validate()?;

        let title_len = input.title.trim().chars().count();
        if title_len > self.config.max_title_length {
            return Err(AppError::Validation(format!(
                "title: must be at most {} characters",
                self.config.max_title_length
            )));
        }
        if input.restaurant_ids.len() > self.config.max_options {
            return Err(AppError::Validation(format!(
                "restaurantIds: a poll may offer at most {} restaurants",
                self.config.max_options
            )));
        }

        let poll = Poll::create(
            NewPoll {
                title: input.title,
                end_date: input.end_date,
                restaurant_ids: input.restaurant_ids,
                created_by: actor.id.clone(),
            },
            Utc::now(),
        )?;
        self.ensure_restaurants_exist(poll.restaurant_ids()).await?;

        let poll = self.store.insert_poll(poll).await?;
        info!(
            poll_id = %poll.id(),
            user_id = %actor.id,
            options = poll.options().len(),
            "Poll created"
        );
        Ok(poll)
    }

    /// Get a poll as of now.
    ///
    /// A poll found past its end date is returned closed, and the closure is
    /// written back when no other writer got there first.
    pub async fn get_poll(&self, poll_id: &str) -> AppResult<Poll> {
        let stored = self.store.fetch_poll(poll_id).await?;
        let stored_status = stored.status();
        let poll = stored.evaluate_expiry(Utc::now());

        if poll.status() == stored_status {
            return Ok(poll);
        }

        match self.store.save_poll(poll.clone()).await {
            Ok(saved) => {
                info!(poll_id, "Closed expired poll");
                Ok(saved)
            }
            Err(AppError::Conflict(_)) => {
                debug!(poll_id, "Expired poll changed concurrently, skipping write-back");
                Ok(poll)
            }
            Err(e) => {
                warn!(poll_id, error = %e, "Failed to persist expired poll");
                Ok(poll)
            }
        }
    }

    /// List polls.
    ///
    /// Status filters and the returned polls both see expiry as of now; the
    /// closures are not written back.
    pub async fn list_polls(&self, mut filter: PollFilter) -> AppResult<Page<Poll>> {
        filter.page = filter.page.max(1);
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);

        let now = Utc::now();
        filter.as_of = now;
        let page = self.store.list_polls(&filter).await?;
        Ok(page.map(|p| p.evaluate_expiry(now)))
    }

    /// Offer another restaurant in a poll.
    pub async fn add_option(
        &self,
        actor: &Actor,
        poll_id: &str,
        input: AddOptionInput,
    ) -> AppResult<Poll> {
        input.validate()?;
        self.ensure_restaurants_exist(vec![input.restaurant_id.as_str()])
            .await?;

        let max_options = self.config.max_options;
        let poll = self
            .modify(poll_id, "add_option", |poll, now| {
                let updated = poll.add_option(&input.restaurant_id, &actor.id, now)?;
                if updated.options().len() > max_options {
                    return Err(AppError::Validation(format!(
                        "options: a poll may offer at most {max_options} restaurants"
                    )));
                }
                Ok(updated)
            })
            .await?;

        info!(
            poll_id,
            restaurant_id = %input.restaurant_id,
            user_id = %actor.id,
            "Poll option added"
        );
        Ok(poll)
    }

    /// Remove an option and its votes.
    pub async fn remove_option(
        &self,
        actor: &Actor,
        poll_id: &str,
        option_id: &str,
    ) -> AppResult<Poll> {
        let poll = self
            .modify(poll_id, "remove_option", |poll, now| {
                ensure_can_manage(actor, poll, "remove options from")?;
                Ok(poll.remove_option(option_id, now)?)
            })
            .await?;

        info!(poll_id, option_id, user_id = %actor.id, "Poll option removed");
        Ok(poll)
    }

    /// Vote for an option as `actor`.
    pub async fn vote(&self, actor: &Actor, poll_id: &str, option_id: &str) -> AppResult<Poll> {
        let poll = self
            .modify(poll_id, "vote", |poll, now| {
                Ok(poll.vote(option_id, &actor.id, now)?)
            })
            .await?;

        info!(
            poll_id,
            option_id,
            user_id = %actor.id,
            total_votes = poll.total_votes(),
            "Vote recorded"
        );
        Ok(poll)
    }

    /// Close a poll ahead of its end date.
    ///
    /// Closing a closed or expired poll succeeds and returns it without a write.
    pub async fn close_poll(&self, actor: &Actor, poll_id: &str) -> AppResult<Poll> {
        let current = self.store.fetch_poll(poll_id).await?.evaluate_expiry(Utc::now());
        ensure_can_manage(actor, &current, "close")?;
        if current.status() == PollStatus::Closed {
            debug!(poll_id, "Poll already closed");
            return Ok(current);
        }

        let poll = self
            .modify(poll_id, "close", |poll, _| {
                ensure_can_manage(actor, poll, "close")?;
                Ok(poll.close())
            })
            .await?;

        info!(poll_id, user_id = %actor.id, "Poll closed");
        Ok(poll)
    }

    /// Delete a poll.
    pub async fn delete_poll(&self, actor: &Actor, poll_id: &str) -> AppResult<()> {
        let poll = self.store.fetch_poll(poll_id).await?;
        ensure_can_manage(actor, &poll, "delete")?;
        self.store.delete_poll(poll_id).await?;

        info!(poll_id, user_id = %actor.id, "Poll deleted");
        Ok(())
    }

    async fn ensure_restaurants_exist(&self, ids: Vec<&str>) -> AppResult<()> {
        let wanted: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let found = self.restaurants.fetch_restaurants(&wanted).await?;
        let known: HashSet<&str> = found.iter().map(|r| r.id.as_str()).collect();

        match ids.into_iter().find(|id| !known.contains(id)) {
            Some(missing) => Err(PollError::NotFound {
                entity: "restaurant",
                id: missing.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Apply `op` to the current snapshot and save it, retrying on version conflicts.
    async fn modify<F>(&self, poll_id: &str, action: &'static str, op: F) -> AppResult<Poll>
    where
        F: Fn(&Poll, DateTime<Utc>) -> AppResult<Poll> + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let now = Utc::now();
            let snapshot = self.store.fetch_poll(poll_id).await?.evaluate_expiry(now);
            let updated = op(&snapshot, now)?;

            match self.store.save_poll(updated).await {
                Ok(saved) => {
                    debug!(poll_id, action, version = saved.version(), "Poll saved");
                    return Ok(saved);
                }
                Err(AppError::Conflict(reason)) if attempt < self.config.save_retries => {
                    attempt += 1;
                    warn!(poll_id, action, attempt, %reason, "Version conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
