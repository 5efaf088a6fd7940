//! Poll state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

use super::error::PollError;
use crate::generate_id;

/// Lifecycle state of a poll. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// Open for votes until the end date.
    #[default]
    Active,
    /// No longer accepts votes or option changes.
    Closed,
}

impl PollStatus {
    /// Wire and storage spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollStatus {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(PollError::validation(
                "status",
                format!("expected \"active\" or \"closed\", got \"{other}\""),
            )),
        }
    }
}

/// One user's vote for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    /// Vote identifier.
    pub id: String,
    /// ID of the voting user.
    pub user: String,
    /// When the vote was recorded.
    pub voted_at: DateTime<Utc>,
}

/// A restaurant offered in a poll, with the votes it received in vote order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    /// Option identifier, unique within the poll.
    pub id: String,
    /// ID of the offered restaurant.
    pub restaurant: String,
    /// Votes in the order they were cast.
    #[serde(default)]
    pub votes: Vec<PollVote>,
    /// ID of the user who added the option.
    pub added_by: String,
}

impl PollOption {
    fn new(restaurant: &str, added_by: &str) -> Self {
        Self {
            id: generate_id(),
            restaurant: restaurant.to_string(),
            votes: Vec::new(),
            added_by: added_by.to_string(),
        }
    }

    /// Number of votes the option received.
    #[must_use]
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Whether `user_id` already voted for this option.
    #[must_use]
    pub fn has_vote_from(&self, user_id: &str) -> bool {
        self.votes.iter().any(|v| v.user == user_id)
    }
}

/// Input for [`Poll::create`].
#[derive(Debug, Clone)]
pub struct NewPoll {
    /// Display title.
    pub title: String,
    /// Instant the poll stops accepting votes.
    pub end_date: DateTime<Utc>,
    /// Restaurants to offer, one option each.
    pub restaurant_ids: Vec<String>,
    /// ID of the creating user.
    pub created_by: String,
}

/// Stored state of a poll without its derived fields.
///
/// Converting into a [`Poll`] recomputes `totalVotes` and `mostVoted`, so values
/// read back from storage or the wire are always consistent with the options.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollParts {
    /// Poll identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Stored status, before lazy expiry.
    pub status: PollStatus,
    /// Instant the poll stops accepting votes.
    pub end_date: DateTime<Utc>,
    /// Options in display order.
    pub options: Vec<PollOption>,
    /// ID of the creating user.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last saved change.
    pub updated_at: DateTime<Utc>,
    /// Storage revision, zero when absent.
    #[serde(default)]
    pub version: i32,
}

impl From<PollParts> for Poll {
    fn from(parts: PollParts) -> Self {
        Self {
            id: parts.id,
            title: parts.title,
            status: parts.status,
            end_date: parts.end_date,
            options: parts.options,
            created_by: parts.created_by,
            total_votes: 0,
            most_voted: None,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            version: parts.version,
        }
        .recompute_aggregates()
    }
}

/// A time-bounded vote among restaurant options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PollParts")]
pub struct Poll {
    id: String,
    title: String,
    status: PollStatus,
    end_date: DateTime<Utc>,
    options: Vec<PollOption>,
    created_by: String,
    total_votes: u32,
    most_voted: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i32,
}

impl Poll {
    /// Start a poll with one option per restaurant, in the given order.
    pub fn create(input: NewPoll, now: DateTime<Utc>) -> Result<Self, PollError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(PollError::validation("title", "must not be empty"));
        }
        if input.restaurant_ids.is_empty() {
            return Err(PollError::validation(
                "restaurantIds",
                "at least one restaurant is required",
            ));
        }

        let mut seen = HashSet::new();
        for restaurant in &input.restaurant_ids {
            if !seen.insert(restaurant.as_str()) {
                return Err(PollError::validation(
                    "restaurantIds",
                    format!("restaurant {restaurant} appears more than once"),
                ));
            }
        }

        let options = input
            .restaurant_ids
            .iter()
            .map(|r| PollOption::new(r, &input.created_by))
            .collect();

        Ok(Self {
            id: generate_id(),
            title: title.to_string(),
            status: PollStatus::Active,
            end_date: input.end_date,
            options,
            created_by: input.created_by,
            total_votes: 0,
            most_voted: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
        .recompute_aggregates())
    }

    /// Append an option for a restaurant not yet offered.
    pub fn add_option(
        &self,
        restaurant_id: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, PollError> {
        let mut poll = self.clone().evaluate_expiry(now);
        poll.ensure_active()?;

        if restaurant_id.trim().is_empty() {
            return Err(PollError::validation("restaurantId", "must not be empty"));
        }
        if poll.options.iter().any(|o| o.restaurant == restaurant_id) {
            return Err(PollError::validation(
                "restaurantId",
                format!("restaurant {restaurant_id} is already an option"),
            ));
        }

        poll.options.push(PollOption::new(restaurant_id, added_by));
        Ok(poll.recompute_aggregates())
    }

    /// Remove an option together with its votes.
    pub fn remove_option(&self, option_id: &str, now: DateTime<Utc>) -> Result<Self, PollError> {
        let mut poll = self.clone().evaluate_expiry(now);
        poll.ensure_active()?;

        let index = poll
            .options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or_else(|| PollError::not_found("option", option_id))?;
        if poll.options.len() == 1 {
            return Err(PollError::validation(
                "options",
                "a poll must keep at least one option",
            ));
        }

        poll.options.remove(index);
        Ok(poll.recompute_aggregates())
    }

    /// Record `voter`'s vote for an option.
    ///
    /// A second vote by the same user on the same option is rejected, leaving the
    /// vote list untouched. Votes on other options of the same poll are allowed.
    pub fn vote(
        &self,
        option_id: &str,
        voter: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, PollError> {
        if !self.is_accepting_votes(now) {
            return Err(PollError::Closed {
                poll_id: self.id.clone(),
            });
        }

        let mut poll = self.clone();
        let option = poll
            .options
            .iter_mut()
            .find(|o| o.id == option_id)
            .ok_or_else(|| PollError::not_found("option", option_id))?;
        if option.has_vote_from(voter) {
            return Err(PollError::AlreadyVoted {
                option_id: option_id.to_string(),
                user_id: voter.to_string(),
            });
        }

        option.votes.push(PollVote {
            id: generate_id(),
            user: voter.to_string(),
            voted_at: now,
        });
        Ok(poll.recompute_aggregates())
    }

    /// Close the poll. Closing a closed poll is a no-op.
    #[must_use]
    pub fn close(&self) -> Self {
        Self {
            status: PollStatus::Closed,
            ..self.clone()
        }
    }

    /// Close an active poll whose end date has passed.
    #[must_use]
    pub fn evaluate_expiry(mut self, now: DateTime<Utc>) -> Self {
        if self.status == PollStatus::Active && now >= self.end_date {
            self.status = PollStatus::Closed;
        }
        self
    }

    /// Recompute `totalVotes` and `mostVoted` from the options.
    ///
    /// Ties go to the first option, in option order, that reaches the maximum.
    #[must_use]
    pub fn recompute_aggregates(mut self) -> Self {
        let total: usize = self.options.iter().map(PollOption::vote_count).sum();
        let max = self
            .options
            .iter()
            .map(PollOption::vote_count)
            .max()
            .unwrap_or(0);

        self.total_votes = u32::try_from(total).unwrap_or(u32::MAX);
        self.most_voted = if max == 0 {
            None
        } else {
            self.options
                .iter()
                .find(|o| o.vote_count() == max)
                .map(|o| o.restaurant.clone())
        };
        self
    }

    /// Status as of `now`, counting an elapsed end date as closed.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> PollStatus {
        if self.is_accepting_votes(now) {
            PollStatus::Active
        } else {
            PollStatus::Closed
        }
    }

    /// Whether a vote cast at `now` would be accepted.
    #[must_use]
    pub fn is_accepting_votes(&self, now: DateTime<Utc>) -> bool {
        self.status == PollStatus::Active && now < self.end_date
    }

    /// IDs of the options `user_id` has voted for.
    #[must_use]
    pub fn voted_options(&self, user_id: &str) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.has_vote_from(user_id))
            .map(|o| o.id.as_str())
            .collect()
    }

    /// The option with `option_id`, if any.
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Restaurants referenced by the options, in option order.
    #[must_use]
    pub fn restaurant_ids(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.restaurant.as_str()).collect()
    }

    /// Distinct users referenced anywhere in the poll, creator first.
    #[must_use]
    pub fn user_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        std::iter::once(self.created_by.as_str())
            .chain(self.options.iter().flat_map(|o| {
                std::iter::once(o.added_by.as_str()).chain(o.votes.iter().map(|v| v.user.as_str()))
            }))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    fn ensure_active(&self) -> Result<(), PollError> {
        if self.status == PollStatus::Active {
            Ok(())
        } else {
            Err(PollError::Closed {
                poll_id: self.id.clone(),
            })
        }
    }

    /// Stamp the storage revision after a successful write.
    pub(crate) fn with_revision(mut self, version: i32, updated_at: DateTime<Utc>) -> Self {
        self.version = version;
        self.updated_at = updated_at;
        self
    }

    /// Poll identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Status as held, without evaluating expiry.
    #[must_use]
    pub const fn status(&self) -> PollStatus {
        self.status
    }

    /// Instant the poll stops accepting votes.
    #[must_use]
    pub const fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Options in display order.
    #[must_use]
    pub fn options(&self) -> &[PollOption] {
        &self.options
    }

    /// ID of the creating user.
    #[must_use]
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Votes across all options.
    #[must_use]
    pub const fn total_votes(&self) -> u32 {
        self.total_votes
    }

    /// Restaurant of the leading option, `None` before the first vote.
    #[must_use]
    pub fn most_voted(&self) -> Option<&str> {
        self.most_voted.as_deref()
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last saved change.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Storage revision used for check-and-set writes.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }
}
