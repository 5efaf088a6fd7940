//! Wire documents for polls.
//!
//! References to restaurants and users travel either as a bare id or as the
//! populated object, depending on the requested depth. [`EntityRef`] accepts
//! both and [`PollDocument::into_poll`] normalizes them back to ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::aggregate::{Poll, PollOption, PollParts, PollStatus, PollVote};
use crate::models::{Restaurant, User};

/// Something with a stable id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A reference that is either a bare id or the populated entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<T> {
    Id(String),
    Populated(T),
}

impl<T: Identified> EntityRef<T> {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated(entity) => entity.id(),
        }
    }

    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) => id,
            Self::Populated(entity) => entity.id().to_string(),
        }
    }

    /// The populated entity, if the reference carries one.
    #[must_use]
    pub const fn populated(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Populated(entity) => Some(entity),
        }
    }
}

impl<T: Clone> EntityRef<T> {
    /// Replace a bare id with its entity when `lookup` knows it.
    fn populate(id: String, lookup: &HashMap<String, T>) -> Self {
        match lookup.get(&id) {
            Some(entity) => Self::Populated(entity.clone()),
            None => Self::Id(id),
        }
    }
}

/// Populated restaurant reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Identified for RestaurantRef {
    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&Restaurant> for RestaurantRef {
    fn from(r: &Restaurant) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            description: r.description.clone(),
            address: r.address.clone(),
        }
    }
}

/// Populated user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub trigram: Option<String>,
}

impl Identified for UserRef {
    fn id(&self) -> &str {
        &self.id
    }
}

impl From<&User> for UserRef {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            email: Some(u.email.clone()),
            first_name: Some(u.first_name.clone()),
            last_name: Some(u.last_name.clone()),
            trigram: Some(u.trigram.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVoteDocument {
    pub id: String,
    pub user: EntityRef<UserRef>,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionDocument {
    pub id: String,
    pub restaurant: EntityRef<RestaurantRef>,
    #[serde(default)]
    pub votes: Vec<PollVoteDocument>,
    /// Older records may lack it; [`PollDocument::into_poll`] then uses the creator.
    #[serde(default)]
    pub added_by: Option<EntityRef<UserRef>>,
}

/// A poll as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDocument {
    pub id: String,
    pub title: String,
    pub status: PollStatus,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub options: Vec<PollOptionDocument>,
    pub created_by: EntityRef<UserRef>,
    #[serde(default)]
    pub total_votes: u32,
    #[serde(default)]
    pub most_voted: Option<EntityRef<RestaurantRef>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i32,
}

impl PollDocument {
    /// Render a poll with every reference as a bare id.
    #[must_use]
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            id: poll.id().to_string(),
            title: poll.title().to_string(),
            status: poll.status(),
            end_date: poll.end_date(),
            options: poll
                .options()
                .iter()
                .map(|o| PollOptionDocument {
                    id: o.id.clone(),
                    restaurant: EntityRef::Id(o.restaurant.clone()),
                    votes: o
                        .votes
                        .iter()
                        .map(|v| PollVoteDocument {
                            id: v.id.clone(),
                            user: EntityRef::Id(v.user.clone()),
                            voted_at: v.voted_at,
                        })
                        .collect(),
                    added_by: Some(EntityRef::Id(o.added_by.clone())),
                })
                .collect(),
            created_by: EntityRef::Id(poll.created_by().to_string()),
            total_votes: poll.total_votes(),
            most_voted: poll.most_voted().map(|r| EntityRef::Id(r.to_string())),
            created_at: poll.created_at(),
            updated_at: poll.updated_at(),
            version: poll.version(),
        }
    }

    /// Swap bare ids for the entities found in the lookups. Unknown ids stay bare.
    #[must_use]
    pub fn populate(
        self,
        restaurants: &HashMap<String, RestaurantRef>,
        users: &HashMap<String, UserRef>,
    ) -> Self {
        let restaurant = |r: EntityRef<RestaurantRef>| EntityRef::populate(r.into_id(), restaurants);
        let user = |u: EntityRef<UserRef>| EntityRef::populate(u.into_id(), users);

        Self {
            options: self
                .options
                .into_iter()
                .map(|o| PollOptionDocument {
                    id: o.id,
                    restaurant: restaurant(o.restaurant),
                    votes: o
                        .votes
                        .into_iter()
                        .map(|v| PollVoteDocument {
                            id: v.id,
                            user: user(v.user),
                            voted_at: v.voted_at,
                        })
                        .collect(),
                    added_by: o.added_by.map(user),
                })
                .collect(),
            created_by: user(self.created_by),
            most_voted: self.most_voted.map(restaurant),
            ..self
        }
    }

    /// Option ids `user_id` voted for.
    #[must_use]
    pub fn voted_options(&self, user_id: &str) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.votes.iter().any(|v| v.user.id() == user_id))
            .map(|o| o.id.as_str())
            .collect()
    }

    /// Normalize every reference to its id and rebuild the aggregate.
    ///
    /// Derived fields are recomputed from the options rather than trusted.
    #[must_use]
    pub fn into_poll(self) -> Poll {
        let created_by = self.created_by.into_id();
        let options = self
            .options
            .into_iter()
            .map(|o| PollOption {
                id: o.id,
                restaurant: o.restaurant.into_id(),
                votes: o
                    .votes
                    .into_iter()
                    .map(|v| PollVote {
                        id: v.id,
                        user: v.user.into_id(),
                        voted_at: v.voted_at,
                    })
                    .collect(),
                added_by: o
                    .added_by
                    .map_or_else(|| created_by.clone(), EntityRef::into_id),
            })
            .collect();

        Poll::from(PollParts {
            id: self.id,
            title: self.title,
            status: self.status,
            end_date: self.end_date,
            options,
            created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}
