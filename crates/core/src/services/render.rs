//! Rendering polls as wire documents at a requested depth.

use lunchlab_common::AppResult;
use std::collections::{HashMap, HashSet};

use super::store::{RestaurantCatalogRef, UserDirectoryRef};
use crate::page::Page;
use crate::poll::{Poll, PollDocument, RestaurantRef, UserRef};

/// Resolves restaurant and user references for poll documents.
///
/// Depth 0 leaves every reference as a bare id. Any greater depth populates the
/// references that can be resolved; unknown ids stay bare.
#[derive(Clone)]
pub struct PollRenderer {
    restaurants: RestaurantCatalogRef,
    users: UserDirectoryRef,
}

#[derive(Default)]
struct Lookups {
    restaurants: HashMap<String, RestaurantRef>,
    users: HashMap<String, UserRef>,
}

impl PollRenderer {
    #[must_use]
    pub const fn new(restaurants: RestaurantCatalogRef, users: UserDirectoryRef) -> Self {
        Self { restaurants, users }
    }

    pub async fn render(&self, poll: &Poll, depth: u8) -> AppResult<PollDocument> {
        let lookups = self.lookups(std::slice::from_ref(poll), depth).await?;
        Ok(PollDocument::from_poll(poll).populate(&lookups.restaurants, &lookups.users))
    }

    pub async fn render_page(&self, page: Page<Poll>, depth: u8) -> AppResult<Page<PollDocument>> {
        let lookups = self.lookups(&page.docs, depth).await?;
        Ok(page.map(|poll| {
            PollDocument::from_poll(&poll).populate(&lookups.restaurants, &lookups.users)
        }))
    }

    async fn lookups(&self, polls: &[Poll], depth: u8) -> AppResult<Lookups> {
        if depth == 0 || polls.is_empty() {
            return Ok(Lookups::default());
        }

        let restaurant_ids = distinct(polls.iter().flat_map(Poll::restaurant_ids));
        let user_ids = distinct(polls.iter().flat_map(Poll::user_ids));

        let restaurants = self
            .restaurants
            .fetch_restaurants(&restaurant_ids)
            .await?
            .iter()
            .map(|r| (r.id.clone(), RestaurantRef::from(r)))
            .collect();
        let users = self
            .users
            .fetch_users(&user_ids)
            .await?
            .iter()
            .map(|u| (u.id.clone(), UserRef::from(u)))
            .collect();

        Ok(Lookups { restaurants, users })
    }
}

fn distinct<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).map(ToString::to_string).collect()
}
