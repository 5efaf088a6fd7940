//! Poll collection.

use chrono::{SecondsFormat, Utc};
use lunchlab_core::{
    Page, Poll, PollStatus,
    poll::PollDocument,
    services::{AddOptionInput, CreatePollInput},
};
use tracing::info;

use crate::client::PayloadClient;
use crate::error::ClientResult;
use crate::query::QueryBuilder;
use crate::repository::{CollectionRepository, DocEnvelope};

/// Depth at which listings and detail views populate restaurants and users.
const DETAIL_DEPTH: u8 = 2;

/// Typed access to `/polls`.
///
/// Results come back as [`Poll`] aggregates; only
/// [`PollsRepository::get_poll_with_details`] keeps the populated document.
#[derive(Debug, Clone)]
pub struct PollsRepository {
    inner: CollectionRepository<PollDocument>,
}

impl PollsRepository {
    #[must_use]
    pub const fn new(client: PayloadClient) -> Self {
        Self {
            inner: CollectionRepository::new(client, "polls"),
        }
    }

    /// Polls still open for votes, newest first.
    pub async fn get_active_polls(&self, token: Option<&str>) -> ClientResult<Page<Poll>> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let query = QueryBuilder::new()
            .where_("status", "equals", PollStatus::Active)
            .where_("endDate", "greater_than", now)
            .depth(DETAIL_DEPTH)
            .sort("createdAt", false);
        self.find(&query, token).await
    }

    pub async fn get_polls_by_status(
        &self,
        status: PollStatus,
        token: Option<&str>,
    ) -> ClientResult<Page<Poll>> {
        let query = QueryBuilder::new()
            .where_("status", "equals", status)
            .depth(DETAIL_DEPTH)
            .sort("createdAt", false);
        self.find(&query, token).await
    }

    /// Polls created by `user_id`.
    pub async fn get_polls_by_user(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> ClientResult<Page<Poll>> {
        let query = QueryBuilder::new()
            .where_("createdBy", "equals", user_id)
            .depth(DETAIL_DEPTH)
            .sort("createdAt", false);
        self.find(&query, token).await
    }

    pub async fn get_poll(&self, poll_id: &str, token: Option<&str>) -> ClientResult<Option<Poll>> {
        let doc = self
            .inner
            .get_by_id(poll_id, &QueryBuilder::new().depth(0), token)
            .await?;
        Ok(doc.map(PollDocument::into_poll))
    }

    /// The poll with restaurants and users populated.
    pub async fn get_poll_with_details(
        &self,
        poll_id: &str,
        token: Option<&str>,
    ) -> ClientResult<Option<PollDocument>> {
        self.inner
            .get_by_id(poll_id, &QueryBuilder::new().depth(DETAIL_DEPTH), token)
            .await
    }

    pub async fn create_poll(&self, input: &CreatePollInput, token: Option<&str>) -> ClientResult<Poll> {
        let envelope: DocEnvelope<PollDocument> = self
            .inner
            .client()
            .post(&self.inner.path(""), input, token)
            .await?;
        let poll = envelope.doc.into_poll();
        info!(poll_id = %poll.id(), "Poll created");
        Ok(poll)
    }

    pub async fn add_option(
        &self,
        poll_id: &str,
        restaurant_id: &str,
        token: Option<&str>,
    ) -> ClientResult<Poll> {
        let input = AddOptionInput {
            restaurant_id: restaurant_id.to_string(),
        };
        let path = self.inner.path(&format!("{}/options", encode(poll_id)));
        let envelope: DocEnvelope<PollDocument> =
            self.inner.client().post(&path, &input, token).await?;
        Ok(envelope.doc.into_poll())
    }

    pub async fn remove_option(
        &self,
        poll_id: &str,
        option_id: &str,
        token: Option<&str>,
    ) -> ClientResult<Poll> {
        let path = self
            .inner
            .path(&format!("{}/options/{}", encode(poll_id), encode(option_id)));
        let envelope: DocEnvelope<PollDocument> = self.inner.client().delete(&path, token).await?;
        Ok(envelope.doc.into_poll())
    }

    /// Vote for `option_id` as the user the token belongs to.
    pub async fn vote_on_poll(
        &self,
        poll_id: &str,
        option_id: &str,
        token: Option<&str>,
    ) -> ClientResult<Poll> {
        let path = self.inner.path(&format!(
            "{}/options/{}/votes",
            encode(poll_id),
            encode(option_id)
        ));
        let envelope: DocEnvelope<PollDocument> =
            self.inner.client().post_empty(&path, token).await?;
        info!(poll_id = %poll_id, option_id = %option_id, "Vote recorded");
        Ok(envelope.doc.into_poll())
    }

    pub async fn close_poll(&self, poll_id: &str, token: Option<&str>) -> ClientResult<Poll> {
        let path = self.inner.path(&format!("{}/close", encode(poll_id)));
        let envelope: DocEnvelope<PollDocument> =
            self.inner.client().post_empty(&path, token).await?;
        Ok(envelope.doc.into_poll())
    }

    /// `false` when the poll did not exist.
    pub async fn delete_poll(&self, poll_id: &str, token: Option<&str>) -> ClientResult<bool> {
        self.inner.delete(poll_id, token).await
    }

    async fn find(&self, query: &QueryBuilder, token: Option<&str>) -> ClientResult<Page<Poll>> {
        let page = self.inner.find(query, token).await?;
        Ok(page.map(PollDocument::into_poll))
    }
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
