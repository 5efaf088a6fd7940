//! Generic access to one REST collection.

use lunchlab_core::Page;
use serde::{Deserialize, de::DeserializeOwned};
use std::marker::PhantomData;
use tracing::debug;

use crate::client::PayloadClient;
use crate::error::{ClientError, ClientResult};
use crate::query::QueryBuilder;

/// `{doc, message?}` envelope of single-document responses.
#[derive(Debug, Deserialize)]
pub struct DocEnvelope<T> {
    pub doc: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Answer to a delete.
#[derive(Debug, Deserialize)]
pub struct DeletedEnvelope {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reads and deletes documents of type `T` under one collection path.
#[derive(Debug, Clone)]
pub struct CollectionRepository<T> {
    client: PayloadClient,
    collection: &'static str,
    _doc: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> CollectionRepository<T> {
    #[must_use]
    pub const fn new(client: PayloadClient, collection: &'static str) -> Self {
        Self {
            client,
            collection,
            _doc: PhantomData,
        }
    }

    #[must_use]
    pub const fn client(&self) -> &PayloadClient {
        &self.client
    }

    /// Path of the collection, or of something below it when `suffix` is not empty.
    #[must_use]
    pub fn path(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.collection.to_string()
        } else {
            format!("{}/{}", self.collection, suffix.trim_start_matches('/'))
        }
    }

    /// One document, `None` when the server does not know the id.
    pub async fn get_by_id(
        &self,
        id: &str,
        query: &QueryBuilder,
        token: Option<&str>,
    ) -> ClientResult<Option<T>> {
        let path = format!("{}{}", self.path(&urlencoding::encode(id)), query.build());
        match self.client.get::<DocEnvelope<T>>(&path, token).await {
            Ok(envelope) => Ok(Some(envelope.doc)),
            Err(ClientError::NotFound(_)) => {
                debug!(collection = self.collection, id = %id, "Document not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// First page with the server's defaults.
    pub async fn get_all(&self, token: Option<&str>) -> ClientResult<Page<T>> {
        self.find(&QueryBuilder::new(), token).await
    }

    pub async fn find(&self, query: &QueryBuilder, token: Option<&str>) -> ClientResult<Page<T>> {
        let path = format!("{}{}", self.collection, query.build());
        self.client.get(&path, token).await
    }

    /// Delete a document. `false` when it did not exist.
    pub async fn delete(&self, id: &str, token: Option<&str>) -> ClientResult<bool> {
        let path = self.path(&urlencoding::encode(id));
        match self.client.delete::<DeletedEnvelope>(&path, token).await {
            Ok(deleted) => {
                debug!(collection = self.collection, id = %deleted.id, "Document deleted");
                Ok(true)
            }
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
