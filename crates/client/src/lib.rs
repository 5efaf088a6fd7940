//! Typed HTTP client for the lunchlab REST API.
//!
//! [`PayloadClient`] handles transport, credentials and status mapping; the
//! repositories in [`collections`] turn responses back into core types.

#![allow(missing_docs)]

pub mod client;
pub mod collections;
pub mod config;
pub mod error;
pub mod query;
pub mod repository;
pub mod token;

pub use client::PayloadClient;
pub use collections::{PollsRepository, RestaurantRepository, UserRepository};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use query::QueryBuilder;
pub use repository::CollectionRepository;
pub use token::user_id_from_token;
