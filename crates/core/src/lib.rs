//! Core business logic for lunchlab.
//!
//! - [`poll`]: the poll aggregate, a pure state machine over options and votes,
//!   plus its wire documents
//! - [`services`]: orchestration around the aggregate (storage, access rules,
//!   credential resolution, reference population)

pub mod models;
pub mod page;
pub mod poll;
pub mod services;

pub use models::{Restaurant, Role, User};
pub use page::Page;
pub use poll::{Poll, PollError, PollOption, PollStatus, PollVote};
pub use services::{
    Actor, AuthService, DbStore, MemoryStore, PollRenderer, PollService, RestaurantService,
};

/// Generate a unique ID using ULID.
#[must_use]
pub fn generate_id() -> String {
    lunchlab_common::IdGenerator::new().generate()
}
