//! Database repositories.

#![allow(missing_docs)]

pub mod poll;
pub mod restaurant;
pub mod user;

pub use poll::{PollListQuery, PollRepository};
pub use restaurant::{RestaurantListQuery, RestaurantRepository};
pub use user::UserRepository;
