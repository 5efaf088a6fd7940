//! Database entities.

#![allow(missing_docs)]

pub mod poll;
pub mod restaurant;
pub mod user;

pub use poll::Entity as Poll;
pub use restaurant::Entity as Restaurant;
pub use user::Entity as User;
