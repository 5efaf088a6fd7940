//! Typed repositories, one per collection.

pub mod polls;
pub mod restaurants;
pub mod users;

pub use polls::PollsRepository;
pub use restaurants::RestaurantRepository;
pub use users::UserRepository;
