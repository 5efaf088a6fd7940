//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod auth;
pub mod db_store;
pub mod memory_store;
pub mod poll;
pub mod render;
pub mod restaurant;
pub mod store;

pub use access::{Actor, ensure_can_manage};
pub use auth::{AuthService, TokenClaims};
pub use db_store::DbStore;
pub use memory_store::MemoryStore;
pub use poll::{AddOptionInput, CreatePollInput, PollService};
pub use render::PollRenderer;
pub use restaurant::RestaurantService;
pub use store::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PollFilter, PollSort, PollSortField, PollStore,
    PollStoreRef, RestaurantCatalog, RestaurantCatalogRef, RestaurantFilter, RestaurantSort,
    RestaurantSortField, UserDirectory, UserDirectoryRef,
};
