//! # Use Cases
//!
//! - [`create_restaurant`]: slug-uniqueness check, factory construction,
//!   field merge, persistence.
//! - [`queries`]: read-side lookups and pagination.

pub mod create_restaurant;
pub mod queries;

pub use create_restaurant::{CreateRestaurant, CreateRestaurantError, CreateRestaurantInput};
pub use queries::{RestaurantQueries, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
