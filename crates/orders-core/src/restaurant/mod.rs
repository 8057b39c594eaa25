//! # Restaurant Aggregate
//!
//! - [`entity`]: the [`Restaurant`] record and its factory.
//! - [`repository`]: the persistence contract.
//! - [`memory`]: a process-local repository for development and tests.
//! - [`error`]: repository error taxonomy.

pub mod entity;
pub mod error;
pub mod memory;
pub mod repository;

pub use entity::{
    Restaurant, RestaurantId, DEFAULT_CLOSING_TIME, DEFAULT_COUNTRY,
    DEFAULT_ESTIMATED_DELIVERY_MINUTES, DEFAULT_OPENING_TIME,
};
pub use error::RepositoryError;
pub use memory::InMemoryRestaurantRepository;
pub use repository::RestaurantRepository;
