//! # Restaurant Repository Contract
//!
//! Implemented by `orders-api`'s Postgres adapter and by
//! [`InMemoryRestaurantRepository`](super::InMemoryRestaurantRepository).
//! Every call is a future; dropping it cancels the operation, which is how
//! a request's deadline reaches the store.

use async_trait::async_trait;

use super::entity::{Restaurant, RestaurantId};
use super::error::RepositoryError;

/// Persistence operations for [`Restaurant`].
///
/// Lookups distinguish "not found" (`Ok(None)`) from failure (`Err`).
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Insert a new restaurant. Returns [`RepositoryError::DuplicateSlug`]
    /// when the store already holds the slug.
    async fn create(&self, restaurant: &Restaurant) -> Result<(), RepositoryError>;

    /// Fetch a restaurant by identity.
    async fn get_by_id(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError>;

    /// Fetch a restaurant by slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, RepositoryError>;

    /// Page through restaurants.
    ///
    /// No ordering is promised beyond what the store produces by default.
    /// Callers needing stable pagination must not rely on this alone.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Restaurant>, RepositoryError>;

    /// Overwrite every field of an existing restaurant.
    async fn update(&self, restaurant: &Restaurant) -> Result<(), RepositoryError>;

    /// Remove a restaurant.
    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError>;
}
