//! # Repository Errors
//!
//! Absence on lookup is `Ok(None)`, never an error. These variants cover
//! the cases where a write cannot be applied or the store itself failed.

use thiserror::Error;

use super::entity::RestaurantId;

/// Failure reported by a [`RestaurantRepository`](super::RestaurantRepository).
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store's uniqueness constraint rejected the slug.
    #[error("slug already in use: {0}")]
    DuplicateSlug(String),

    /// An update or delete targeted a restaurant that does not exist.
    #[error("restaurant not found: {0}")]
    NotFound(RestaurantId),

    /// Connectivity, query, or decoding failure in the backing store.
    #[error("storage failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
