//! Read-side restaurant lookups.

use std::sync::Arc;

use crate::restaurant::{RepositoryError, Restaurant, RestaurantRepository};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Lookups over the restaurant repository.
#[derive(Clone)]
pub struct RestaurantQueries {
    repo: Arc<dyn RestaurantRepository>,
}

impl std::fmt::Debug for RestaurantQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestaurantQueries").finish_non_exhaustive()
    }
}

impl RestaurantQueries {
    pub fn new(repo: Arc<dyn RestaurantRepository>) -> Self {
        Self { repo }
    }

    /// Fetch one restaurant by slug. `Ok(None)` when absent.
    pub async fn by_slug(&self, slug: &str) -> Result<Option<Restaurant>, RepositoryError> {
        self.repo.get_by_slug(slug).await
    }

    /// Fetch a page. `limit` is clamped to `1..=MAX_PAGE_SIZE`, `offset` to
    /// non-negative.
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        self.repo.list(limit, offset).await
    }
}
