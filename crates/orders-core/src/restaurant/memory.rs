//! # In-Memory Restaurant Repository
//!
//! Thread-safe, cloneable store used when no database is configured and in
//! tests. All operations are synchronous under a `parking_lot::RwLock` and
//! never hold the lock across an `.await`. `parking_lot` locks do not
//! poison, so a panicking writer cannot wedge the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::entity::{Restaurant, RestaurantId};
use super::error::RepositoryError;
use super::repository::RestaurantRepository;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<RestaurantId, Restaurant>,
    by_slug: HashMap<String, RestaurantId>,
}

/// Process-local [`RestaurantRepository`].
///
/// The slug index is checked and written under the same write lock as the
/// row, so concurrent inserts of one slug cannot both succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRestaurantRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRestaurantRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored restaurants.
    pub fn len(&self) -> usize {
        self.tables.read().rows.len()
    }

    /// Whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RestaurantRepository for InMemoryRestaurantRepository {
    async fn create(&self, restaurant: &Restaurant) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        if tables.by_slug.contains_key(&restaurant.slug) {
            return Err(RepositoryError::DuplicateSlug(restaurant.slug.clone()));
        }
        tables
            .by_slug
            .insert(restaurant.slug.clone(), restaurant.id);
        tables.rows.insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        Ok(self.tables.read().rows.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, RepositoryError> {
        let tables = self.tables.read();
        Ok(tables
            .by_slug
            .get(slug)
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Restaurant>, RepositoryError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let mut rows: Vec<Restaurant> = self.tables.read().rows.values().cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, restaurant: &Restaurant) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let previous_slug = match tables.rows.get(&restaurant.id) {
            Some(existing) => existing.slug.clone(),
            None => return Err(RepositoryError::NotFound(restaurant.id)),
        };
        if previous_slug != restaurant.slug {
            if tables.by_slug.contains_key(&restaurant.slug) {
                return Err(RepositoryError::DuplicateSlug(restaurant.slug.clone()));
            }
            tables.by_slug.remove(&previous_slug);
            tables
                .by_slug
                .insert(restaurant.slug.clone(), restaurant.id);
        }
        tables.rows.insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        match tables.rows.remove(&id) {
            Some(removed) => {
                tables.by_slug.remove(&removed.slug);
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }
}
