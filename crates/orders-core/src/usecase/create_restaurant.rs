//! # Create Restaurant
//!
//! Enforces slug uniqueness, builds the entity through
//! [`Restaurant::new`], merges caller-supplied fields, and persists.
//!
//! The caller is trusted for shape (non-empty name and slug, email syntax);
//! the business rule is not.
//!
//! The existence check and the insert are separate round-trips. Two
//! concurrent registrations of one slug can both pass the check; the store's
//! uniqueness constraint decides, and its rejection surfaces here as the
//! same [`CreateRestaurantError::SlugTaken`].

use std::sync::Arc;

use thiserror::Error;

use crate::restaurant::{RepositoryError, Restaurant, RestaurantRepository};

/// Data supplied by a caller registering a restaurant.
///
/// Operational fields are `Option`: `None` keeps the factory default.
/// For the time fields, `Some("")` is treated like `None`.
#[derive(Debug, Clone, Default)]
pub struct CreateRestaurantInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub delivery_fee: Option<f64>,
    pub minimum_order: Option<f64>,
    pub estimated_delivery_time: Option<i32>,
}

/// Why a registration was refused.
#[derive(Error, Debug)]
pub enum CreateRestaurantError {
    /// Another restaurant already holds the slug.
    #[error("a restaurant with slug '{0}' already exists")]
    SlugTaken(String),

    /// The existence check could not be completed.
    #[error("error checking existing restaurant: {0}")]
    Lookup(#[source] RepositoryError),

    /// The insert failed for a reason other than slug collision.
    #[error("could not create restaurant: {0}")]
    Persist(#[source] RepositoryError),
}

/// Registration use case.
#[derive(Clone)]
pub struct CreateRestaurant {
    repo: Arc<dyn RestaurantRepository>,
}

impl std::fmt::Debug for CreateRestaurant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateRestaurant").finish_non_exhaustive()
    }
}

impl CreateRestaurant {
    pub fn new(repo: Arc<dyn RestaurantRepository>) -> Self {
        Self { repo }
    }

    /// Register a restaurant.
    ///
    /// On success the returned value is exactly what was handed to the
    /// repository; nothing mutates it after the insert.
    pub async fn execute(
        &self,
        input: CreateRestaurantInput,
    ) -> Result<Restaurant, CreateRestaurantError> {
        match self.repo.get_by_slug(&input.slug).await {
            Ok(Some(_)) => return Err(CreateRestaurantError::SlugTaken(input.slug)),
            Ok(None) => {}
            Err(e) => return Err(CreateRestaurantError::Lookup(e)),
        }

        let restaurant = build(input);

        match self.repo.create(&restaurant).await {
            Ok(()) => {
                tracing::info!(id = %restaurant.id, slug = %restaurant.slug, "restaurant registered");
                Ok(restaurant)
            }
            Err(RepositoryError::DuplicateSlug(slug)) => {
                tracing::debug!(slug = %slug, "slug claimed concurrently; store rejected insert");
                Err(CreateRestaurantError::SlugTaken(slug))
            }
            Err(e) => Err(CreateRestaurantError::Persist(e)),
        }
    }
}

/// Factory construction followed by the field merge.
fn build(input: CreateRestaurantInput) -> Restaurant {
    let mut r = Restaurant::new(input.name, input.slug);
    r.description = input.description;
    r.phone = input.phone;
    r.email = input.email;
    r.address = input.address;
    r.city = input.city;
    r.state = input.state;
    r.postal_code = input.postal_code;

    if let Some(t) = supplied_text(input.opening_time) {
        r.opening_time = t;
    }
    if let Some(t) = supplied_text(input.closing_time) {
        r.closing_time = t;
    }
    if let Some(fee) = input.delivery_fee {
        r.delivery_fee = fee;
    }
    if let Some(min) = input.minimum_order {
        r.minimum_order = min;
    }
    if let Some(minutes) = input.estimated_delivery_time {
        r.estimated_delivery_time = minutes;
    }
    r
}

/// An empty string is not a value.
fn supplied_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
