//! # Restaurant Entity
//!
//! The restaurant record as the domain sees it. Aggregate reputation fields
//! (`rating`, `total_reviews`) are never written by the registration path;
//! they exist for review workflows that mutate them later.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opening time applied by the factory when none is supplied.
pub const DEFAULT_OPENING_TIME: &str = "10:00";

/// Closing time applied by the factory when none is supplied.
pub const DEFAULT_CLOSING_TIME: &str = "22:00";

/// Country applied by the factory.
pub const DEFAULT_COUNTRY: &str = "USA";

/// Estimated delivery time in minutes applied by the factory.
pub const DEFAULT_ESTIMATED_DELIVERY_MINUTES: i32 = 30;

/// Unique identifier for a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(pub Uuid);

impl RestaurantId {
    /// Generate a new random restaurant identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RestaurantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RestaurantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A restaurant registered on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    /// Human-readable unique key. Immutable after creation.
    pub slug: String,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `HH:MM`, local time of the restaurant.
    pub opening_time: String,
    /// `HH:MM`, local time of the restaurant.
    pub closing_time: String,
    pub is_open: bool,
    pub delivery_fee: f64,
    pub minimum_order: f64,
    /// Minutes.
    pub estimated_delivery_time: i32,
    pub logo_url: String,
    pub banner_url: String,
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// Build a new restaurant with a freshly minted identity and every
    /// operational default applied.
    ///
    /// Timestamps are truncated to microseconds, the resolution Postgres
    /// stores, so a persisted record reads back equal to the one written.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id: RestaurantId::new(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            latitude: None,
            longitude: None,
            opening_time: DEFAULT_OPENING_TIME.to_string(),
            closing_time: DEFAULT_CLOSING_TIME.to_string(),
            is_open: true,
            delivery_fee: 0.0,
            minimum_order: 0.0,
            estimated_delivery_time: DEFAULT_ESTIMATED_DELIVERY_MINUTES,
            logo_url: String::new(),
            banner_url: String::new(),
            rating: 0.0,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
