//! # orders-core — Domain Layer for the Orders Service
//!
//! Defines the restaurant aggregate, the repository contract the HTTP layer
//! persists through, and the use cases that enforce business rules before
//! anything reaches storage.
//!
//! ## Key Design Principles
//!
//! 1. **One factory, one set of defaults.** [`Restaurant::new`] is the only
//!    place an identity is minted and operational defaults are applied.
//!    Nothing else writes those defaults.
//!
//! 2. **Absence is not failure.** Repository lookups return `Ok(None)` when
//!    a row does not exist. `Err` is reserved for storage faults, so use
//!    cases can branch on absence without inspecting error variants.
//!
//! 3. **Storage is the last word on uniqueness.** [`CreateRestaurant`]
//!    rejects duplicate slugs early, but the check-then-insert is not atomic.
//!    Stores reject a duplicate slug with [`RepositoryError::DuplicateSlug`]
//!    and the use case maps it to the same conflict outcome.
//!
//! ## Crate Policy
//!
//! - No HTTP and no SQL. Adapters live in `orders-api`.
//! - No `.unwrap()` outside tests.

pub mod restaurant;
pub mod usecase;

pub use restaurant::{
    InMemoryRestaurantRepository, RepositoryError, Restaurant, RestaurantId, RestaurantRepository,
};
pub use usecase::{
    CreateRestaurant, CreateRestaurantError, CreateRestaurantInput, RestaurantQueries,
};
