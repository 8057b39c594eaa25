//! Restaurant persistence operations.
//!
//! Money columns are `NUMERIC` in the table; they are bound through an
//! explicit `::numeric` cast and read back as `float8`. Slug uniqueness is
//! enforced by the `restaurants_slug_key` index, and a violation surfaces as
//! [`RepositoryError::DuplicateSlug`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orders_core::{RepositoryError, Restaurant, RestaurantId, RestaurantRepository};
use sqlx::PgPool;
use uuid::Uuid;

const SLUG_INDEX: &str = "restaurants_slug_key";

const SELECT_COLUMNS: &str = "SELECT id, name, slug, description, phone, email, address, city, \
     state, postal_code, country, latitude, longitude, opening_time, closing_time, is_open, \
     delivery_fee::float8 AS delivery_fee, minimum_order::float8 AS minimum_order, \
     estimated_delivery_time, logo_url, banner_url, rating::float8 AS rating, total_reviews, \
     created_at, updated_at FROM restaurants";

/// [`RestaurantRepository`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgRestaurantRepository {
    pool: PgPool,
}

impl PgRestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    async fn create(&self, r: &Restaurant) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO restaurants (id, name, slug, description, phone, email, address, city,
                state, postal_code, country, latitude, longitude, opening_time, closing_time,
                is_open, delivery_fee, minimum_order, estimated_delivery_time, logo_url,
                banner_url, rating, total_reviews, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17::numeric, $18::numeric, $19, $20, $21, $22::numeric, $23, $24, $25)",
        )
        .bind(r.id.as_uuid())
        .bind(&r.name)
        .bind(&r.slug)
        .bind(&r.description)
        .bind(&r.phone)
        .bind(&r.email)
        .bind(&r.address)
        .bind(&r.city)
        .bind(&r.state)
        .bind(&r.postal_code)
        .bind(&r.country)
        .bind(r.latitude)
        .bind(r.longitude)
        .bind(&r.opening_time)
        .bind(&r.closing_time)
        .bind(r.is_open)
        .bind(r.delivery_fee)
        .bind(r.minimum_order)
        .bind(r.estimated_delivery_time)
        .bind(&r.logo_url)
        .bind(&r.banner_url)
        .bind(r.rating)
        .bind(r.total_reviews)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &r.slug))?;

        Ok(())
    }

    async fn get_by_id(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(row.map(RestaurantRow::into_record))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!("{SELECT_COLUMNS} WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(row.map(RestaurantRow::into_record))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Restaurant>, RepositoryError> {
        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            "{SELECT_COLUMNS} LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        Ok(rows.into_iter().map(RestaurantRow::into_record).collect())
    }

    async fn update(&self, r: &Restaurant) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE restaurants SET name = $2, slug = $3, description = $4, phone = $5,
                email = $6, address = $7, city = $8, state = $9, postal_code = $10,
                country = $11, latitude = $12, longitude = $13, opening_time = $14,
                closing_time = $15, is_open = $16, delivery_fee = $17::numeric,
                minimum_order = $18::numeric, estimated_delivery_time = $19, logo_url = $20,
                banner_url = $21, rating = $22::numeric, total_reviews = $23, updated_at = $24
             WHERE id = $1",
        )
        .bind(r.id.as_uuid())
        .bind(&r.name)
        .bind(&r.slug)
        .bind(&r.description)
        .bind(&r.phone)
        .bind(&r.email)
        .bind(&r.address)
        .bind(&r.city)
        .bind(&r.state)
        .bind(&r.postal_code)
        .bind(&r.country)
        .bind(r.latitude)
        .bind(r.longitude)
        .bind(&r.opening_time)
        .bind(&r.closing_time)
        .bind(r.is_open)
        .bind(r.delivery_fee)
        .bind(r.minimum_order)
        .bind(r.estimated_delivery_time)
        .bind(&r.logo_url)
        .bind(&r.banner_url)
        .bind(r.rating)
        .bind(r.total_reviews)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &r.slug))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(r.id));
        }
        Ok(())
    }

    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}

/// A unique violation on the slug index becomes `DuplicateSlug`; anything
/// else is a backend fault.
fn map_write_error(err: sqlx::Error, slug: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(SLUG_INDEX) {
            return RepositoryError::DuplicateSlug(slug.to_string());
        }
    }
    RepositoryError::backend(err)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct RestaurantRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    phone: String,
    email: String,
    address: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    opening_time: String,
    closing_time: String,
    is_open: bool,
    delivery_fee: f64,
    minimum_order: f64,
    estimated_delivery_time: i32,
    logo_url: String,
    banner_url: String,
    rating: f64,
    total_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RestaurantRow {
    fn into_record(self) -> Restaurant {
        Restaurant {
            id: RestaurantId(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            latitude: self.latitude,
            longitude: self.longitude,
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            is_open: self.is_open,
            delivery_fee: self.delivery_fee,
            minimum_order: self.minimum_order,
            estimated_delivery_time: self.estimated_delivery_time,
            logo_url: self.logo_url,
            banner_url: self.banner_url,
            rating: self.rating,
            total_reviews: self.total_reviews,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
