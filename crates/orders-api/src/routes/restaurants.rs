//! # Restaurants
//!
//! Routes (under the API prefix):
//! - POST /restaurants/register: register a restaurant
//! - GET  /restaurants: list restaurants (`limit`, `offset`)
//! - GET  /restaurants/{slug}: fetch one restaurant

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use orders_core::{
    CreateRestaurant, CreateRestaurantInput, Restaurant, RestaurantQueries, RestaurantRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::middleware::client::ClientDevice;
use crate::registry::{RouteGroup, RouteModule};

/// Path segment claimed by the registration endpoint.
const RESERVED_SLUGS: &[&str] = &["register"];

const MAX_NAME_LEN: usize = 255;
const MAX_SLUG_LEN: usize = 100;

/// Largest amount a `NUMERIC(10, 2)` column holds.
const MAX_AMOUNT: f64 = 99_999_999.99;

// -- Request / Response DTOs --------------------------------------------------

/// Registration request.
///
/// Operational fields are optional; omitted fields take the platform
/// defaults (10:00-22:00, no fees, 30 minute delivery estimate).
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    pub name: String,
    /// Lowercase letters, digits and single hyphens.
    pub slug: String,
    pub email: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    /// `HH:MM`, 24-hour. Empty keeps the default.
    pub opening_time: Option<String>,
    /// `HH:MM`, 24-hour. Empty keeps the default.
    pub closing_time: Option<String>,
    pub delivery_fee: Option<f64>,
    pub minimum_order: Option<f64>,
    /// Minutes.
    pub estimated_delivery_time: Option<i32>,
}

impl Validate for CreateRestaurantRequest {
    fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name must not be empty".into());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("name must not exceed {MAX_NAME_LEN} characters"));
        }
        validate_slug(&self.slug)?;
        if !is_email(&self.email) {
            return Err("email must be a valid email address".into());
        }
        for (field, value) in [
            ("opening_time", &self.opening_time),
            ("closing_time", &self.closing_time),
        ] {
            if let Some(t) = value.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                if !is_clock_time(t) {
                    return Err(format!("{field} must be HH:MM (24-hour), got '{t}'"));
                }
            }
        }
        for (field, value) in [
            ("delivery_fee", self.delivery_fee),
            ("minimum_order", self.minimum_order),
        ] {
            if let Some(v) = value {
                validate_amount(field, v)?;
            }
        }
        if let Some(minutes) = self.estimated_delivery_time {
            if minutes <= 0 {
                return Err("estimated_delivery_time must be a positive number of minutes".into());
            }
        }
        Ok(())
    }
}

// Amounts are stored to the cent; anything finer would be rounded by the store
// and the response would no longer match the persisted row.
fn validate_amount(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be a non-negative amount"));
    }
    if value > MAX_AMOUNT {
        return Err(format!("{field} must not exceed {MAX_AMOUNT:.2}"));
    }
    let cents = value * 100.0;
    if (cents - cents.round()).abs() > 1e-3 {
        return Err(format!("{field} must have at most two decimal places"));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.trim().is_empty() {
        return Err("slug must not be empty".into());
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(format!("slug must not exceed {MAX_SLUG_LEN} characters"));
    }
    let well_formed = slug.split('-').all(|part| {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    });
    if !well_formed {
        return Err(format!(
            "slug '{slug}' must contain only lowercase letters, digits and single hyphens"
        ));
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(format!("slug '{slug}' is reserved"));
    }
    Ok(())
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_clock_time(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    two_digits(h)
        && two_digits(m)
        && h.parse::<u8>().is_ok_and(|h| h < 24)
        && m.parse::<u8>().is_ok_and(|m| m < 60)
}

impl From<CreateRestaurantRequest> for CreateRestaurantInput {
    fn from(req: CreateRestaurantRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            slug: req.slug,
            description: req.description,
            phone: req.phone,
            email: req.email,
            address: req.address,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            opening_time: req.opening_time.map(|t| t.trim().to_string()),
            closing_time: req.closing_time.map(|t| t.trim().to_string()),
            delivery_fee: req.delivery_fee,
            minimum_order: req.minimum_order,
            estimated_delivery_time: req.estimated_delivery_time,
        }
    }
}

/// Restaurant as returned by the API. Empty descriptive fields are omitted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    pub country: String,
    pub opening_time: String,
    pub closing_time: String,
    pub is_open: bool,
    pub delivery_fee: f64,
    pub minimum_order: f64,
    pub estimated_delivery_time: i32,
    pub rating: f64,
    pub total_reviews: i32,
    /// RFC 3339.
    pub created_at: String,
    /// RFC 3339.
    pub updated_at: String,
}

impl From<Restaurant> for RestaurantResponse {
    fn from(r: Restaurant) -> Self {
        Self {
            id: r.id.to_string(),
            name: r.name,
            slug: r.slug,
            description: r.description,
            phone: r.phone,
            email: r.email,
            address: r.address,
            city: r.city,
            state: r.state,
            postal_code: r.postal_code,
            country: r.country,
            opening_time: r.opening_time,
            closing_time: r.closing_time,
            is_open: r.is_open,
            delivery_fee: r.delivery_fee,
            minimum_order: r.minimum_order,
            estimated_delivery_time: r.estimated_delivery_time,
            rating: r.rating,
            total_reviews: r.total_reviews,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Pagination parameters for the list endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size, 1-100. Defaults to 20.
    pub limit: Option<i64>,
    /// Rows to skip. Defaults to 0.
    pub offset: Option<i64>,
}

// -- Module -------------------------------------------------------------------

/// Restaurant feature module.
#[derive(Debug, Clone)]
pub struct RestaurantRoutes {
    create: CreateRestaurant,
    queries: RestaurantQueries,
}

impl RestaurantRoutes {
    pub fn new(repo: Arc<dyn RestaurantRepository>) -> Self {
        Self {
            create: CreateRestaurant::new(repo.clone()),
            queries: RestaurantQueries::new(repo),
        }
    }
}

impl RouteModule for RestaurantRoutes {
    fn name(&self) -> &'static str {
        "restaurants"
    }

    fn register(&self, group: RouteGroup) -> RouteGroup {
        let router = Router::new()
            .route("/", get(list_restaurants))
            .route("/register", post(register_restaurant))
            .route("/{slug}", get(get_restaurant))
            .with_state(self.clone());
        group.nest("/restaurants", router)
    }
}

// -- Handlers -----------------------------------------------------------------

/// POST /api/v1/restaurants/register
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/register",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant registered", body = RestaurantResponse),
        (status = 400, description = "Malformed or invalid request", body = ErrorBody),
        (status = 409, description = "Slug already taken", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Persistence failure", body = ErrorBody),
    ),
    tag = "restaurants"
)]
async fn register_restaurant(
    State(routes): State<RestaurantRoutes>,
    device: Option<Extension<ClientDevice>>,
    body: Result<Json<CreateRestaurantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RestaurantResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let slug = req.slug.clone();

    let restaurant = routes.create.execute(req.into()).await.map_err(|e| {
        if let Some(Extension(device)) = &device {
            tracing::info!(slug = %slug, client = %device.key(), error = %e, "registration refused");
        }
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(restaurant.into())))
}

/// GET /api/v1/restaurants
#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    params(ListParams),
    responses(
        (status = 200, description = "A page of restaurants", body = Vec<RestaurantResponse>),
        (status = 400, description = "Invalid query", body = ErrorBody),
    ),
    tag = "restaurants"
)]
async fn list_restaurants(
    State(routes): State<RestaurantRoutes>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<RestaurantResponse>>, AppError> {
    let params = extract_query(params)?;
    let page = routes.queries.list(params.limit, params.offset).await?;
    Ok(Json(page.into_iter().map(RestaurantResponse::from).collect()))
}

/// GET /api/v1/restaurants/{slug}
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{slug}",
    params(("slug" = String, Path, description = "Restaurant slug")),
    responses(
        (status = 200, description = "Restaurant found", body = RestaurantResponse),
        (status = 404, description = "No restaurant with this slug", body = ErrorBody),
    ),
    tag = "restaurants"
)]
async fn get_restaurant(
    State(routes): State<RestaurantRoutes>,
    Path(slug): Path<String>,
) -> Result<Json<RestaurantResponse>, AppError> {
    routes
        .queries
        .by_slug(&slug)
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound(format!("restaurant '{slug}'")))
}
