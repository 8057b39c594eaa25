//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document, served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orders API",
        version = "0.1.0",
        description = "Restaurant registration and lookup for the orders platform.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::restaurants::register_restaurant,
        crate::routes::restaurants::list_restaurants,
        crate::routes::restaurants::get_restaurant,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::restaurants::CreateRestaurantRequest,
        crate::routes::restaurants::RestaurantResponse,
    )),
    tags(
        (name = "restaurants", description = "Restaurant registration and lookup"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
