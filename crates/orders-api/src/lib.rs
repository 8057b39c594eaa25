//! # orders-api — Axum API Service
//!
//! HTTP surface for the orders platform, built on Axum/Tower/Tokio.
//! Feature modules register their routes under `/api/v1` through the
//! [`registry::RouteModule`] protocol; operational endpoints sit at the root.
//!
//! ## Routes
//!
//! - `/api/v1/restaurants/*`: restaurant registration and lookup
//! - `/health/*`: Kubernetes probes
//! - `/metrics`: Prometheus exposition
//! - `/openapi.json`: OpenAPI document
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → metrics → rate limit → CORS → panic recovery → client
//! identification → (bearer gate, API routes only, when enabled) → handler
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; it lives in `orders-core`.
//! - All errors map to structured HTTP responses via [`AppError`].

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod registry;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use error::AppError;
pub use state::AppState;

use crate::middleware::client::client_middleware;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::recovery::{install_panic_hook, recovery_middleware};
use crate::registry::{register_modules, RouteModule};
use crate::routes::restaurants::RestaurantRoutes;

/// Prefix shared by every feature module.
pub const API_PREFIX: &str = "/api/v1";

/// Feature modules mounted under [`API_PREFIX`], in registration order.
pub fn default_modules(state: &AppState) -> Vec<Box<dyn RouteModule>> {
    vec![Box::new(RestaurantRoutes::new(state.restaurants.clone()))]
}

/// Build the application router with the default feature modules.
pub fn app(state: AppState) -> Router {
    let modules = default_modules(&state);
    router(state, modules)
}

/// Build the application router from an explicit module list.
pub fn router(state: AppState, modules: Vec<Box<dyn RouteModule>>) -> Router {
    install_panic_hook();

    let group = register_modules(API_PREFIX, &modules);
    let gated = state.config.require_bearer && group.has_routes();
    let mut api = group.into_router();
    if gated {
        api = api.route_layer(from_fn(auth::bearer_middleware));
    }

    let infra = Router::new()
        .merge(routes::health::router())
        .merge(openapi::router())
        .with_state(state.clone());

    let proxies = state.config.proxy_trust();

    // Request spans are enabled at INFO so handler errors carry method and URI.
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .merge(infra)
        .merge(api)
        .layer(from_fn_with_state(proxies, client_middleware))
        .layer(from_fn_with_state(
            state.config.recovery_mode(),
            recovery_middleware,
        ))
        .layer(middleware::cors::layer(&state.config.cors_allowed_origins))
        .layer(from_fn_with_state(
            (state.limiter.clone(), proxies),
            rate_limit_middleware,
        ))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(trace)
}
