//! # Application State
//!
//! Shared state for the Axum application, assembled once at startup and
//! cloned into every router. Clones share all underlying resources.
//!
//! - **restaurants**: the repository every restaurant route goes through.
//!   In-memory unless a Postgres pool is attached.
//! - **limiter**: the per-client token-bucket table.
//! - **db** / **cache**: optional connections, probed by readiness.
//! - **metrics**: Prometheus handle, present only when a recorder is installed.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use orders_core::{InMemoryRestaurantRepository, RestaurantRepository};
use sqlx::PgPool;

use crate::cache::CacheClient;
use crate::config::AppConfig;
use crate::db::PgRestaurantRepository;
use crate::middleware::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub restaurants: Arc<dyn RestaurantRepository>,
    pub limiter: RateLimiter,
    pub db: Option<PgPool>,
    pub cache: Option<CacheClient>,
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("db", &self.db.is_some())
            .field("cache", &self.cache.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Default configuration, in-memory repository, no external services.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_config());
        Self {
            config: Arc::new(config),
            restaurants: Arc::new(InMemoryRestaurantRepository::new()),
            limiter,
            db: None,
            cache: None,
            metrics: None,
        }
    }

    /// Persist restaurants in Postgres.
    #[must_use]
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.restaurants = Arc::new(PgRestaurantRepository::new(pool.clone()));
        self.db = Some(pool);
        self
    }

    /// Swap the repository. Used by tests to inject failing stores.
    #[must_use]
    pub fn with_repository(mut self, repo: Arc<dyn RestaurantRepository>) -> Self {
        self.restaurants = repo;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheClient) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
