//! # orders-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the orders platform.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use orders_api::cache::CacheClient;
use orders_api::config::AppConfig;
use orders_api::{db, telemetry, AppState};

/// How often idle rate-limit buckets are swept.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    telemetry::init_tracing(config.log_format);
    tracing::info!(?config, "configuration loaded");

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let mut state = AppState::with_config(config.clone()).with_metrics(metrics);

    match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url).await.map_err(|e| {
                tracing::error!("Database initialization failed: {e}");
                e
            })?;
            state = state.with_database(pool);
        }
        None => tracing::warn!(
            "DATABASE_URL not set; running in-memory only mode. State will not survive restarts."
        ),
    }

    if let Some(url) = &config.redis_url {
        let cache = CacheClient::connect(url).await.map_err(|e| {
            tracing::error!("Redis initialization failed: {e}");
            e
        })?;
        state = state.with_cache(cache);
    }

    let eviction = state
        .limiter
        .spawn_eviction(EVICTION_INTERVAL, config.rate_limit_idle());
    let pool = state.db.clone();
    let app = orders_api::app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("binding {}", config.bind_addr()))?;
    tracing::info!("orders-api listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    eviction.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }
    tracing::info!("orders-api stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received; draining connections");
}
