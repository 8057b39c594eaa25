//! # Service Configuration
//!
//! Command-line flags with environment-variable fallbacks, parsed once in
//! `main`. Tests build an [`AppConfig`] through `Default` and override the
//! fields they care about.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::middleware::client::ProxyTrust;
use crate::middleware::rate_limit::RateLimitConfig;
use crate::middleware::recovery::RecoveryMode;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Runtime configuration for the restaurant service.
#[derive(Clone, Parser)]
#[command(name = "orders-api", version, about = "Restaurant registration service")]
pub struct AppConfig {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Include panic details and stack traces in 500 responses.
    #[arg(long, env = "APP_DEBUG", default_value_t = false)]
    pub debug: bool,

    /// Postgres connection string. Without it restaurants live in memory.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Redis connection string.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Token bucket capacity per client.
    #[arg(
        long,
        env = "RATE_LIMIT_BURST",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rate_limit_burst: u32,

    /// Tokens restored per second per client.
    #[arg(
        long,
        env = "RATE_LIMIT_PER_SECOND",
        default_value_t = 5.0,
        value_parser = parse_refill_rate
    )]
    pub rate_limit_per_second: f64,

    /// Seconds a client bucket may sit unused before eviction.
    #[arg(
        long,
        env = "RATE_LIMIT_IDLE_SECS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_idle_secs: u64,

    /// Reverse proxies in front of the service whose `X-Forwarded-For`
    /// entries are believed. Zero keys clients on the socket peer.
    #[arg(long, env = "TRUSTED_PROXY_HOPS", default_value_t = 0)]
    pub trusted_proxy_hops: usize,

    /// Allowed CORS origins. Empty allows any origin.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,

    /// Reject API requests that carry no bearer token.
    #[arg(long, env = "REQUIRE_BEARER", default_value_t = false)]
    pub require_bearer: bool,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            debug: false,
            database_url: None,
            redis_url: None,
            rate_limit_burst: 10,
            rate_limit_per_second: 5.0,
            rate_limit_idle_secs: 600,
            trusted_proxy_hops: 0,
            cors_allowed_origins: Vec::new(),
            require_bearer: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            burst: self.rate_limit_burst,
            per_second: self.rate_limit_per_second,
        }
    }

    pub fn proxy_trust(&self) -> ProxyTrust {
        ProxyTrust::hops(self.trusted_proxy_hops)
    }

    pub fn rate_limit_idle(&self) -> Duration {
        Duration::from_secs(self.rate_limit_idle_secs)
    }

    pub fn recovery_mode(&self) -> RecoveryMode {
        if self.debug {
            RecoveryMode::Debug
        } else {
            RecoveryMode::Release
        }
    }
}

fn parse_refill_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(format!("refill rate must be a positive number, got '{raw}'"));
    }
    Ok(rate)
}

/// Redacts connection strings, which may embed credentials.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("debug", &self.debug)
            .field("database_url", &redact(&self.database_url))
            .field("redis_url", &redact(&self.redis_url))
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("rate_limit_per_second", &self.rate_limit_per_second)
            .field("rate_limit_idle_secs", &self.rate_limit_idle_secs)
            .field("trusted_proxy_hops", &self.trusted_proxy_hops)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("require_bearer", &self.require_bearer)
            .field("log_format", &self.log_format)
            .finish()
    }
}
