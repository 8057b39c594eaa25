//! # Redis Cache Client
//!
//! Connection-managed Redis handle. The restaurant flow does not read or
//! write the cache yet; the handle is established at startup and probed by
//! the readiness check.

use redis::aio::ConnectionManager;
use redis::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("invalid redis url: {0}")]
    InvalidUrl(#[source] redis::RedisError),

    #[error("redis connection failed: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("redis command failed: {0}")]
    Command(#[source] redis::RedisError),
}

/// Cloneable Redis handle. Clones share the underlying multiplexed connection,
/// which reconnects on its own after failures.
#[derive(Clone)]
pub struct CacheClient {
    conn: ConnectionManager,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient").finish_non_exhaustive()
    }
}

impl CacheClient {
    /// Open a connection and verify it with `PING`.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::InvalidUrl)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(CacheError::Connect)?;
        let cache = Self { conn };
        cache.ping().await?;
        tracing::info!("redis connection established");
        Ok(cache)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(CacheError::Command)
    }
}
