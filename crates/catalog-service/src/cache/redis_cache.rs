//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use catalog_config::RedisConfig;
use catalog_core::{CatalogError, CatalogResult};
use deadpool_redis::{redis::AsyncCommands, Pool};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default TTL for cached product snapshots (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 100;

/// Redis-based cache service.
pub struct RedisCacheService {
    /// Redis connection pool.
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a cache service from configuration.
    ///
    /// Returns a disabled cache when Redis is turned off.
    pub fn from_config(config: &RedisConfig) -> CatalogResult<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let mut redis_cfg = deadpool_redis::Config::from_url(&config.url);
        redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size));
        let pool = redis_cfg
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| CatalogError::Cache(format!("Failed to create Redis pool: {e}")))?;

        Ok(Self::new(Arc::new(pool)))
    }

    /// Create a no-op cache service (for when Redis is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> CatalogResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool
                .get()
                .await
                .map_err(|e| CatalogError::Cache(format!("Failed to get Redis connection: {e}"))),
            None => Err(CatalogError::Cache("Cache is disabled".to_string())),
        }
    }
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to get key '{key}': {e}")))?;

        match &value {
            Some(_) => debug!(key, "Cache hit"),
            None => debug!(key, "Cache miss"),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to set key '{key}': {e}")))?;

        debug!(key, ttl_secs, "Cached key");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CatalogResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to delete key '{key}': {e}")))?;

        debug!(key, deleted = deleted > 0, "Deleted key");
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let exists: bool = conn
            .exists(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to check key '{key}': {e}")))?;

        Ok(exists)
    }

    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CatalogError::Cache(format!("Failed to scan keys: {e}")))?;

            if !keys.is_empty() {
                let removed: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| CatalogError::Cache(format!("Failed to delete keys: {e}")))?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(pattern, deleted, "Deleted keys matching pattern");
        Ok(deleted)
    }
}
