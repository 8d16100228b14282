//! Cache interface trait for abstracted caching operations.

use catalog_core::CatalogResult;
use async_trait::async_trait;
use std::time::Duration;

/// Cache interface for storing and retrieving cached data.
///
/// Values are JSON strings so the trait stays object safe. The cache is
/// never authoritative: callers treat every error as a miss.
#[async_trait]
pub trait CacheInterface: Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> CatalogResult<bool>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> CatalogResult<bool>;

    /// Delete every key matching a glob pattern.
    ///
    /// Returns the number of keys deleted.
    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64>;

    /// Check if caching is enabled.
    fn is_enabled(&self) -> bool;
}

/// Typed helpers over [`CacheInterface`].
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value from the cache.
    ///
    /// A value that no longer decodes is reported as an error, not a miss.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> CatalogResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CatalogResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

impl<T: CacheInterface + ?Sized> CacheExt for T {}
