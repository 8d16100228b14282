//! In-process cache with per-entry expiry.
//!
//! Used when Redis is unavailable in local runs and as a test double with
//! call counters.

use super::CacheInterface;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Cache living in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a cache error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_raw` calls so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set_raw` calls so far.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls so far.
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Returns true when no live entry exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> CatalogResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Cache("cache unavailable".to_string()));
        }
        Ok(())
    }
}

/// Glob match supporting `*` wildcards, as used by Redis patterns.
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CatalogResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entries.lock().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now()))
    }

    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        self.check()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }
}
