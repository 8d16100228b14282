//! Product service metrics.

use metrics::{counter, describe_counter};

/// Metric names for the product service.
pub mod names {
    /// Product lookups answered from the cache.
    pub const CACHE_HITS_TOTAL: &str = "catalog_cache_hits_total";
    /// Product lookups that fell through to the store.
    pub const CACHE_MISSES_TOTAL: &str = "catalog_cache_misses_total";
    /// Cache operations that failed.
    pub const CACHE_ERRORS_TOTAL: &str = "catalog_cache_errors_total";
    /// Products created.
    pub const PRODUCTS_CREATED_TOTAL: &str = "catalog_products_created_total";
    /// Work items that could not be published.
    pub const PUBLISH_FAILURES_TOTAL: &str = "catalog_publish_failures_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Product lookups served from cache");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Product lookups served from the store");
    describe_counter!(names::CACHE_ERRORS_TOTAL, "Failed cache operations");
    describe_counter!(names::PRODUCTS_CREATED_TOTAL, "Total number of products created");
    describe_counter!(
        names::PUBLISH_FAILURES_TOTAL,
        "Image work items that could not be published"
    );
}

/// Service metrics recorder.
#[derive(Clone)]
pub struct ServiceMetrics;

impl ServiceMetrics {
    /// Record a cache hit.
    pub fn cache_hit() {
        counter!(names::CACHE_HITS_TOTAL).increment(1);
    }

    /// Record a cache miss.
    pub fn cache_miss() {
        counter!(names::CACHE_MISSES_TOTAL).increment(1);
    }

    /// Record a failed cache operation.
    pub fn cache_error(operation: &'static str) {
        counter!(names::CACHE_ERRORS_TOTAL, "operation" => operation).increment(1);
    }

    /// Record a product created.
    pub fn product_created(images: usize) {
        counter!(names::PRODUCTS_CREATED_TOTAL, "with_images" => (images > 0).to_string())
            .increment(1);
    }

    /// Record a work item that could not be published.
    pub fn publish_failed(queue: &str) {
        counter!(names::PUBLISH_FAILURES_TOTAL, "queue" => queue.to_string()).increment(1);
    }
}
