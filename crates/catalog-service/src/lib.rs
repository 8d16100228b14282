//! # Catalog Service
//!
//! Product service layer: cache-aside reads, store writes, and the
//! hand-off of image work to the background processor.

pub mod cache;
pub mod dto;
pub mod r#impl;
pub mod metrics;
pub mod product_service;

pub use cache::*;
pub use dto::*;
pub use product_service::*;
pub use r#impl::ProductServiceImpl;
