//! # Catalog REST
//!
//! REST API layer using Axum for the product catalog.
//! Provides product endpoints, HTTP Basic authentication, rate limiting
//! and health checks.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
