//! # Catalog Core
//!
//! Core types, the product model, and error definitions for the product
//! catalog. Every other crate in the workspace builds on these.

pub mod error;
pub mod id;
pub mod product;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use error::*;
pub use id::*;
pub use product::*;
pub use result::*;
pub use telemetry::{Logger, TelemetryConfig, LogFormat};
#[cfg(feature = "telemetry")]
pub use telemetry::init_tracing;
pub use validation::*;
