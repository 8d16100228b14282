//! Custom Axum extractors.

mod principal;
mod validated;

pub use principal::*;
pub use validated::*;
