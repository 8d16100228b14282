//! # Catalog Repository
//!
//! Product store implementations.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn ProductRepository>
//! PgProductRepository            (PostgreSQL / SQLx)
//! InMemoryProductRepository      (map, for local runs and tests)
//! ```

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod traits;

pub use memory::InMemoryProductRepository;
pub use pool::*;
pub use postgres::PgProductRepository;
pub use traits::*;
