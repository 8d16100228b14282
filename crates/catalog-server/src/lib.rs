//! # Catalog Server Library
//!
//! Wires configuration, storage, cache, work queue, product service,
//! image processor and the HTTP router into a running application.

pub mod app;
pub mod di;
pub mod startup;

pub use app::Application;
pub use di::{build_module, AppModule, AppModuleBuilder, QueueHandle};
