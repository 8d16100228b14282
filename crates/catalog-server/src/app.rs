//! Application lifecycle.

use crate::di::{build_module, AppModule};
use crate::startup::print_startup_info;
use catalog_config::AppConfig;
use catalog_core::{CatalogError, CatalogResult};
use catalog_rest::{create_router, middleware::BasicAuthenticator, AppState};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// A wired application ready to serve.
pub struct Application {
    config: AppConfig,
    module: AppModule,
}

impl Application {
    /// Connects backends and wires components from configuration.
    pub async fn build(config: AppConfig) -> CatalogResult<Self> {
        let module = build_module(&config).await?;
        Ok(Self::from_module(config, module))
    }

    /// Wraps an already wired module.
    pub fn from_module(config: AppConfig, module: AppModule) -> Self {
        Self { config, module }
    }

    /// Returns the wired components.
    pub fn module(&self) -> &AppModule {
        &self.module
    }

    /// Builds the HTTP router.
    pub fn router(&self) -> axum::Router {
        create_router(
            AppState::new(self.module.product_service()),
            Arc::new(BasicAuthenticator::from_config(&self.config.auth)),
            &self.config.server,
        )
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> CatalogResult<()> {
        let addr = self.config.server.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| CatalogError::Internal(format!("Failed to bind {addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serves on `listener` until `shutdown` resolves, then drains the
    /// processor and closes backend connections.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> CatalogResult<()> {
        if self.config.processor.enabled {
            self.module
                .processor()
                .start()
                .map_err(|e| CatalogError::Internal(e.to_string()))?;
        } else {
            info!("Image processor disabled; work items stay queued");
        }

        let local_addr = listener
            .local_addr()
            .map_err(|e| CatalogError::Internal(format!("Failed to read local address: {e}")))?;
        print_startup_info(&local_addr.to_string());

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CatalogError::Internal(format!("HTTP server error: {e}")));

        self.module.shutdown().await;
        info!("Server shutdown complete");
        result
    }
}
