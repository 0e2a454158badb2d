use tokio::net::TcpListener;

use crate::config::SignerServiceConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// The listing signer service.
pub struct SignerServer {
    config: SignerServiceConfig,
    state: AppState,
}

impl SignerServer {
    /// Validate the configuration and load every catalog key.
    pub fn new(config: SignerServiceConfig) -> ServerResult<Self> {
        let state = AppState::new(config.signer()?);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &SignerServiceConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            catalogs = self.config.catalogs.len(),
            "signer service listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
