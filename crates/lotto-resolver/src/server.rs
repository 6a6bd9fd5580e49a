use std::{net::SocketAddr, sync::Arc};

use crate::{bootstrap::BootstrapLoader, clock::Clock, config::HttpServerConfig, resolver::DrawResolver};

mod handlers;
mod router;
mod types;

pub use router::build_router;
pub use types::{DrawsResponse, ErrorBody, HealthResponse, LatestResponse};

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct ResolverState {
    pub(crate) resolver: Arc<DrawResolver>,
    pub(crate) bootstrap: Arc<BootstrapLoader>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ResolverState {
    pub fn new(resolver: DrawResolver, bootstrap: BootstrapLoader, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            bootstrap: Arc::new(bootstrap),
            clock,
        }
    }
}

#[derive(Clone)]
pub struct HttpServer {
    state: ResolverState,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn with_config(state: ResolverState, config: &HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state,
            addr: config.socket_addr()?,
        })
    }

    /// Serves until Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<()> {
        let addr = self.addr;
        let app = build_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("HTTP server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for shutdown signal: {e}");
                }
                log::info!("Shutdown signal received");
            })
            .await?;
        Ok(())
    }
}
