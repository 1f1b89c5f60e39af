//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::RpcError;
use crate::handlers::{self, SharedService};

pub const TRUST: &str = "/trust";
pub const TRUST_SERVICE_TYPE: &str = "/trust/service-type";

pub fn router(service: SharedService, cors: CorsLayer) -> Router {
    Router::new()
        .route(TRUST, post(handlers::trust_query))
        .route(TRUST_SERVICE_TYPE, post(handlers::service_type_query))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors)
        .with_state(service)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    service: SharedService,
    cors: CorsLayer,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, service: SharedService, cors: CorsLayer) -> Self {
        Self {
            addr,
            service,
            cors,
        }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.service, self.cors);
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        info!("HTTP server listening on {}", self.addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
