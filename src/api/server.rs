//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum router for the wallet endpoints
//! - Wire up middleware (request ID, tracing, body limit, timeout, metrics)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::config::{NodeConfig, WalletConfig};
use crate::orchestrator::TransactionOrchestrator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub node: Arc<NodeConfig>,
    /// Upper bound for `x-confirmation-timeout`.
    pub max_confirmation_secs: u64,
}

/// HTTP front end for the wallet.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &WalletConfig, orchestrator: Arc<TransactionOrchestrator>) -> Self {
        let state = AppState {
            orchestrator,
            node: Arc::new(config.node.clone()),
            max_confirmation_secs: config.max_confirmation_secs(),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &WalletConfig, state: AppState) -> Router {
        Router::new()
            .route("/deploy", post(handlers::deploy))
            .route("/config", get(handlers::node_config))
            .route("/health", get(handlers::health))
            .route("/transactions/pending", get(handlers::pending))
            .route("/transactions/{address}", get(handlers::history))
            .route("/{contract}/approve", post(handlers::approve))
            .route("/{contract}/allowance", get(handlers::allowance))
            .route("/{contract}/{field}", get(handlers::read_field))
            .route_layer(middleware::from_fn(handlers::track_requests))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
