//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Cap request bodies; handlers turn an over-limit body into a 400
//! - Bind server to listener
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{AskLimits, RelayConfig, Secrets};
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::json_error;
use crate::relay;
use crate::upstream::Upstream;

/// Application state injected into handlers.
///
/// Everything here is read-only after construction; requests share nothing
/// mutable.
#[derive(Clone)]
pub struct AppState {
    pub secrets: Arc<Secrets>,
    pub limits: Arc<AskLimits>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(secrets: Secrets, limits: AskLimits, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            secrets: Arc::new(secrets),
            limits: Arc::new(limits),
            upstream,
        }
    }
}

/// HTTP server for the ask relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig, secrets: Secrets, upstream: Arc<dyn Upstream>) -> Self {
        tracing::info!(
            api_key = %secrets.api_key_name(),
            api_key_present = secrets.api_key().is_some(),
            origin_secret_present = secrets.origin_secret().is_some(),
            "Upstream credentials loaded"
        );
        if secrets.api_key().is_none() {
            tracing::warn!(
                api_key = %secrets.api_key_name(),
                "API key missing; every ask request will fail with 500"
            );
        }

        let state = AppState::new(secrets, config.limits.clone(), upstream);
        let router = build_router(state);
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.limits.max_body_bytes;

    Router::new()
        .route("/ask", post(relay::ask))
        .route("/ask/stream", post(relay::ask_stream))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "Not found")
}
