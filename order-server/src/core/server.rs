//! Server Implementation
//!
//! HTTP server startup, middleware stack and graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use http::{HeaderName, HeaderValue};
use shared::error::{AppError, ErrorCode};
use tower::{BoxError, ServiceBuilder};
use tower::timeout::TimeoutLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::{Config, Result, ServerError, ServerState};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::with_message(ErrorCode::TimeoutError, "Request timed out")
    } else {
        AppError::internal(format!("Unhandled middleware error: {err}"))
    }
}

/// Fully configured application: routes, middleware and state
pub fn build_app(state: ServerState) -> Router {
    let request_timeout = Duration::from_millis(state.config.request_timeout_ms);

    crate::api::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        state.start_background_tasks().await;

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, environment = %self.config.environment, "🚀 Order server listening");

        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        axum::serve(listener, build_app(state))
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
            .await
            .map_err(|e| ServerError::Internal(anyhow::anyhow!("Server error: {}", e)))?;

        tracing::info!("✅ Server shutdown complete");
        Ok(())
    }
}

/// Graceful shutdown handler
///
/// Listens for SIGTERM and Ctrl+C. In-flight requests get `grace` to finish
/// before the process is forced down.
async fn shutdown_signal(grace: Duration) {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::warn!(grace_ms = grace.as_millis() as u64, "Shutdown grace period elapsed, exiting");
        std::process::exit(0);
    });
}
