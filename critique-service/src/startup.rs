//! Application startup and lifecycle management.

use crate::config::CritiqueConfig;
use crate::handlers::{
    health::health_check,
    metrics::metrics,
    pages::index,
    upload::upload_handler,
};
use crate::middleware::metrics::metrics_middleware;
use crate::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use crate::services::providers::VisionProvider;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, RequestId};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CritiqueConfig>,
    pub provider: Arc<dyn VisionProvider>,
}

impl AppState {
    pub fn new(config: CritiqueConfig, provider: Arc<dyn VisionProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The multipart reader owns the upload body; the limit is opt-in.
    let body_limit = match state.config.upload.max_body_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route(
            "/api/upload",
            post(upload_handler)
                .options(upload_handler)
                .layer(body_limit),
        )
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %span_request_id(request),
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Request id stored by `request_id_middleware`, or `-` outside it.
fn span_request_id<B>(request: &axum::http::Request<B>) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.as_str())
        .unwrap_or("-")
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the Gemini provider described by `config`.
    pub async fn build(config: CritiqueConfig) -> Result<Self, AppError> {
        if config.gemini.api_key.expose_secret().is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set; uploads will fail upstream");
        }

        let provider = GeminiVisionProvider::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: config.gemini.timeout,
        })
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        tracing::info!(
            model = %config.gemini.model,
            timeout_secs = ?config.gemini.timeout.map(|t| t.as_secs()),
            max_body_bytes = ?config.upload.max_body_bytes,
            "Initialized Gemini vision provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_provider(
        config: CritiqueConfig,
        provider: Arc<dyn VisionProvider>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let address = config.common.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("critique-service: HTTP on port {}", port);

        let router = build_router(AppState::new(config, provider));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_uses_request_id_extension() {
        let mut request = axum::http::Request::builder()
            .uri("/health")
            .header(service_core::middleware::REQUEST_ID_HEADER, "from-header")
            .body(())
            .unwrap();
        assert_eq!(span_request_id(&request), "-");

        request
            .extensions_mut()
            .insert(RequestId("from-middleware".to_string()));
        assert_eq!(span_request_id(&request), "from-middleware");
    }
}
