//! HTTP API: routing, middleware stack and graceful shutdown.

pub mod cache;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod routes;
pub mod state;

use crate::utils::error::{AppError, Result};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o.trim_end_matches('/')).ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(middleware::REQUEST_ID_HEADER)])
        .expose_headers([HeaderName::from_static(middleware::REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60))
}

/// The full application: routes plus middleware. Layers run outermost first:
/// request context, CORS, security headers, URI limit, rate limit.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/search", get(routes::search))
        .route("/api/autocomplete", get(routes::autocomplete))
        .route(
            "/api/zip/validate",
            get(routes::zip_validate_get).post(routes::zip_validate_post),
        )
        .route("/api/plans/list", get(routes::plans_list))
        .route("/api/plans/facets", get(routes::plans_facets))
        .route("/api/deregulated-areas", get(routes::deregulated_areas))
        .route("/api/esiid/lookup", axum::routing::post(routes::esiid_lookup))
        .route("/api/tdsp", get(routes::tdsp_registry))
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::uri_limit))
        .layer(from_fn_with_state(state.clone(), middleware::security_headers))
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(from_fn(middleware::request_context))
        .with_state(state)
}

pub async fn start_server(state: Arc<AppState>) -> Result<()> {
    let address = state.config.bind_address();
    let app = build_router(state);

    tracing::info!("🔌 Binding to {}", address);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("🚀 Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::IoError)?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
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
}
