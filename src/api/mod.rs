//! HTTP query API over the order cache.
//!
//! Endpoints:
//! - `GET /api/order/{id}`: the cached order, or 404 `{"error":"Order not found"}`
//! - `GET /api/health`: `{"status":"healthy","cacheSize":N}`
//!
//! Reads never touch the store; a miss is a 404 even if the order exists in
//! the database but was never cached.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::services::{OrderService, ServiceError};

/// Shared state for axum handlers.
type AppState = Arc<dyn OrderService>;

/// Start the HTTP server on the given address.
///
/// When `port` is 0, the OS assigns an ephemeral port. The actual bound
/// port is always logged so it can be discovered. Runs until `shutdown`
/// resolves.
pub async fn serve<F>(
    service: Arc<dyn OrderService>,
    host: &str,
    port: u16,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(service);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "HTTP API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(service: Arc<dyn OrderService>) -> Router {
    Router::new()
        .route("/api/order/{id}", get(get_order))
        .route("/api/order/", get(order_not_found))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_order(State(service): State<AppState>, Path(id): Path<String>) -> Response {
    match service.get_order(&id) {
        Ok(order) => Json(order).into_response(),
        Err(ServiceError::NotFound(_)) => {
            debug!(order_uid = %id, "Order not in cache");
            order_not_found().await.into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn order_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Order not found".to_string(),
        }),
    )
}

async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        cache_size: service.cache_size(),
    })
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    cache_size: usize,
}
