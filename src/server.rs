//! HTTP boundary for the content access layer (`stickers serve`).
//!
//! `GET /{uri}` is dispatched to [`ContentProvider::dispatch`]. The calling
//! package is taken from the `x-caller-package` header. Tables are returned
//! as JSON `{columns, rows}`, assets as raw bytes with their MIME type.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info, warn};

use crate::content::{ContentError, ContentProvider, ContentResponse};
use crate::error::{Result, StickerError};

/// Header carrying the caller's package name.
pub const CALLER_HEADER: &str = "x-caller-package";

/// Build the application router.
pub fn router(provider: Arc<ContentProvider>, timeout: Duration) -> Router {
    Router::new()
        .route("/{*uri}", get(handle_content))
        .layer(timeout_layer(timeout))
        .layer(CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any))
        .with_state(provider)
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Serve until Ctrl-C.
pub async fn serve(provider: Arc<ContentProvider>, addr: SocketAddr, timeout: Duration) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StickerError::WebServerFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
    let local = listener.local_addr().unwrap_or(addr);
    info!(addr = %local, authority = provider.authority(), "Content server listening");

    axum::serve(listener, router(provider, timeout))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StickerError::WebServerFailed {
            addr: local.to_string(),
            reason: e.to_string(),
        })?;
    info!("Content server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn handle_content(
    State(provider): State<Arc<ContentProvider>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let caller = headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let path = uri.path().to_string();
    debug!(path = %path, caller = ?caller, "Content request");

    // The provider does blocking file and SQLite work.
    let dispatched =
        tokio::task::spawn_blocking(move || provider.dispatch(&path, caller.as_deref())).await;

    match dispatched {
        Ok(Ok(ContentResponse::Table(table))) => Json(table).into_response(),
        Ok(Ok(ContentResponse::Asset(asset))) => match tokio::fs::read(&asset.path).await {
            Ok(bytes) => ([(CONTENT_TYPE, asset.mime_type)], bytes).into_response(),
            Err(e) => {
                warn!(path = %asset.path.display(), error = %e, "Asset vanished before read");
                error_body(StatusCode::NOT_FOUND, "not_found", "asset not found")
            }
        },
        Ok(Ok(ContentResponse::NotFound)) => {
            error_body(StatusCode::NOT_FOUND, "not_found", "asset not found")
        }
        Ok(Err(e)) => content_error(&e),
        Err(e) => {
            error!(error = %e, "Content handler panicked");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal", "handler failed")
        }
    }
}

/// HTTP status and error kind for a content fault.
pub fn status_for(err: &ContentError) -> (StatusCode, &'static str) {
    match err {
        ContentError::UnknownResource(_) => (StatusCode::NOT_FOUND, "unknown_resource"),
        ContentError::MalformedPath { .. } => (StatusCode::BAD_REQUEST, "malformed_path"),
        ContentError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "access_denied"),
        ContentError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
    }
}

fn content_error(err: &ContentError) -> Response {
    let (status, kind) = status_for(err);
    if status.is_server_error() {
        error!(error = %err, "Content request failed");
    } else {
        debug!(error = %err, kind, "Content request rejected");
    }
    error_body(status, kind, &err.to_string())
}

fn error_body(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({ "error": kind, "message": message }))).into_response()
}
