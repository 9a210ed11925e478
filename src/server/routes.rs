// src/server/routes.rs

//! Axum router for the local registry server

use crate::registry::{
    IMMUTABLE_CACHE_CONTROL, INDEX_CACHE_CONTROL, INDEX_FILE_NAME, PUBLIC_KEY_FILE_NAME,
};
use crate::server::ServerState;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the router serving `state.root`
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(root_redirect))
        .fallback(serve_file)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn root_redirect() -> Redirect {
    Redirect::to(&format!("/{}", INDEX_FILE_NAME))
}

/// Relative file path for a request path, or `None` if it tries to escape
fn sanitize_path(path: &str) -> Option<String> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() || relative.contains('\\') || relative.contains('\0') {
        return None;
    }
    let clean = relative
        .split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('%'));
    clean.then(|| relative.to_string())
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        Some("pem") => "application/x-pem-file",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("php") | Some("md") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn cache_control_for(path: &str) -> &'static str {
    if path == INDEX_FILE_NAME {
        INDEX_CACHE_CONTROL
    } else if path.starts_with("components/") || path == PUBLIC_KEY_FILE_NAME {
        IMMUTABLE_CACHE_CONTROL
    } else {
        "no-cache"
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Any other path: a file below the registry root
async fn serve_file(State(state): State<Arc<ServerState>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    }

    let Some(relative) = sanitize_path(uri.path()) else {
        tracing::warn!("Rejected path {}", uri.path());
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    };

    let path = state.root.join(&relative);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return not_found(),
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type_for(&relative))
                .header(header::CACHE_CONTROL, cache_control_for(&relative))
                .body(Body::from(bytes))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
        }
    }
}
