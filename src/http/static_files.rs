//! Static asset serving for the Supervisor dashboard (§4.4), grounded in
//! the original monitor's `_serve_static`: path-traversal guard by
//! canonicalizing and checking the result stays under the asset root.

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use super::state::AppState;

pub async fn serve(State(state): State<AppState>, uri: Uri) -> Response {
    let requested = uri.path().trim_start_matches('/');
    let requested = if requested.is_empty() { "index.html" } else { requested };

    let candidate = state.0.asset_root.join(requested);
    let Ok(resolved) = candidate.canonicalize() else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    let Ok(root) = state.0.asset_root.canonicalize() else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    if !resolved.starts_with(&root) {
        return (StatusCode::FORBIDDEN, "forbidden").into_response();
    }
    if !resolved.is_file() {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    let Ok(bytes) = tokio::fs::read(&resolved).await else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    let content_type = content_type_for(&resolved);
    ([(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, "no-cache")], bytes).into_response()
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(std::ffi::OsStr::to_str) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
