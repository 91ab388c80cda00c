//! HTTP transport — maps requests onto command dispatch.
//!
//! - `POST /:command` dispatches a command. Body = JSON input, request
//!   headers become the session (so `Authorization: Bearer ...` works).
//! - `GET /health` returns `{ "ok": true, "commands": [...] }`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::service::Service;
use super::session::Session;

pub fn router<R: Send + Sync + 'static>(service: Arc<Service<R>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:command", post(command))
        .with_state(service)
}

/// Serve the service at `addr` (e.g. `"0.0.0.0:3000"`) until the process exits.
pub async fn serve<R: Send + Sync + 'static>(
    service: Arc<Service<R>>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "http transport listening");
    axum::serve(listener, router(service)).await
}

async fn health<R: Send + Sync + 'static>(State(service): State<Arc<Service<R>>>) -> Json<Value> {
    Json(json!({ "ok": true, "commands": service.commands() }))
}

async fn command<R: Send + Sync + 'static>(
    State(service): State<Arc<Service<R>>>,
    Path(command): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    match service.dispatch(&command, input, session_from_headers(&headers)) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                warn!(command = %command, error = %e, "command failed");
            }
            (status, Json(json!({ "success": false, "error": e.to_string() }))).into_response()
        }
    }
}

fn session_from_headers(headers: &HeaderMap) -> Session {
    let vars: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Session::from_map(vars)
}
