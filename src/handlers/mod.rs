pub mod webhooks;

use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
