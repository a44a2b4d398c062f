pub mod paddle;

pub use paddle::handle_paddle_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/billing", post(handle_paddle_webhook))
}
