use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::db::{queries, AppState};
use crate::models::UpsertOutcome;
use crate::payments::paddle::{map_subscription, map_transaction};
use crate::payments::{PaddleClient, PaddleWebhookEvent};

/// Receive a Paddle billing notification.
///
/// The contract with Paddle is: 200 means "stop retrying", anything else
/// means "retry later". Events we don't recognize or can't attribute to an
/// entity are acknowledged with 200 so they are not redelivered forever;
/// only malformed requests (400/401) and storage failures (500) are refused.
pub async fn handle_paddle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // Signature verification runs only when a secret is configured. Without
    // one the endpoint trusts its network boundary.
    if let Some(secret) = &state.webhook_secret {
        let signature = match headers.get("paddle-signature") {
            Some(sig) => match sig.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => return (StatusCode::BAD_REQUEST, "Invalid signature header"),
            },
            None => return (StatusCode::BAD_REQUEST, "Missing Paddle-Signature header"),
        };

        let client = PaddleClient::new(secret);
        match client.verify_webhook_signature(&body, &signature) {
            Ok(true) => {}
            Ok(false) => return (StatusCode::UNAUTHORIZED, "Invalid signature"),
            Err(e) => {
                tracing::warn!("Signature verification error: {}", e);
                return (StatusCode::BAD_REQUEST, "Invalid signature header");
            }
        }
    }

    let event: PaddleWebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to parse Paddle webhook: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    if !event.has_data() {
        tracing::warn!("Paddle event {} carried no data, ignoring", event.event_type);
        return (StatusCode::OK, "Event ignored");
    }

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let occurred_at = event.occurred_at.as_deref();

    let outcome = match event.event_type.as_str() {
        "subscription.created" | "subscription.updated" => {
            let update = map_subscription(&event.data, occurred_at);
            queries::upsert_subscription(&mut conn, &update).map(|o| o.map(|row| row.id))
        }
        "transaction.created" | "transaction.updated" => {
            let update = map_transaction(&event.data, occurred_at);
            queries::upsert_transaction(&mut conn, &update).map(|o| o.map(|row| row.id))
        }
        other => {
            tracing::debug!("Unhandled Paddle event type: {}", other);
            return (StatusCode::OK, "Event ignored");
        }
    };

    match outcome {
        Ok(UpsertOutcome::Applied(id)) => {
            tracing::info!("Stored {} from {}", id, event.event_type);
            (StatusCode::OK, "OK")
        }
        Ok(UpsertOutcome::Ignored) => {
            tracing::warn!("Paddle event {} had no entity id, ignoring", event.event_type);
            (StatusCode::OK, "Event ignored")
        }
        Err(e) => {
            tracing::error!("Failed to store {} event: {}", event.event_type, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
