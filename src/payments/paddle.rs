//! Paddle webhook envelope, payload mapping, and signature verification.
//!
//! The mapper is the only place that knows Paddle's nested payload shapes.
//! It flattens them into the column-value structs the store consumes, and it
//! never fails: fields it cannot make sense of map to None.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::{
    NewSubscriptionItem, NewTransactionPayment, SubscriptionUpdate, TransactionUpdate,
};

type HmacSha256 = Hmac<Sha256>;

/// Timestamps more than this far in the future are treated as corrupt and
/// dropped rather than stored.
const MAX_FUTURE_TIMESTAMP_SECS: i64 = 86_400;

/// Top-level Paddle notification envelope.
#[derive(Debug, Deserialize)]
pub struct PaddleWebhookEvent {
    pub event_type: String,
    /// When the event occurred at the provider, ISO-8601.
    #[serde(default)]
    pub occurred_at: Option<String>,
    /// The entity payload for this event kind.
    #[serde(default)]
    pub data: Value,
}

impl PaddleWebhookEvent {
    /// True when the nested payload carries anything worth storing.
    pub fn has_data(&self) -> bool {
        self.data.as_object().map(|o| !o.is_empty()).unwrap_or(false)
    }
}

/// Parse a provider timestamp into unix seconds.
///
/// Empty strings, unparseable strings, and timestamps more than one day in
/// the future all map to None - a malformed payload must not pollute
/// scheduling-sensitive columns.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    let ts = DateTime::parse_from_rfc3339(raw).ok()?.timestamp();
    if ts > Utc::now().timestamp() + MAX_FUTURE_TIMESTAMP_SECS {
        return None;
    }
    Some(ts)
}

/// Flatten a `subscription.*` payload into column values.
pub fn map_subscription(data: &Value, occurred_at: Option<&str>) -> SubscriptionUpdate {
    SubscriptionUpdate {
        id: string_field(data, "id"),
        status: string_field(data, "status"),
        collection_mode: string_field(data, "collection_mode"),
        scheduled_change: json_field(data, "scheduled_change"),
        next_billed_at: string_field(data, "next_billed_at")
            .as_deref()
            .and_then(parse_timestamp),
        current_billing_period: json_field(data, "current_billing_period"),
        billing_details: json_field(data, "billing_details"),
        occurred_at: occurred_at.and_then(parse_timestamp),
        items: data
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(map_item).collect())
            .unwrap_or_default(),
    }
}

/// Flatten a `transaction.*` payload into column values.
pub fn map_transaction(data: &Value, occurred_at: Option<&str>) -> TransactionUpdate {
    TransactionUpdate {
        id: string_field(data, "id"),
        details_totals: data
            .get("details")
            .and_then(|d| d.get("totals"))
            .filter(|v| !v.is_null())
            .cloned(),
        occurred_at: occurred_at.and_then(parse_timestamp),
        payments: data
            .get("payments")
            .and_then(Value::as_array)
            .map(|payments| {
                payments
                    .iter()
                    .map(|p| NewTransactionPayment {
                        method_details: json_field(p, "method_details"),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Items without a price id or quantity are dropped - they cannot satisfy
/// the schema and a line item we cannot attribute to a price is useless.
fn map_item(item: &Value) -> Option<NewSubscriptionItem> {
    let price = item.get("price")?;
    Some(NewSubscriptionItem {
        price_id: price.get("id")?.as_str()?.to_string(),
        quantity: item.get("quantity")?.as_i64()?,
        product_id: string_field(price, "product_id"),
    })
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn json_field(data: &Value, key: &str) -> Option<Value> {
    data.get(key).filter(|v| !v.is_null()).cloned()
}

/// Verifier for Paddle webhook signatures.
#[derive(Debug, Clone)]
pub struct PaddleClient {
    webhook_secret: String,
}

impl PaddleClient {
    pub fn new(webhook_secret: &str) -> Self {
        Self {
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Maximum age of a webhook timestamp before it's rejected (in seconds).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    /// Verify a `Paddle-Signature` header against the raw request body.
    ///
    /// Paddle's format is `ts=<unix seconds>;h1=<hex hmac>` where the HMAC
    /// is computed over `"<ts>:<body>"`.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let mut timestamp = None;
        let mut sig_h1 = None;

        for part in signature.split(';') {
            if let Some(t) = part.strip_prefix("ts=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("h1=") {
                sig_h1 = Some(s);
            }
        }

        let timestamp_str = timestamp
            .ok_or_else(|| AppError::BadRequest("Invalid signature format".into()))?;
        let sig_h1 =
            sig_h1.ok_or_else(|| AppError::BadRequest("Invalid signature format".into()))?;

        // Parse and validate timestamp to prevent replay attacks.
        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid timestamp in signature".into()))?;

        let age = Utc::now().timestamp() - timestamp;

        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
            tracing::warn!(
                "Paddle webhook rejected: timestamp too old (age={}s, max={}s)",
                age,
                Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS
            );
            return Ok(false);
        }

        // Also reject timestamps from the future (clock skew tolerance: 60 seconds)
        if age < -60 {
            tracing::warn!("Paddle webhook rejected: timestamp in the future (age={}s)", age);
            return Ok(false);
        }

        let mut signed_payload = Vec::with_capacity(timestamp_str.len() + 1 + payload.len());
        signed_payload.extend_from_slice(timestamp_str.as_bytes());
        signed_payload.push(b':');
        signed_payload.extend_from_slice(payload);

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
        mac.update(&signed_payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison to prevent timing attacks. Length is not
        // secret (always 64 hex chars for SHA-256).
        let expected_bytes = expected.as_bytes();
        let provided_bytes = sig_h1.as_bytes();

        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}
