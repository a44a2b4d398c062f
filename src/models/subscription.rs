use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Paddle subscription, keyed by the provider-issued subscription id.
///
/// Nested provider structures (scheduled_change, current_billing_period,
/// billing_details) are stored as raw JSON - their shape belongs to Paddle,
/// not to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: Option<String>,
    pub collection_mode: Option<String>,
    pub scheduled_change: Option<Value>,
    /// Unix seconds, from the provider's ISO-8601 `next_billed_at`.
    pub next_billed_at: Option<i64>,
    pub current_billing_period: Option<Value>,
    pub billing_details: Option<Value>,
    /// Unix seconds, from the notification's `occurred_at`.
    pub occurred_at: Option<i64>,
    /// Bookkeeping timestamps in unix nanoseconds. `created_at` is set once
    /// at first insert and never changes; `updated_at` is refreshed on every
    /// write.
    pub created_at: i64,
    pub updated_at: i64,
}

/// A line item owned by a subscription. The full item set is replaced on
/// every upsert of the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub subscription_id: String,
    pub price_id: String,
    pub quantity: i64,
    pub product_id: Option<String>,
}

/// Flat column values extracted from a subscription webhook payload.
/// `id: None` means the event carried no subscription id and must be ignored.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub id: Option<String>,
    pub status: Option<String>,
    pub collection_mode: Option<String>,
    pub scheduled_change: Option<Value>,
    pub next_billed_at: Option<i64>,
    pub current_billing_period: Option<Value>,
    pub billing_details: Option<Value>,
    pub occurred_at: Option<i64>,
    pub items: Vec<NewSubscriptionItem>,
}

/// An incoming line item, before it is assigned a row id.
#[derive(Debug, Clone)]
pub struct NewSubscriptionItem {
    pub price_id: String,
    pub quantity: i64,
    pub product_id: Option<String>,
}
