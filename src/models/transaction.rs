use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Paddle transaction, keyed by the provider-issued transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingTransaction {
    pub id: String,
    /// The `details.totals` breakdown from the provider, stored as raw JSON.
    pub details_totals: Option<Value>,
    /// Unix seconds, from the notification's `occurred_at`.
    pub occurred_at: Option<i64>,
    /// Bookkeeping timestamps in unix nanoseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

/// A payment record owned by a transaction. Replaced wholesale on every
/// upsert of the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPayment {
    pub id: String,
    pub transaction_id: String,
    pub method_details: Option<Value>,
}

/// Flat column values extracted from a transaction webhook payload.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub id: Option<String>,
    pub details_totals: Option<Value>,
    pub occurred_at: Option<i64>,
    pub payments: Vec<NewTransactionPayment>,
}

/// An incoming payment record, before it is assigned a row id.
#[derive(Debug, Clone)]
pub struct NewTransactionPayment {
    pub method_details: Option<Value>,
}
