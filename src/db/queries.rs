use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    query_all, query_one, SUBSCRIPTION_COLS, SUBSCRIPTION_ITEM_COLS, TRANSACTION_COLS,
    TRANSACTION_PAYMENT_COLS,
};

/// Bookkeeping timestamps in unix nanoseconds, so consecutive writes to the
/// same row get distinguishable `updated_at` values. The Option is only None
/// for dates past the year 2262.
fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Serialize a JSON column value for storage. None stores SQL NULL.
fn json_text(value: &Option<Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

// ============ Subscriptions ============

/// Upsert a subscription and replace its line items, as one transaction.
///
/// Field semantics are overwrite-with-latest-payload: every column is set
/// from the update, including columns the payload omitted (which arrive here
/// as None). `created_at` is set once at first insert and never touched
/// again. The parent write, the child delete, and the child inserts either
/// all commit or all roll back.
pub fn upsert_subscription(
    conn: &mut Connection,
    update: &SubscriptionUpdate,
) -> Result<UpsertOutcome<Subscription>> {
    let Some(id) = update.id.as_deref().filter(|id| !id.is_empty()) else {
        return Ok(UpsertOutcome::Ignored);
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = now_ns();

    let exists: bool = tx
        .query_row(
            "SELECT COUNT(*) > 0 FROM subscriptions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

    if exists {
        tx.execute(
            "UPDATE subscriptions
             SET status = ?2, collection_mode = ?3, scheduled_change = ?4,
                 next_billed_at = ?5, current_billing_period = ?6,
                 billing_details = ?7, occurred_at = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                &update.status,
                &update.collection_mode,
                json_text(&update.scheduled_change),
                update.next_billed_at,
                json_text(&update.current_billing_period),
                json_text(&update.billing_details),
                update.occurred_at,
                now,
            ],
        )?;
    } else {
        tx.execute(
            "INSERT INTO subscriptions (id, status, collection_mode, scheduled_change,
                 next_billed_at, current_billing_period, billing_details, occurred_at,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id,
                &update.status,
                &update.collection_mode,
                json_text(&update.scheduled_change),
                update.next_billed_at,
                json_text(&update.current_billing_period),
                json_text(&update.billing_details),
                update.occurred_at,
                now,
            ],
        )?;
    }

    // Replace-all: the child set always mirrors the latest event, never a
    // merge of old and new items.
    tx.execute(
        "DELETE FROM subscription_items WHERE subscription_id = ?1",
        params![id],
    )?;
    for item in &update.items {
        tx.execute(
            "INSERT INTO subscription_items (id, subscription_id, price_id, quantity, product_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![gen_id(), id, &item.price_id, item.quantity, &item.product_id],
        )?;
    }

    let row: Subscription = query_one(
        &tx,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )?
    .ok_or_else(|| AppError::Internal(format!("subscription {} vanished mid-upsert", id)))?;

    tx.commit()?;
    Ok(UpsertOutcome::Applied(row))
}

pub fn get_subscription(conn: &Connection, id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )
}

pub fn list_subscription_items(conn: &Connection, subscription_id: &str) -> Result<Vec<SubscriptionItem>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM subscription_items WHERE subscription_id = ?1",
            SUBSCRIPTION_ITEM_COLS
        ),
        &[&subscription_id],
    )
}

/// Administrative delete: children then parent, one transaction.
/// Idempotent - deleting an id that was never seen returns Ok(false).
pub fn delete_subscription(conn: &mut Connection, id: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM subscription_items WHERE subscription_id = ?1",
        params![id],
    )?;
    let deleted = tx.execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

// ============ Transactions ============

/// Upsert a transaction and replace its payment records. Same contract as
/// `upsert_subscription`.
pub fn upsert_transaction(
    conn: &mut Connection,
    update: &TransactionUpdate,
) -> Result<UpsertOutcome<BillingTransaction>> {
    let Some(id) = update.id.as_deref().filter(|id| !id.is_empty()) else {
        return Ok(UpsertOutcome::Ignored);
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = now_ns();

    let exists: bool = tx
        .query_row(
            "SELECT COUNT(*) > 0 FROM transactions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

    if exists {
        tx.execute(
            "UPDATE transactions SET details_totals = ?2, occurred_at = ?3, updated_at = ?4
             WHERE id = ?1",
            params![id, json_text(&update.details_totals), update.occurred_at, now],
        )?;
    } else {
        tx.execute(
            "INSERT INTO transactions (id, details_totals, occurred_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id, json_text(&update.details_totals), update.occurred_at, now],
        )?;
    }

    tx.execute(
        "DELETE FROM transaction_payments WHERE transaction_id = ?1",
        params![id],
    )?;
    for payment in &update.payments {
        tx.execute(
            "INSERT INTO transaction_payments (id, transaction_id, method_details)
             VALUES (?1, ?2, ?3)",
            params![gen_id(), id, json_text(&payment.method_details)],
        )?;
    }

    let row: BillingTransaction = query_one(
        &tx,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )?
    .ok_or_else(|| AppError::Internal(format!("transaction {} vanished mid-upsert", id)))?;

    tx.commit()?;
    Ok(UpsertOutcome::Applied(row))
}

pub fn get_transaction(conn: &Connection, id: &str) -> Result<Option<BillingTransaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

pub fn list_transaction_payments(
    conn: &Connection,
    transaction_id: &str,
) -> Result<Vec<TransactionPayment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM transaction_payments WHERE transaction_id = ?1",
            TRANSACTION_PAYMENT_COLS
        ),
        &[&transaction_id],
    )
}

/// Administrative delete: payments then transaction, one transaction.
/// Idempotent like `delete_subscription`.
pub fn delete_transaction(conn: &mut Connection, id: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM transaction_payments WHERE transaction_id = ?1",
        params![id],
    )?;
    let deleted = tx.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}
