//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde_json::Value;

use crate::models::*;

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Read a TEXT column holding serialized JSON. Unparseable content maps to
/// None rather than failing the whole row.
fn json_column(row: &Row, col: usize) -> rusqlite::Result<Option<Value>> {
    Ok(row
        .get::<_, Option<String>>(col)?
        .and_then(|s| serde_json::from_str(&s).ok()))
}

// ============ SQL SELECT Constants ============

pub const SUBSCRIPTION_COLS: &str = "id, status, collection_mode, scheduled_change, next_billed_at, current_billing_period, billing_details, occurred_at, created_at, updated_at";

pub const SUBSCRIPTION_ITEM_COLS: &str = "id, subscription_id, price_id, quantity, product_id";

pub const TRANSACTION_COLS: &str = "id, details_totals, occurred_at, created_at, updated_at";

pub const TRANSACTION_PAYMENT_COLS: &str = "id, transaction_id, method_details";

// ============ FromRow Implementations ============

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            status: row.get(1)?,
            collection_mode: row.get(2)?,
            scheduled_change: json_column(row, 3)?,
            next_billed_at: row.get(4)?,
            current_billing_period: json_column(row, 5)?,
            billing_details: json_column(row, 6)?,
            occurred_at: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for SubscriptionItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(SubscriptionItem {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            price_id: row.get(2)?,
            quantity: row.get(3)?,
            product_id: row.get(4)?,
        })
    }
}

impl FromRow for BillingTransaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BillingTransaction {
            id: row.get(0)?,
            details_totals: json_column(row, 1)?,
            occurred_at: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for TransactionPayment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(TransactionPayment {
            id: row.get(0)?,
            transaction_id: row.get(1)?,
            method_details: json_column(row, 2)?,
        })
    }
}
