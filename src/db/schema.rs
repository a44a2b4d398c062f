use rusqlite::Connection;

/// Initialize the billing schema.
///
/// Nested provider structures are TEXT columns holding serialized JSON;
/// provider timestamps are unix seconds, bookkeeping timestamps are unix
/// nanoseconds (monotonic enough to tell consecutive writes apart).
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Subscriptions (id = subscription id issued by Paddle)
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            status TEXT,
            collection_mode TEXT,
            scheduled_change TEXT,
            next_billed_at INTEGER,
            current_billing_period TEXT,
            billing_details TEXT,
            occurred_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Line items, replaced wholesale on every subscription upsert
        CREATE TABLE IF NOT EXISTS subscription_items (
            id TEXT PRIMARY KEY,
            subscription_id TEXT NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
            price_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            product_id TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_subscription_items_subscription
            ON subscription_items(subscription_id);

        -- Transactions (id = transaction id issued by Paddle)
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            details_totals TEXT,
            occurred_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Payment records, replaced wholesale on every transaction upsert
        CREATE TABLE IF NOT EXISTS transaction_payments (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
            method_details TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_transaction_payments_transaction
            ON transaction_payments(transaction_id);
        "#,
    )?;
    Ok(())
}
