//! Store-level tests for subscription and transaction upserts

mod common;

use common::*;
use serde_json::json;

fn sample_subscription_update(id: &str) -> SubscriptionUpdate {
    SubscriptionUpdate {
        id: Some(id.to_string()),
        status: Some("active".to_string()),
        collection_mode: Some("automatic".to_string()),
        scheduled_change: Some(json!({"action": "cancel", "effective_at": "2025-01-01T00:00:00Z"})),
        next_billed_at: Some(1_735_689_600),
        current_billing_period: Some(json!({"starts_at": "a", "ends_at": "b"})),
        billing_details: None,
        occurred_at: Some(1_712_917_127),
        items: vec![NewSubscriptionItem {
            price_id: "pri_1".to_string(),
            quantity: 2,
            product_id: Some("pro_1".to_string()),
        }],
    }
}

// ============ Subscription Upserts ============

#[test]
fn test_upsert_subscription_creates_row_and_items() {
    let mut conn = setup_test_db();

    let outcome = queries::upsert_subscription(&mut conn, &sample_subscription_update("sub_1"))
        .expect("Upsert should succeed");

    let sub = outcome.applied().expect("Outcome should be Applied");
    assert_eq!(sub.id, "sub_1");
    assert_eq!(sub.status.as_deref(), Some("active"));
    assert_eq!(sub.next_billed_at, Some(1_735_689_600));
    assert!(sub.created_at > 0);
    assert_eq!(sub.created_at, sub.updated_at);

    let items = queries::list_subscription_items(&conn, "sub_1").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price_id, "pri_1");
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].product_id.as_deref(), Some("pro_1"));
}

#[test]
fn test_upsert_subscription_overwrites_fields() {
    let mut conn = setup_test_db();

    queries::upsert_subscription(&mut conn, &sample_subscription_update("sub_1")).unwrap();
    let first = queries::get_subscription(&conn, "sub_1").unwrap().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(10));

    // Second event for the same id: some fields changed, some now absent
    let second_update = SubscriptionUpdate {
        id: Some("sub_1".to_string()),
        status: Some("canceled".to_string()),
        ..Default::default()
    };
    queries::upsert_subscription(&mut conn, &second_update).unwrap();

    let second = queries::get_subscription(&conn, "sub_1").unwrap().unwrap();
    assert_eq!(second.status.as_deref(), Some("canceled"));
    // Absent fields are overwritten to NULL, not preserved
    assert!(second.collection_mode.is_none());
    assert!(second.scheduled_change.is_none());
    assert!(second.next_billed_at.is_none());
    // created_at survives, updated_at advances
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
}

#[test]
fn test_upsert_subscription_replaces_items() {
    let mut conn = setup_test_db();

    let mut update = sample_subscription_update("sub_1");
    update.items = vec![
        NewSubscriptionItem {
            price_id: "pri_1".to_string(),
            quantity: 1,
            product_id: None,
        },
        NewSubscriptionItem {
            price_id: "pri_2".to_string(),
            quantity: 3,
            product_id: None,
        },
        NewSubscriptionItem {
            price_id: "pri_3".to_string(),
            quantity: 1,
            product_id: None,
        },
    ];
    queries::upsert_subscription(&mut conn, &update).unwrap();
    assert_eq!(queries::list_subscription_items(&conn, "sub_1").unwrap().len(), 3);

    update.items = vec![NewSubscriptionItem {
        price_id: "pri_9".to_string(),
        quantity: 5,
        product_id: None,
    }];
    queries::upsert_subscription(&mut conn, &update).unwrap();

    // Replaced wholesale, never merged
    let items = queries::list_subscription_items(&conn, "sub_1").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price_id, "pri_9");
    assert_eq!(items[0].quantity, 5);
}

#[test]
fn test_upsert_subscription_without_id_is_ignored() {
    let mut conn = setup_test_db();

    let update = SubscriptionUpdate {
        status: Some("active".to_string()),
        ..Default::default()
    };
    let outcome = queries::upsert_subscription(&mut conn, &update).unwrap();
    assert!(outcome.is_ignored());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM subscriptions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_upsert_subscription_empty_id_is_ignored() {
    let mut conn = setup_test_db();

    let update = SubscriptionUpdate {
        id: Some(String::new()),
        ..Default::default()
    };
    let outcome = queries::upsert_subscription(&mut conn, &update).unwrap();
    assert!(outcome.is_ignored());
}

#[test]
fn test_delete_subscription_removes_items() {
    let mut conn = setup_test_db();

    queries::upsert_subscription(&mut conn, &sample_subscription_update("sub_1")).unwrap();

    let deleted = queries::delete_subscription(&mut conn, "sub_1").unwrap();
    assert!(deleted);

    assert!(queries::get_subscription(&conn, "sub_1").unwrap().is_none());
    assert!(queries::list_subscription_items(&conn, "sub_1").unwrap().is_empty());
}

#[test]
fn test_delete_subscription_missing_id_is_noop() {
    let mut conn = setup_test_db();

    let deleted = queries::delete_subscription(&mut conn, "sub_never_seen").unwrap();
    assert!(!deleted);
}

#[test]
fn test_get_subscription_missing_returns_none() {
    let conn = setup_test_db();
    assert!(queries::get_subscription(&conn, "sub_missing").unwrap().is_none());
}

// ============ Transaction Upserts ============

fn sample_transaction_update(id: &str) -> TransactionUpdate {
    TransactionUpdate {
        id: Some(id.to_string()),
        details_totals: Some(json!({"subtotal": "900", "tax": "100", "total": "1000"})),
        occurred_at: Some(1_712_917_127),
        payments: vec![NewTransactionPayment {
            method_details: Some(json!({"type": "card", "card": {"last4": "4242"}})),
        }],
    }
}

#[test]
fn test_upsert_transaction_creates_row_and_payments() {
    let mut conn = setup_test_db();

    let outcome = queries::upsert_transaction(&mut conn, &sample_transaction_update("txn_1"))
        .expect("Upsert should succeed");

    let txn = outcome.applied().expect("Outcome should be Applied");
    assert_eq!(txn.id, "txn_1");
    assert_eq!(
        txn.details_totals,
        Some(json!({"subtotal": "900", "tax": "100", "total": "1000"}))
    );

    let payments = queries::list_transaction_payments(&conn, "txn_1").unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(
        payments[0].method_details,
        Some(json!({"type": "card", "card": {"last4": "4242"}}))
    );
}

#[test]
fn test_upsert_transaction_overwrites_and_replaces_payments() {
    let mut conn = setup_test_db();

    queries::upsert_transaction(&mut conn, &sample_transaction_update("txn_1")).unwrap();
    let first = queries::get_transaction(&conn, "txn_1").unwrap().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(10));

    let second_update = TransactionUpdate {
        id: Some("txn_1".to_string()),
        details_totals: Some(json!({"total": "2000"})),
        occurred_at: None,
        payments: vec![
            NewTransactionPayment { method_details: None },
            NewTransactionPayment {
                method_details: Some(json!({"type": "paypal"})),
            },
        ],
    };
    queries::upsert_transaction(&mut conn, &second_update).unwrap();

    let second = queries::get_transaction(&conn, "txn_1").unwrap().unwrap();
    assert_eq!(second.details_totals, Some(json!({"total": "2000"})));
    assert!(second.occurred_at.is_none());
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);

    let payments = queries::list_transaction_payments(&conn, "txn_1").unwrap();
    assert_eq!(payments.len(), 2);
}

#[test]
fn test_upsert_transaction_without_id_is_ignored() {
    let mut conn = setup_test_db();

    let update = TransactionUpdate {
        details_totals: Some(json!({"total": "100"})),
        ..Default::default()
    };
    let outcome = queries::upsert_transaction(&mut conn, &update).unwrap();
    assert!(outcome.is_ignored());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_delete_transaction_removes_payments() {
    let mut conn = setup_test_db();

    queries::upsert_transaction(&mut conn, &sample_transaction_update("txn_1")).unwrap();

    let deleted = queries::delete_transaction(&mut conn, "txn_1").unwrap();
    assert!(deleted);

    assert!(queries::get_transaction(&conn, "txn_1").unwrap().is_none());
    assert!(queries::list_transaction_payments(&conn, "txn_1").unwrap().is_empty());
}

#[test]
fn test_delete_transaction_missing_id_is_noop() {
    let mut conn = setup_test_db();
    assert!(!queries::delete_transaction(&mut conn, "txn_never_seen").unwrap());
}

#[test]
fn test_subscription_and_transaction_tables_are_independent() {
    let mut conn = setup_test_db();

    // Same provider id in both tables is fine, they are separate entities
    queries::upsert_subscription(&mut conn, &sample_subscription_update("shared_id")).unwrap();
    queries::upsert_transaction(&mut conn, &sample_transaction_update("shared_id")).unwrap();

    queries::delete_subscription(&mut conn, "shared_id").unwrap();
    assert!(queries::get_transaction(&conn, "shared_id").unwrap().is_some());
}
