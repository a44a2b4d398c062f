//! Test utilities and fixtures for Billhook integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use billhook::db::{init_db, queries, AppState, DbPool};
pub use billhook::models::*;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    conn.pragma_update(None, "foreign_keys", "ON")
        .expect("Failed to enable foreign keys");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a pooled in-memory database for handler tests.
///
/// Pool size is pinned to 1 so every checkout sees the same in-memory
/// database (each in-memory connection is otherwise its own database).
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.pragma_update(None, "foreign_keys", "ON"));
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().expect("Failed to get test connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    pool
}

/// App state with signature verification disabled
pub fn create_test_app_state() -> AppState {
    AppState {
        db: setup_test_pool(),
        webhook_secret: None,
    }
}

/// App state with a configured webhook secret
pub fn create_test_app_state_with_secret(secret: &str) -> AppState {
    AppState {
        db: setup_test_pool(),
        webhook_secret: Some(secret.to_string()),
    }
}

/// Build the webhook router wired to the given state
pub fn webhook_app(state: AppState) -> Router {
    billhook::handlers::webhooks::router().with_state(state)
}
