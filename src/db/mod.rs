mod from_row;
mod schema;
pub mod migrations;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and webhook configuration
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Paddle webhook secret; `None` disables signature verification.
    pub webhook_secret: Option<String>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Cascade deletes on subscription_items / transaction_payments rely on
    // foreign keys being enforced, which SQLite leaves off per connection.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::builder().max_size(10).build(manager)
}
