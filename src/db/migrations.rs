//! Database migration system for Billhook.
//!
//! Migrations are embedded in the binary and run automatically on startup.
//! The database tracks its version via `PRAGMA user_version`. A file backup
//! is taken before applying pending migrations; restoring that backup is the
//! rollback path.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

/// A database migration.
pub struct Migration {
    /// Version number (sequential, starting from 1).
    pub version: i32,
    /// Human-readable description (include app version for traceability).
    pub description: &'static str,
    /// The migration function.
    pub up: fn(&Connection) -> rusqlite::Result<()>,
}

/// All migrations in order.
/// Add new migrations to the end of this list.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "v0.1.0 billing tables baseline",
    up: migration_001_baseline,
}];

/// Migration errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to create backup at {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Migration {version} failed: {message}. Backup at: {backup_path}")]
    MigrationFailed {
        version: i32,
        message: String,
        backup_path: PathBuf,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Get the current schema version from the database.
pub fn get_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}

/// Create a backup of the database file before migration.
fn backup_database(db_path: &str, from_version: i32) -> Result<PathBuf, MigrationError> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let backup_path = PathBuf::from(format!("{}.backup_v{}_{}", db_path, from_version, timestamp));

    fs::copy(db_path, &backup_path).map_err(|e| MigrationError::BackupFailed {
        path: backup_path.clone(),
        source: e,
    })?;

    Ok(backup_path)
}

/// Clean up old backups, keeping only the most recent `keep_count`.
/// If `keep_count` is -1, keeps all backups. If 0, no backups were created.
fn cleanup_old_backups(db_path: &str, keep_count: i32) -> Result<(), std::io::Error> {
    if keep_count < 1 {
        return Ok(()); // -1 = keep all, 0 = no backups were created
    }
    let keep_count = keep_count as usize;

    let db_path = Path::new(db_path);
    let parent = db_path.parent().unwrap_or(Path::new("."));
    let db_name = db_path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let mut backups: Vec<_> = fs::read_dir(parent)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(&format!("{}.backup_v", db_name)))
                .unwrap_or(false)
        })
        .collect();

    if backups.len() <= keep_count {
        return Ok(());
    }

    // Sort by modification time (oldest first)
    backups.sort_by_key(|entry| {
        entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let to_remove = backups.len() - keep_count;
    for entry in backups.into_iter().take(to_remove) {
        tracing::info!("Removing old backup: {}", entry.path().display());
        fs::remove_file(entry.path())?;
    }

    Ok(())
}

/// Run pending migrations.
///
/// - Checks current version via `PRAGMA user_version`
/// - Creates a backup before applying any migrations (unless `backup_keep_count` is 0)
/// - Runs each pending migration in its own transaction
/// - Cleans up old backups based on `backup_keep_count` (-1 = keep all)
pub fn run_migrations(
    conn: &mut Connection,
    db_path: &str,
    backup_keep_count: i32,
) -> Result<(), MigrationError> {
    let current_version = get_version(conn)?;

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        tracing::debug!("Database at version {} (up to date)", current_version);
        return Ok(());
    }

    tracing::info!(
        "Database at version {}, {} migration(s) pending",
        current_version,
        pending.len()
    );

    // Backup before any changes (unless disabled with 0 or fresh database)
    let backup_path = if backup_keep_count == 0 {
        tracing::warn!("Migration backups disabled (MIGRATION_BACKUP_COUNT=0)");
        None
    } else if current_version == 0 {
        // Fresh database - nothing to backup
        tracing::debug!("Fresh database (version 0), skipping backup");
        None
    } else {
        let path = backup_database(db_path, current_version)?;
        tracing::info!("Backup created: {}", path.display());
        Some(path)
    };

    // Run each migration in its own transaction
    for migration in pending {
        tracing::info!(
            "Running migration {}: {}",
            migration.version,
            migration.description
        );

        let tx = conn.transaction()?;

        match (migration.up)(&tx) {
            Ok(()) => {
                set_version(&tx, migration.version)?;
                tx.commit()?;
                tracing::info!("Migration {} completed", migration.version);
            }
            Err(e) => {
                // Transaction auto-rolls back on drop
                if let Some(ref path) = backup_path {
                    tracing::error!(
                        "Migration {} failed: {}. Database unchanged. Backup at: {}",
                        migration.version,
                        e,
                        path.display()
                    );
                } else {
                    tracing::error!(
                        "Migration {} failed: {}. Database unchanged. No backup available!",
                        migration.version,
                        e
                    );
                }
                return Err(MigrationError::MigrationFailed {
                    version: migration.version,
                    message: e.to_string(),
                    backup_path: backup_path.unwrap_or_default(),
                });
            }
        }
    }

    if let Err(e) = cleanup_old_backups(db_path, backup_keep_count) {
        tracing::warn!("Failed to clean up old backups: {}", e);
        // Non-fatal, continue
    }

    Ok(())
}

// ============================================================================
// Migration Functions
// ============================================================================

/// Migration 1: v0.1.0 baseline.
///
/// For existing databases this is a no-op since tables already exist. For
/// fresh databases the full schema is created by `init_db`, which runs after
/// migrations.
fn migration_001_baseline(conn: &Connection) -> rusqlite::Result<()> {
    let tables_exist: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='subscriptions'",
        [],
        |row| row.get(0),
    )?;

    if tables_exist {
        tracing::debug!("Existing database detected, baseline migration is no-op");
        return Ok(());
    }

    tracing::debug!("Fresh database, schema will be created by init_db");
    Ok(())
}
