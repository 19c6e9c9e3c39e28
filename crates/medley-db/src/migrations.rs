//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run
//! sequentially on startup, tracked by the `_medley_migrations` table.
//! Each migration runs exactly once — if it has already been applied, it
//! is skipped. Every backend has its own migration set; since each
//! backend also has its own database file, the sets never collide.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Migrations for the venues backend. New migrations are appended here.
const VENUES_MIGRATIONS: &[Migration] = &[Migration {
    name: "000_venues_init",
    sql: include_str!("migrations/venues/000_init.sql"),
}];

/// Migrations for the trivia backend.
const TRIVIA_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_trivia_init",
        sql: include_str!("migrations/trivia/000_init.sql"),
    },
    Migration {
        name: "001_trivia_categories_seed",
        sql: include_str!("migrations/trivia/001_categories_seed.sql"),
    },
];

/// Migrations for the menu backend.
const MENU_MIGRATIONS: &[Migration] = &[Migration {
    name: "000_menu_init",
    sql: include_str!("migrations/menu/000_init.sql"),
}];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending venues migrations against the given connection.
pub fn run_venues_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, VENUES_MIGRATIONS)
}

/// Runs all pending trivia migrations against the given connection.
pub fn run_trivia_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, TRIVIA_MIGRATIONS)
}

/// Runs all pending menu migrations against the given connection.
pub fn run_menu_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MENU_MIGRATIONS)
}

/// Applies every migration in `migrations` that has not yet been recorded.
///
/// Migrations that have already been applied (tracked in
/// `_medley_migrations`) are skipped. New migrations are applied in order
/// inside a transaction and recorded together with their schema changes.
fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    // Ensure the tracking table exists before checking what's been applied.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _medley_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_medley_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _medley_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| MigrationError::ExecutionFailed {
                name: migration.name.to_string(),
                source: e,
            })?;

        tx.execute_batch(migration.sql)
            .map_err(|e| MigrationError::ExecutionFailed {
                name: migration.name.to_string(),
                source: e,
            })?;

        tx.execute(
            "INSERT INTO _medley_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(|e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        })?;

        tx.commit().map_err(|e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        })?;

        applied += 1;
    }

    Ok(applied)
}
