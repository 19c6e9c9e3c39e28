//! Database layer shared by the Medley backends.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode
//! initialization, and embedded SQL migrations. Each backend owns a
//! separate database file and a separate migration set; the runner and
//! the pool settings are common.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: each backend is a single-process service
//!   with no external database dependency. WAL allows concurrent readers
//!   with a single writer, which matches the request pattern.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so schema and code cannot drift apart.

mod migrations;
mod pool;

pub use migrations::{
    run_menu_migrations, run_trivia_migrations, run_venues_migrations, MigrationError,
};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
