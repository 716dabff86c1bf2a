//! # Schema Migrations
//!
//! Embedded SQL migrations for the ledger schema.
//!
//! The full schema (registry tables, sale and collection ledgers, the
//! commissions table, and the `ledger_counters` rows backing V/C code
//! assignment) ships inside the binary. A fresh database file is fully
//! usable after [`run_migrations`] returns.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database::new()                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run_migrations(pool)                                                   │
//! │       │                                                                 │
//! │       ├── first run:  create _sqlx_migrations, apply everything         │
//! │       └── later runs: apply only versions not yet recorded              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Schema at latest version, counters seeded                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding a Migration
//!
//! Drop a new `NNN_description.sql` file into `migrations/sqlite/` with the
//! next sequence number. Applied migrations are checksummed, so editing an
//! existing file after release will fail verification; always add, never
//! rewrite.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations compiled in from `migrations/sqlite/` at build time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to the latest embedded version.
///
/// Idempotent: versions already recorded in `_sqlx_migrations` are skipped,
/// and each pending migration runs inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Applying pending schema migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("Schema is up to date");
    Ok(())
}

/// Reports `(embedded, applied)` migration counts.
///
/// Used by health checks; the two numbers match on a healthy database.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    // The tracking table is absent until the first migration runs.
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, applied as usize))
}
