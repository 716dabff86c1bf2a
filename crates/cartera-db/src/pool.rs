//! # Pool and Database Handle
//!
//! Owns the SQLite connection pool and hands out repositories.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("cartera.db")          (builder, plain struct)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await                                            │
//! │       │                                                                 │
//! │       ├── opens/creates the file (mode=rwc)                             │
//! │       ├── sets WAL + NORMAL sync + foreign_keys                         │
//! │       ├── builds the SqlitePool                                         │
//! │       └── applies embedded migrations                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.registry() / db.sales() / db.collections() / db.settlement()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why WAL
//!
//! Settlement reads (weekly rollups, monthly statements) scan the ledgers
//! while sale and collection writes keep arriving. Under WAL readers and
//! writers do not block each other, so a long aggregation never stalls a
//! confirm. NORMAL synchronous keeps the file corruption-safe; at worst a
//! power cut loses the last not-yet-synced transaction.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::collection::CollectionRepository;
use crate::repository::registry::RegistryRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::settlement::SettlementRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings, consumed by [`Database::new`].
///
/// All fields have back-office-sized defaults; override with the builder
/// methods only when a deployment needs something different.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite file. Created on first open.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections (default 5).
    pub max_connections: u32,

    /// Connections kept warm between bursts (default 1).
    pub min_connections: u32,

    /// How long `acquire` waits before giving up (default 30s).
    pub connect_timeout: Duration,

    /// Idle time before a pooled connection is dropped (default 10min).
    pub idle_timeout: Duration,

    /// Apply embedded migrations during `Database::new` (default true).
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration with defaults for the given database path.
    ///
    /// ```rust,ignore
    /// let config = DbConfig::new("./data/cartera.db").max_connections(8);
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Overrides the pool's connection cap.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Overrides the number of connections kept warm.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Overrides the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables or disables migration on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Configuration for an isolated in-memory database.
    ///
    /// Every test gets its own `:memory:` instance with the full schema
    /// applied. The pool is pinned to one connection: separate connections
    /// to `:memory:` would each see a different empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle over the pool; the only way callers reach the repositories.
///
/// Cloning is cheap (the pool is an `Arc` internally) and each accessor
/// builds its repository on the spot, so handles and repositories can move
/// freely across tasks:
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./cartera.db")).await?;
///
/// let sale = db.sales().get_by_code("V000000042").await?;
/// let rollup = db.settlement().weekly_aggregate(&rep_id, None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database and prepares it for use.
    ///
    /// Connection-level pragmas are fixed here rather than configurable:
    /// WAL journaling, NORMAL synchronous, and foreign key enforcement.
    /// Foreign keys matter in particular, since the ledgers lean on
    /// `sale → client` and `commission → collection` references that
    /// SQLite leaves unenforced by default.
    ///
    /// Returns `DbError::ConnectionFailed` if the file cannot be opened
    /// or the pool cannot be built; migration failures surface as
    /// `DbError::Migration`.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening ledger database"
        );

        // mode=rwc: read/write, create when missing
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!(
            max = config.max_connections,
            min = config.min_connections,
            "Building connection pool"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        info!("Ledger database ready");
        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// `new()` already does this unless `run_migrations` was turned off,
    /// in which case the caller picks the moment.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool access, for queries the repositories do not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Representatives, clients, and products.
    pub fn registry(&self) -> RegistryRepository {
        RegistryRepository::new(self.pool.clone())
    }

    /// The sale ledger: create, track, status, void.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// The collection ledger: create, confirm, void, reverse.
    pub fn collections(&self) -> CollectionRepository {
        CollectionRepository::new(self.pool.clone())
    }

    /// Commissions and weekly/monthly aggregation.
    pub fn settlement(&self) -> SettlementRepository {
        SettlementRepository::new(self.pool.clone())
    }

    /// Drains and closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing ledger database");
        self.pool.close().await;
    }

    /// Probes the database with a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
