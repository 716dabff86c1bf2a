//! # cartera-db: Database Layer for Cartera
//!
//! This crate provides database access for the Cartera settlement system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartera Data Flow                                │
//! │                                                                         │
//! │  Caller (collections().confirm, settlement().monthly_statement)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cartera-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │  (sale.rs,     │    │  (embedded)  │ │   │
//! │  │   │               │    │   collection,  │    │              │ │   │
//! │  │   │ SqlitePool    │◄───│   settlement,  │    │ 001_initial_ │ │   │
//! │  │   │ Connection    │    │   registry)    │    │ schema.sql   │ │   │
//! │  │   │ Management    │    │                │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  │                                │                               │   │
//! │  │                                ▼                               │   │
//! │  │                     cartera-core (pure rules:                  │   │
//! │  │                     aging, rates, rollups, transitions)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │            cartera.db (WAL, foreign keys enforced)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations (sale, collection,
//!   settlement, registry)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartera_db::{Database, DbConfig};
//! use cartera_core::aging::RateSchedule;
//!
//! // Create database with default config (runs migrations)
//! let config = DbConfig::new("path/to/cartera.db");
//! let db = Database::new(config).await?;
//!
//! // Record a sale, register a collection against it, confirm it
//! let sale = db.sales().create(&client_id, &rep_id, issued_on, &lines, None).await?;
//! let pending = db
//!     .collections()
//!     .create(&sale.id, &client_id, &rep_id, today, 40_000, 0, None, None)
//!     .await?;
//! db.collections().confirm(&pending.id, &RateSchedule::default()).await?;
//!
//! // Settle the month
//! let statement = db.settlement().monthly_statement(&rep_id, 2026, 8).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::collection::{CheckDetails, CollectionRepository};
pub use repository::registry::RegistryRepository;
pub use repository::sale::{SaleLine, SaleRepository};
pub use repository::settlement::SettlementRepository;
