//! # Repository Module
//!
//! Database repository implementations for the Cartera ledgers.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Application code                                                      │
//! │       │                                                                 │
//! │       │  db.collections().confirm(&id, &schedule)                      │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CollectionRepository                                                  │
//! │  ├── create(...)     ← reservation guard                               │
//! │  ├── confirm(...)    ← atomic balance + commission unit                │
//! │  ├── void(...)                                                          │
//! │  └── reverse(...)                                                       │
//! │       │                                                                 │
//! │       │  SQL in one transaction                                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every rule decision (status, overpayment, aging) is delegated to      │
//! │  cartera-core; the repository contributes transactions and guarded     │
//! │  single-statement writes.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`registry::RegistryRepository`] - representatives, clients, products
//! - [`sale::SaleRepository`] - sale ledger operations
//! - [`collection::CollectionRepository`] - collection ledger operations
//! - [`settlement::SettlementRepository`] - commissions and aggregation

use sqlx::SqliteConnection;

use crate::error::DbResult;

pub mod collection;
pub mod registry;
pub mod sale;
pub mod settlement;

// =============================================================================
// Business-Code Counters
// =============================================================================

/// Counter row allocating sale codes (`V` + 9 digits).
pub(crate) const SALE_CODE_COUNTER: &str = "sale_code";

/// Counter row allocating collection codes (`C` + 9 digits).
pub(crate) const COLLECTION_CODE_COUNTER: &str = "collection_code";

/// Allocates the next value of a business-code sequence.
///
/// Single-statement increment: the UPDATE both advances the counter and
/// returns the new value, so concurrent writers serialize on the counter
/// row and no value is ever handed out twice. Scanning existing codes for
/// a maximum cannot make that guarantee.
pub(crate) async fn next_counter(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        "UPDATE ledger_counters SET value = value + 1 WHERE name = ?1 RETURNING value",
    )
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(value)
}
