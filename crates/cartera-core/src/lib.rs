//! # cartera-core: Pure Settlement Rules for Cartera
//!
//! This crate is the **heart** of Cartera. Every ledger decision the system
//! makes (balances, lifecycle states, aging, commission math) lives here as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartera Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Application / Reporting Layer                   │   │
//! │  │     sale entry ──► collection entry ──► settlement printouts    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cartera-db (Ledger Layer)                    │   │
//! │  │     SQLite transactions, atomic counters, repositories          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ every domain decision                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cartera-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   aging   │  │settlement │  │   │
//! │  │   │   Sale    │  │   Money   │  │  buckets  │  │   weeks   │  │   │
//! │  │   │Collection │  │ RateCalc  │  │   rates   │  │  rollups  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Collection, Commission, statuses)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`aging`] - Aging buckets and the commission rate schedule
//! - [`settlement`] - Commission derivation, week/month bucketing, rollups
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cartera_core::aging::{AgingBucket, RateSchedule};
//! use cartera_core::money::Money;
//!
//! // A collection 45 days after the sale lands in bucket B
//! let bucket = AgingBucket::classify(45).unwrap();
//! assert_eq!(bucket, AgingBucket::B);
//!
//! // Bucket B pays 7% under the default schedule
//! let schedule = RateSchedule::default();
//! let base = Money::from_cents(40_000); // $400.00 collected
//! let commission = base.apply_rate(schedule.rate_for(bucket));
//! assert_eq!(commission.cents(), 2_800); // $28.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aging;
pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cartera_core::Money` instead of
// `use cartera_core::money::Money`

pub use aging::{AgingBucket, RateSchedule};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settlement::{
    derive_commission, month_bounds, statement_totals, week_end, week_start, weekly_rollup,
    CommissionDraft, MonthlyStatement, SettlementRow, StatementTotals, WeeklySettlement,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single sale.
///
/// ## Business Reason
/// Prevents runaway orders and keeps a sale printable on one delivery note.
/// Can be made configurable per deployment in future versions.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single product on one sale line.
///
/// ## Business Reason
/// Wholesale pharma orders legitimately reach the thousands, but anything
/// beyond this is almost certainly a typo (e.g. a scanned barcode pasted
/// into the quantity field).
pub const MAX_LINE_QUANTITY: i64 = 9_999;
