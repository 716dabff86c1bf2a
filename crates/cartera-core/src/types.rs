//! # Domain Types
//!
//! Core domain types used throughout Cartera.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │   Collection    │   │   Commission    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code "V…"      │   │  code "C…"      │   │  collection FK  │       │
//! │  │  outstanding    │   │  cash + check   │   │  base × rate    │       │
//! │  │  status         │   │  status         │   │  bucket, days   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SaleStatus    │   │CollectionStatus │   │CommissionStatus │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  Pending        │   │  Pending        │       │
//! │  │  Shipped        │   │  Confirmed      │   │  Paid           │       │
//! │  │  Completed      │   │  Voided         │   │  Reversed       │       │
//! │  │  Voided         │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every ledger entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business code: (`V000000042`, `C000000117`) - human-readable, printed on
//!   delivery notes and receipts, allocated from an atomic counter
//!
//! ## Status Machines
//! Lifecycle rules live HERE, on the enums, as pure functions. The ledger
//! layer calls them for every write so there is exactly one place that
//! decides which transitions are legal and when a sale auto-completes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aging::AgingBucket;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Commission Rate
// =============================================================================

/// Commission rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the bucket A rate in the default schedule)
/// Integer bps keep rate math exact; percentages as floats do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate(u32);

impl CommissionRate {
    /// Creates a commission rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CommissionRate(bps)
    }

    /// Creates a commission rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        CommissionRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        CommissionRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        CommissionRate::zero()
    }
}

// =============================================================================
// Reference Registry Types
// =============================================================================

/// A field representative ("visitador") earning commissions on collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Representative {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Full name, printed on settlement statements.
    pub name: String,

    /// Contact phone.
    pub phone: Option<String>,

    /// Sales zone the representative covers.
    pub zone: Option<String>,

    /// When the representative was registered.
    pub created_at: DateTime<Utc>,
}

/// A client (pharmacy, clinic, distributor) that buys on credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business name, printed on statements.
    pub name: String,

    /// Delivery/billing address.
    pub address: Option<String>,

    /// Contact phone.
    pub phone: Option<String>,

    /// Sum of every non-voided sale's uncollected remainder, in cents.
    /// Maintained by the ledgers, never written by callers directly.
    pub pending_balance_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Returns the pending balance as Money.
    #[inline]
    pub fn pending_balance(&self) -> Money {
        Money::from_cents(self.pending_balance_cents)
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, frozen onto sale lines at sale time.
    pub name: String,

    /// List price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units currently in stock.
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The lifecycle state of a sale.
///
/// ## Transition Rules
/// ```text
/// pending ──► shipped ──► completed        (forward only)
///    │           │            │
///    └───────────┴────────────┴──► voided  (terminal)
///
/// outstanding == 0 forces completed, whatever was requested.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded, goods not yet dispatched.
    Pending,
    /// Goods dispatched (tracking reference assigned).
    Shipped,
    /// Fully collected; outstanding balance is zero.
    Completed,
    /// Cancelled. Terminal and irreversible.
    Voided,
}

impl SaleStatus {
    /// Stored/display form of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Shipped => "shipped",
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }

    /// Position in the forward lifecycle, for rejecting backward moves.
    const fn rank(self) -> u8 {
        match self {
            SaleStatus::Pending => 0,
            SaleStatus::Shipped => 1,
            SaleStatus::Completed => 2,
            SaleStatus::Voided => 3,
        }
    }

    /// Resolves a requested status write against the current state and the
    /// sale's outstanding balance, returning the status that must actually
    /// be stored.
    ///
    /// This is THE rule for sale lifecycle writes. `set_status` calls it
    /// with the caller's request; `confirm` calls it with
    /// `requested == current` after decrementing the balance, so a balance
    /// hitting zero auto-completes through the exact same code path.
    ///
    /// ## Rules
    /// - voided is terminal: only an idempotent voided → voided write passes
    /// - requesting voided always passes (the caller runs the void
    ///   compensations in the same transaction)
    /// - `outstanding == 0` overrides any non-void request to completed
    /// - completed may not be requested while outstanding > 0
    /// - backward moves (e.g. shipped → pending) are rejected
    pub fn resolve_write(
        self,
        requested: SaleStatus,
        outstanding: Money,
        sale_id: &str,
    ) -> CoreResult<SaleStatus> {
        let rejected = || {
            Err(CoreError::InvalidTransition {
                entity: "sale",
                id: sale_id.to_string(),
                from: self.as_str(),
                to: requested.as_str(),
            })
        };

        match (self, requested) {
            (SaleStatus::Voided, SaleStatus::Voided) => Ok(SaleStatus::Voided),
            (SaleStatus::Voided, _) => rejected(),
            (_, SaleStatus::Voided) => Ok(SaleStatus::Voided),
            _ if outstanding.is_zero() => Ok(SaleStatus::Completed),
            (_, SaleStatus::Completed) => rejected(),
            _ if requested.rank() < self.rank() => rejected(),
            _ => Ok(requested),
        }
    }

    /// Status after a tracking reference is assigned.
    ///
    /// A voided sale keeps the reference but never leaves voided; a fully
    /// collected sale is forced to completed; otherwise assigning tracking
    /// is what moves a pending sale to shipped.
    pub fn after_tracking(self, outstanding: Money) -> SaleStatus {
        match self {
            SaleStatus::Voided => SaleStatus::Voided,
            _ if outstanding.is_zero() => SaleStatus::Completed,
            SaleStatus::Pending => SaleStatus::Shipped,
            other => other,
        }
    }

    /// Status after a confirmed collection is reversed.
    ///
    /// Reversal puts money back on the sale, so a completed sale is no
    /// longer fully collected and returns to shipped. Earlier states keep
    /// their position in the lifecycle.
    pub fn after_reversal(self) -> SaleStatus {
        match self {
            SaleStatus::Completed => SaleStatus::Shipped,
            other => other,
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale of goods to a client, tracked until fully collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Sequential business code: `V` + 9 zero-padded digits.
    pub code: String,
    pub client_id: String,
    pub representative_id: String,
    /// Business date the sale was issued (not the row timestamp).
    pub issued_on: NaiveDate,
    /// Sum of line totals, in cents. Never changes after creation.
    pub total_cents: i64,
    /// Uncollected remainder, in cents. `0 ≤ outstanding ≤ total` always.
    pub outstanding_cents: i64,
    pub status: SaleStatus,
    /// Carrier tracking reference; assigning one marks the sale shipped.
    pub tracking_ref: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Formats a counter value as a sale business code.
    ///
    /// ## Example
    /// ```rust
    /// use cartera_core::types::Sale;
    ///
    /// assert_eq!(Sale::format_code(42), "V000000042");
    /// ```
    pub fn format_code(seq: i64) -> String {
        format!("V{:09}", seq)
    }

    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn outstanding(&self) -> Money {
        Money::from_cents(self.outstanding_cents)
    }

    /// Returns the amount collected so far as Money.
    #[inline]
    pub fn collected(&self) -> Money {
        self.total() - self.outstanding()
    }

    /// Whole days between the sale's issue date and `on`.
    ///
    /// Negative when `on` precedes the issue date; the aging classifier
    /// rejects that instead of hiding it.
    pub fn age_at(&self, on: NaiveDate) -> i64 {
        (on - self.issued_on).num_days()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Collection Status
// =============================================================================

/// The lifecycle state of a collection.
///
/// ## Transition Rules
/// ```text
/// pending ──► confirmed   (applies balance effects, materializes commission)
///    │
///    └──────► voided      (no financial effect)
///
/// confirmed ──► voided only through the explicit `reverse` operation,
/// which undoes the balance effects and marks the commission reversed.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Recorded by the representative, not yet applied to any balance.
    Pending,
    /// Applied: sale outstanding and client balance decremented, commission
    /// materialized. Terminal except for explicit reversal.
    Confirmed,
    /// Discarded. Terminal.
    Voided,
}

impl CollectionStatus {
    /// Stored/display form of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::Confirmed => "confirmed",
            CollectionStatus::Voided => "voided",
        }
    }

    /// Confirmation is legal only from pending.
    pub fn ensure_can_confirm(self, collection_id: &str) -> CoreResult<()> {
        match self {
            CollectionStatus::Pending => Ok(()),
            _ => Err(CoreError::InvalidTransition {
                entity: "collection",
                id: collection_id.to_string(),
                from: self.as_str(),
                to: CollectionStatus::Confirmed.as_str(),
            }),
        }
    }

    /// Voiding is legal only from pending. A confirmed collection has
    /// already moved money; undoing it requires `reverse`, never `void`.
    pub fn ensure_can_void(self, collection_id: &str) -> CoreResult<()> {
        match self {
            CollectionStatus::Pending => Ok(()),
            _ => Err(CoreError::InvalidTransition {
                entity: "collection",
                id: collection_id.to_string(),
                from: self.as_str(),
                to: CollectionStatus::Voided.as_str(),
            }),
        }
    }

    /// Reversal is legal only from confirmed.
    pub fn ensure_can_reverse(self, collection_id: &str) -> CoreResult<()> {
        match self {
            CollectionStatus::Confirmed => Ok(()),
            _ => Err(CoreError::InvalidTransition {
                entity: "collection",
                id: collection_id.to_string(),
                from: self.as_str(),
                to: CollectionStatus::Voided.as_str(),
            }),
        }
    }
}

impl Default for CollectionStatus {
    fn default() -> Self {
        CollectionStatus::Pending
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Collection
// =============================================================================

/// A payment applied against a specific sale's outstanding balance.
/// Tendered as cash, check, or a split of both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Collection {
    pub id: String,
    /// Sequential business code: `C` + 9 zero-padded digits, strictly
    /// increasing ledger-wide, never reused.
    pub code: String,
    pub sale_id: String,
    pub client_id: String,
    pub representative_id: String,
    /// Business date the money was collected.
    pub collected_on: NaiveDate,
    /// Cash portion in cents.
    pub cash_cents: i64,
    /// Check portion in cents.
    pub check_cents: i64,
    /// Issuing bank, when part of the tender is a check.
    pub check_bank: Option<String>,
    /// Check number, when part of the tender is a check.
    pub check_number: Option<String>,
    /// Date printed on the check.
    pub check_issued_on: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub status: CollectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Formats a counter value as a collection business code.
    ///
    /// ## Example
    /// ```rust
    /// use cartera_core::types::Collection;
    ///
    /// assert_eq!(Collection::format_code(117), "C000000117");
    /// ```
    pub fn format_code(seq: i64) -> String {
        format!("C{:09}", seq)
    }

    /// Returns the cash portion as Money.
    #[inline]
    pub fn cash(&self) -> Money {
        Money::from_cents(self.cash_cents)
    }

    /// Returns the check portion as Money.
    #[inline]
    pub fn check(&self) -> Money {
        Money::from_cents(self.check_cents)
    }

    /// Returns the total tendered amount (cash + check) as Money.
    /// This is the amount applied to the sale and the commission base.
    #[inline]
    pub fn total(&self) -> Money {
        self.cash() + self.check()
    }
}

// =============================================================================
// Commission Status
// =============================================================================

/// The settlement state of a commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Earned, not yet paid out.
    Pending,
    /// Paid out in a monthly settlement close.
    Paid,
    /// Its collection was reversed; excluded from every aggregate.
    Reversed,
}

impl CommissionStatus {
    /// Stored/display form of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Paid => "paid",
            CommissionStatus::Reversed => "reversed",
        }
    }
}

impl Default for CommissionStatus {
    fn default() -> Self {
        CommissionStatus::Pending
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Commission
// =============================================================================

/// The incentive owed to a representative for one confirmed collection.
///
/// Amount base, rate, and bucket are SNAPSHOTS taken at confirmation time.
/// Changing the rate schedule later never rewrites settlement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Commission {
    pub id: String,
    pub sale_id: String,
    /// Exactly one commission per collection, enforced by the store.
    pub collection_id: String,
    pub representative_id: String,
    /// Collection total at confirmation time, in cents (frozen).
    pub amount_base_cents: i64,
    /// Rate applied, in basis points (frozen).
    pub rate_bps: u32,
    /// Whole days between sale issue and collection.
    pub days_elapsed: i64,
    /// Aging bucket the rate was read from (frozen).
    pub bucket: AgingBucket,
    /// Collection date, denormalized for period grouping.
    pub collected_on: NaiveDate,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Commission {
    /// Returns the commission base (the collection total) as Money.
    #[inline]
    pub fn amount_base(&self) -> Money {
        Money::from_cents(self.amount_base_cents)
    }

    /// Returns the frozen rate.
    #[inline]
    pub fn rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.rate_bps)
    }

    /// Returns the payable commission amount: base × rate, rounded half-up.
    #[inline]
    pub fn amount(&self) -> Money {
        self.amount_base().apply_rate(self.rate())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_rate_from_bps() {
        let rate = CommissionRate::from_bps(700);
        assert_eq!(rate.bps(), 700);
        assert!((rate.percentage() - 7.0).abs() < 0.001);
    }

    #[test]
    fn test_commission_rate_from_percentage() {
        let rate = CommissionRate::from_percentage(7.0);
        assert_eq!(rate.bps(), 700);
    }

    #[test]
    fn test_business_code_formatting() {
        assert_eq!(Sale::format_code(1), "V000000001");
        assert_eq!(Sale::format_code(123_456_789), "V123456789");
        assert_eq!(Collection::format_code(117), "C000000117");
    }

    #[test]
    fn test_sale_forward_transitions() {
        let owing = Money::from_cents(500);

        let next = SaleStatus::Pending
            .resolve_write(SaleStatus::Shipped, owing, "s1")
            .unwrap();
        assert_eq!(next, SaleStatus::Shipped);

        // Idempotent same-state write
        let next = SaleStatus::Shipped
            .resolve_write(SaleStatus::Shipped, owing, "s1")
            .unwrap();
        assert_eq!(next, SaleStatus::Shipped);
    }

    #[test]
    fn test_sale_backward_transition_rejected() {
        let owing = Money::from_cents(500);
        let err = SaleStatus::Shipped
            .resolve_write(SaleStatus::Pending, owing, "s1")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_sale_completed_requires_zero_outstanding() {
        let owing = Money::from_cents(500);
        let err = SaleStatus::Shipped
            .resolve_write(SaleStatus::Completed, owing, "s1")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_sale_zero_outstanding_forces_completed() {
        // Whatever non-void status is requested, a fully collected sale
        // lands on completed.
        let next = SaleStatus::Pending
            .resolve_write(SaleStatus::Pending, Money::zero(), "s1")
            .unwrap();
        assert_eq!(next, SaleStatus::Completed);

        let next = SaleStatus::Shipped
            .resolve_write(SaleStatus::Shipped, Money::zero(), "s1")
            .unwrap();
        assert_eq!(next, SaleStatus::Completed);
    }

    #[test]
    fn test_sale_void_always_allowed_and_terminal() {
        let owing = Money::from_cents(500);

        for from in [
            SaleStatus::Pending,
            SaleStatus::Shipped,
            SaleStatus::Completed,
        ] {
            let next = from.resolve_write(SaleStatus::Voided, owing, "s1").unwrap();
            assert_eq!(next, SaleStatus::Voided);
        }

        // Idempotent re-void
        let next = SaleStatus::Voided
            .resolve_write(SaleStatus::Voided, owing, "s1")
            .unwrap();
        assert_eq!(next, SaleStatus::Voided);

        // But nothing leaves voided
        let err = SaleStatus::Voided
            .resolve_write(SaleStatus::Shipped, owing, "s1")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_after_tracking() {
        let owing = Money::from_cents(500);

        assert_eq!(
            SaleStatus::Pending.after_tracking(owing),
            SaleStatus::Shipped
        );
        assert_eq!(
            SaleStatus::Shipped.after_tracking(owing),
            SaleStatus::Shipped
        );
        assert_eq!(
            SaleStatus::Pending.after_tracking(Money::zero()),
            SaleStatus::Completed
        );
        assert_eq!(
            SaleStatus::Voided.after_tracking(Money::zero()),
            SaleStatus::Voided
        );
    }

    #[test]
    fn test_after_reversal() {
        assert_eq!(SaleStatus::Completed.after_reversal(), SaleStatus::Shipped);
        assert_eq!(SaleStatus::Shipped.after_reversal(), SaleStatus::Shipped);
        assert_eq!(SaleStatus::Pending.after_reversal(), SaleStatus::Pending);
    }

    #[test]
    fn test_collection_confirm_guard() {
        assert!(CollectionStatus::Pending.ensure_can_confirm("c1").is_ok());
        assert!(CollectionStatus::Confirmed.ensure_can_confirm("c1").is_err());
        assert!(CollectionStatus::Voided.ensure_can_confirm("c1").is_err());
    }

    #[test]
    fn test_collection_void_guard() {
        assert!(CollectionStatus::Pending.ensure_can_void("c1").is_ok());
        // A confirmed collection must go through reverse, never void
        assert!(CollectionStatus::Confirmed.ensure_can_void("c1").is_err());
        assert!(CollectionStatus::Voided.ensure_can_void("c1").is_err());
    }

    #[test]
    fn test_collection_reverse_guard() {
        assert!(CollectionStatus::Confirmed.ensure_can_reverse("c1").is_ok());
        assert!(CollectionStatus::Pending.ensure_can_reverse("c1").is_err());
        assert!(CollectionStatus::Voided.ensure_can_reverse("c1").is_err());
    }

    #[test]
    fn test_collection_total_is_cash_plus_check() {
        let collection = Collection {
            id: "c1".to_string(),
            code: Collection::format_code(1),
            sale_id: "s1".to_string(),
            client_id: "cl1".to_string(),
            representative_id: "r1".to_string(),
            collected_on: NaiveDate::from_ymd_opt(2026, 8, 11).unwrap(),
            cash_cents: 15_000,
            check_cents: 25_000,
            check_bank: Some("Banco Central".to_string()),
            check_number: Some("00451".to_string()),
            check_issued_on: NaiveDate::from_ymd_opt(2026, 8, 10),
            remarks: None,
            status: CollectionStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(collection.total().cents(), 40_000);
    }

    #[test]
    fn test_sale_age_and_collected() {
        let sale = Sale {
            id: "s1".to_string(),
            code: Sale::format_code(1),
            client_id: "cl1".to_string(),
            representative_id: "r1".to_string(),
            issued_on: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            total_cents: 100_000,
            outstanding_cents: 60_000,
            status: SaleStatus::Shipped,
            tracking_ref: Some("TRK-88".to_string()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            sale.age_at(NaiveDate::from_ymd_opt(2026, 8, 11).unwrap()),
            10
        );
        assert_eq!(sale.collected().cents(), 40_000);
    }

    #[test]
    fn test_commission_amount() {
        let commission = Commission {
            id: "m1".to_string(),
            sale_id: "s1".to_string(),
            collection_id: "c1".to_string(),
            representative_id: "r1".to_string(),
            amount_base_cents: 40_000,
            rate_bps: 700,
            days_elapsed: 45,
            bucket: AgingBucket::B,
            collected_on: NaiveDate::from_ymd_opt(2026, 8, 11).unwrap(),
            status: CommissionStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(commission.amount().cents(), 2_800);
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
        assert_eq!(CollectionStatus::default(), CollectionStatus::Pending);
        assert_eq!(CommissionStatus::default(), CommissionStatus::Pending);
    }

    #[test]
    fn test_status_display_matches_stored_form() {
        assert_eq!(SaleStatus::Shipped.to_string(), "shipped");
        assert_eq!(CollectionStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(CommissionStatus::Reversed.to_string(), "reversed");
    }
}
