//! # Money
//!
//! Integer-cents monetary type used by every balance in the ledgers.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The reconciliation invariant                                           │
//! │                                                                         │
//! │    Σ(confirmed collections) + outstanding == sale total                 │
//! │                                                                         │
//! │  must hold after ANY interleaving of collections and reversals.        │
//! │  Floats drift (0.1 + 0.2 = 0.30000000000000004); a single lost cent    │
//! │  leaves a sale that can never be completed or over-completes it.       │
//! │                                                                         │
//! │  So balances only ever move by whole cents, and division never         │
//! │  happens on a balance. The one rounding site in the whole engine is    │
//! │  [`Money::apply_rate`], and it rounds a derived commission, not a      │
//! │  ledger balance.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cartera_core::money::Money;
//!
//! let total = Money::from_cents(100_000); // $1,000.00 sale
//! let collected = Money::from_cents(40_000);
//!
//! let outstanding = total - collected;    // $600.00 still owed
//! assert_eq!(outstanding.cents(), 60_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::CommissionRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in cents.
///
/// Signed so that reversal math stays expressible, though the ledgers
/// themselves reject negative balances at the database layer. Thin wrapper
/// over `i64`: `Copy`, ordered, hashable, and serializes as a bare number.
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleItem.line_total ──► Sale.total ──► Sale.outstanding                │
/// │                                              │                          │
/// │        Collection.cash + Collection.check ───┘ (decrements on confirm)  │
/// │                      │                                                  │
/// │                      └──► Commission base × rate ──► settlement totals  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Wraps a cent amount.
    ///
    /// This is the only constructor. There is deliberately no
    /// `from_float`: dollar formatting belongs to the presentation
    /// layer, and parsing belongs to whoever owns the input.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// The raw cent amount.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole-dollar portion (truncated toward zero).
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Sub-dollar portion, always in `0..=99`.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero cents.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Magnitude, sign dropped.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a basis-point rate with half-up rounding.
    ///
    /// The single place a commission amount is computed from a collection
    /// base, so every draft, report, and rollup rounds identically:
    /// `(cents * bps + 5000) / 10000`, widened through `i128` so large
    /// bases cannot overflow the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use cartera_core::money::Money;
    /// use cartera_core::types::CommissionRate;
    ///
    /// let base = Money::from_cents(40_000);     // $400.00 collected
    /// let rate = CommissionRate::from_bps(700); // bucket B pays 7%
    ///
    /// assert_eq!(base.apply_rate(rate).cents(), 2_800); // $28.00
    /// ```
    ///
    /// ## Half-Up at the Boundary
    /// ```rust
    /// use cartera_core::money::Money;
    /// use cartera_core::types::CommissionRate;
    ///
    /// let rate = CommissionRate::from_bps(1000); // 10%
    /// // 0.5 of a cent goes up, 0.4 goes down
    /// assert_eq!(Money::from_cents(5).apply_rate(rate).cents(), 1);
    /// assert_eq!(Money::from_cents(4).apply_rate(rate).cents(), 0);
    /// ```
    pub fn apply_rate(&self, rate: CommissionRate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Scales a unit price by a line quantity.
    ///
    /// ```rust
    /// use cartera_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2_500); // $25.00 per box
    /// assert_eq!(unit_price.multiply_quantity(12).cents(), 30_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$-10.99` style output, for logs and debugging only. Report rendering
/// lives outside the engine.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
