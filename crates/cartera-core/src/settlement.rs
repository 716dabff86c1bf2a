//! # Settlement Module
//!
//! Pure settlement math: deriving a commission from a confirmed collection,
//! and bucketing commissions into the weekly and monthly periods the
//! settlement reports print.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Collection confirmed                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  derive_commission ── days since sale ──► bucket ──► rate (schedule)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Commission row (base, rate, bucket frozen)                            │
//! │       │                                                                 │
//! │       ├──► weekly_rollup ──► per-rep Monday..Sunday totals             │
//! │       │                                                                 │
//! │       └──► monthly statement ──► printable rows + grand totals         │
//! │                │                                                        │
//! │                └──► mark_period_paid (payout close, in cartera-db)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Period Conventions
//! - Weeks start on MONDAY. `week_start` is the most recent Monday on or
//!   before the collection date; `week_end` is the following Sunday.
//! - Months are calendar months of the collection date.
//! - All boundary math is deterministic and lives here, never in SQL, so
//!   the grouping is testable without a database.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::aging::{AgingBucket, RateSchedule};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Collection, Commission, CommissionRate, CommissionStatus, Representative, Sale};

// =============================================================================
// Period Boundaries
// =============================================================================

/// Returns the most recent Monday on or before `date`.
///
/// ## Example
/// ```rust
/// use cartera_core::settlement::week_start;
/// use chrono::NaiveDate;
///
/// // 2026-08-27 is a Thursday; its week began Monday the 24th
/// let thursday = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
/// assert_eq!(week_start(thursday), NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
/// ```
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Returns the Sunday closing the week that starts at `week_start`.
pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

/// Returns the first and last day of a calendar month.
///
/// ## Example
/// ```rust
/// use cartera_core::settlement::month_bounds;
/// use chrono::NaiveDate;
///
/// let (start, end) = month_bounds(2024, 2).unwrap();
/// assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()); // leap year
/// ```
pub fn month_bounds(year: i32, month: u32) -> CoreResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| invalid_period(year, month))?;

    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| invalid_period(year, month))?;

    Ok((start, end))
}

fn invalid_period(year: i32, month: u32) -> CoreError {
    CoreError::Validation(ValidationError::InvalidFormat {
        field: "period".to_string(),
        reason: format!("{}-{:02} is not a valid calendar month", year, month),
    })
}

// =============================================================================
// Commission Derivation
// =============================================================================

/// A commission computed from a collection but not yet persisted.
///
/// The ledger layer assigns the row id and timestamps when it writes the
/// draft inside the confirmation transaction; everything financial is
/// decided here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionDraft {
    pub sale_id: String,
    pub collection_id: String,
    pub representative_id: String,
    pub amount_base_cents: i64,
    pub rate_bps: u32,
    pub days_elapsed: i64,
    pub bucket: AgingBucket,
    pub collected_on: NaiveDate,
}

impl CommissionDraft {
    /// Returns the payable commission amount: base × rate, rounded half-up.
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_base_cents).apply_rate(CommissionRate::from_bps(self.rate_bps))
    }
}

/// Derives the commission for a collection against its sale.
///
/// Pure: days elapsed come from the two business dates, the bucket from
/// the day count, the rate from the schedule. An unclassifiable age is an
/// error and the caller must abort the confirmation.
///
/// ## Example
/// ```rust
/// use cartera_core::aging::{AgingBucket, RateSchedule};
/// use cartera_core::settlement::derive_commission;
/// # use cartera_core::types::*;
/// # use chrono::{NaiveDate, Utc};
/// # let sale = Sale {
/// #     id: "s1".into(), code: Sale::format_code(1), client_id: "cl1".into(),
/// #     representative_id: "r1".into(),
/// #     issued_on: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
/// #     total_cents: 100_000, outstanding_cents: 100_000,
/// #     status: SaleStatus::Shipped, tracking_ref: None, notes: None,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// # let collection = Collection {
/// #     id: "c1".into(), code: Collection::format_code(1), sale_id: "s1".into(),
/// #     client_id: "cl1".into(), representative_id: "r1".into(),
/// #     collected_on: NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
/// #     cash_cents: 40_000, check_cents: 0, check_bank: None, check_number: None,
/// #     check_issued_on: None, remarks: None, status: CollectionStatus::Pending,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
///
/// // 45 days after the sale: bucket B at 7%
/// let draft = derive_commission(&sale, &collection, &RateSchedule::default()).unwrap();
/// assert_eq!(draft.bucket, AgingBucket::B);
/// assert_eq!(draft.amount().cents(), 2_800);
/// ```
pub fn derive_commission(
    sale: &Sale,
    collection: &Collection,
    schedule: &RateSchedule,
) -> CoreResult<CommissionDraft> {
    let days = sale.age_at(collection.collected_on);
    let bucket = AgingBucket::classify(days)?;
    let rate = schedule.rate_for(bucket);

    Ok(CommissionDraft {
        sale_id: sale.id.clone(),
        collection_id: collection.id.clone(),
        representative_id: collection.representative_id.clone(),
        amount_base_cents: collection.total().cents(),
        rate_bps: rate.bps(),
        days_elapsed: days,
        bucket,
        collected_on: collection.collected_on,
    })
}

// =============================================================================
// Weekly Rollup
// =============================================================================

/// One representative's settlement totals for one Monday-start week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySettlement {
    pub representative_id: String,
    /// Monday opening the week.
    pub week_start: NaiveDate,
    /// Sunday closing the week.
    pub week_end: NaiveDate,
    /// Confirmed collections counted into this week.
    pub collection_count: i64,
    /// Sum of commission bases (collection totals), in cents.
    pub amount_base_cents: i64,
    /// Sum of per-collection commission amounts, in cents.
    pub commission_cents: i64,
}

impl WeeklySettlement {
    /// Returns the summed commission base as Money.
    #[inline]
    pub fn amount_base(&self) -> Money {
        Money::from_cents(self.amount_base_cents)
    }

    /// Returns the summed commission as Money.
    #[inline]
    pub fn commission(&self) -> Money {
        Money::from_cents(self.commission_cents)
    }
}

impl fmt::Display for WeeklySettlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} week {}..{}: {} collections, base {}, commission {}",
            self.representative_id,
            self.week_start,
            self.week_end,
            self.collection_count,
            self.amount_base(),
            self.commission()
        )
    }
}

/// Groups commissions into per-representative weekly settlements.
///
/// Reversed commissions are excluded. Commission amounts are summed per
/// row (each already rounded), never recomputed from the summed base, so
/// the rollup always reconciles with the individual rows a statement
/// prints. Output is sorted by week descending, then representative.
pub fn weekly_rollup(commissions: &[Commission]) -> Vec<WeeklySettlement> {
    let mut weeks: HashMap<(String, NaiveDate), WeeklySettlement> = HashMap::new();

    for commission in commissions {
        if commission.status == CommissionStatus::Reversed {
            continue;
        }

        let start = week_start(commission.collected_on);
        let entry = weeks
            .entry((commission.representative_id.clone(), start))
            .or_insert_with(|| WeeklySettlement {
                representative_id: commission.representative_id.clone(),
                week_start: start,
                week_end: week_end(start),
                collection_count: 0,
                amount_base_cents: 0,
                commission_cents: 0,
            });

        entry.collection_count += 1;
        entry.amount_base_cents += commission.amount_base_cents;
        entry.commission_cents += commission.amount().cents();
    }

    let mut rollup: Vec<WeeklySettlement> = weeks.into_values().collect();
    rollup.sort_by(|a, b| {
        b.week_start
            .cmp(&a.week_start)
            .then_with(|| a.representative_id.cmp(&b.representative_id))
    });
    rollup
}

// =============================================================================
// Monthly Statement
// =============================================================================

/// One printable line of a monthly settlement statement.
///
/// Carries every field the printed documents need (check metadata, client
/// contact data, tracking reference); formatting stays outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SettlementRow {
    pub commission_id: String,
    pub sale_code: String,
    pub collection_code: String,
    pub client_name: String,
    pub client_address: Option<String>,
    pub client_phone: Option<String>,
    pub collected_on: NaiveDate,
    pub days_elapsed: i64,
    pub bucket: AgingBucket,
    pub cash_cents: i64,
    pub check_cents: i64,
    pub check_bank: Option<String>,
    pub check_number: Option<String>,
    pub check_issued_on: Option<NaiveDate>,
    pub tracking_ref: Option<String>,
    pub amount_base_cents: i64,
    pub rate_bps: u32,
    pub status: CommissionStatus,
}

impl SettlementRow {
    /// Returns the commission base as Money.
    #[inline]
    pub fn amount_base(&self) -> Money {
        Money::from_cents(self.amount_base_cents)
    }

    /// Returns the frozen rate.
    #[inline]
    pub fn rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.rate_bps)
    }

    /// Returns the payable commission for this row.
    #[inline]
    pub fn commission(&self) -> Money {
        self.amount_base().apply_rate(self.rate())
    }
}

/// Grand totals at the bottom of a monthly statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementTotals {
    pub cash_cents: i64,
    pub check_cents: i64,
    pub commission_cents: i64,
    pub collection_count: i64,
}

/// Sums statement rows into grand totals, excluding reversed rows.
pub fn statement_totals(rows: &[SettlementRow]) -> StatementTotals {
    let mut totals = StatementTotals {
        cash_cents: 0,
        check_cents: 0,
        commission_cents: 0,
        collection_count: 0,
    };

    for row in rows {
        if row.status == CommissionStatus::Reversed {
            continue;
        }
        totals.cash_cents += row.cash_cents;
        totals.check_cents += row.check_cents;
        totals.commission_cents += row.commission().cents();
        totals.collection_count += 1;
    }

    totals
}

/// A representative's settlement statement for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStatement {
    pub representative_id: String,
    pub representative_name: String,
    pub year: i32,
    pub month: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub rows: Vec<SettlementRow>,
    pub totals: StatementTotals,
}

impl MonthlyStatement {
    /// Assembles a statement from its rows: computes the period bounds and
    /// the grand totals. Rows are kept in the order given (the ledger
    /// fetches them by collection date).
    pub fn new(
        representative: &Representative,
        year: i32,
        month: u32,
        rows: Vec<SettlementRow>,
    ) -> CoreResult<Self> {
        let (period_start, period_end) = month_bounds(year, month)?;
        let totals = statement_totals(&rows);

        Ok(MonthlyStatement {
            representative_id: representative.id.clone(),
            representative_name: representative.name.clone(),
            year,
            month,
            period_start,
            period_end,
            rows,
            totals,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
