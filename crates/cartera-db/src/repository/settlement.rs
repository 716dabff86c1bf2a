//! # Settlement Repository
//!
//! Database operations for commissions: materialization inside the
//! confirmation transaction, the weekly and monthly aggregates the
//! settlement reports are printed from, and the monthly payout close.
//!
//! ## Where Settlement Data Comes From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Data Flow                                │
//! │                                                                         │
//! │  CollectionRepository::confirm (one transaction)                        │
//! │       │                                                                 │
//! │       └── materialize() ← INSERT the derived commission row            │
//! │           (UNIQUE on collection_id: a collection pays at most once)    │
//! │                                                                         │
//! │  SettlementRepository (reads + payout close)                           │
//! │       ├── for_collection()      one commission, by its collection      │
//! │       ├── list_by_representative()                                     │
//! │       ├── weekly_aggregate()    Monday-start weeks, newest first       │
//! │       ├── monthly_statement()   printable rows + grand totals          │
//! │       └── mark_period_paid()    pending → paid for a closed month      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQL only fetches; every grouping, sum, and period boundary is computed
//! by cartera-core so the aggregation rules stay testable without a
//! database and identical across every report.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, LedgerResult};
use cartera_core::settlement::{month_bounds, weekly_rollup, CommissionDraft};
use cartera_core::{
    Commission, CommissionStatus, MonthlyStatement, Representative, SettlementRow, WeeklySettlement,
};

/// Repository for settlement database operations.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    /// Creates a new SettlementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    /// Gets the commission materialized for a collection, if any.
    ///
    /// A pending or voided collection has none; a confirmed one has
    /// exactly one (reversal flips its status instead of deleting it).
    pub async fn for_collection(&self, collection_id: &str) -> DbResult<Option<Commission>> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, sale_id, collection_id, representative_id,
                   amount_base_cents, rate_bps, days_elapsed, bucket,
                   collected_on, status, created_at, updated_at
            FROM commissions
            WHERE collection_id = ?1
            "#,
        )
        .bind(collection_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(commission)
    }

    /// Lists a representative's commissions, newest collection first.
    pub async fn list_by_representative(
        &self,
        representative_id: &str,
    ) -> DbResult<Vec<Commission>> {
        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, sale_id, collection_id, representative_id,
                   amount_base_cents, rate_bps, days_elapsed, bucket,
                   collected_on, status, created_at, updated_at
            FROM commissions
            WHERE representative_id = ?1
            ORDER BY collected_on DESC, created_at DESC
            "#,
        )
        .bind(representative_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(commissions)
    }

    /// Weekly settlement totals for one representative.
    ///
    /// Groups the representative's non-reversed commissions by the Monday
    /// week of their collection date:
    /// `week_start = most recent Monday ≤ collected_on`,
    /// `week_end = week_start + 6 days`. Sorted by week descending.
    ///
    /// `period` restricts to collections dated inside one calendar month;
    /// a week straddling the month boundary then only counts the rows
    /// actually dated inside the month.
    pub async fn weekly_aggregate(
        &self,
        representative_id: &str,
        period: Option<(i32, u32)>,
    ) -> LedgerResult<Vec<WeeklySettlement>> {
        let commissions = match period {
            Some((year, month)) => {
                let (start, end) = month_bounds(year, month)?;
                sqlx::query_as::<_, Commission>(
                    r#"
                    SELECT id, sale_id, collection_id, representative_id,
                           amount_base_cents, rate_bps, days_elapsed, bucket,
                           collected_on, status, created_at, updated_at
                    FROM commissions
                    WHERE representative_id = ?1
                      AND collected_on BETWEEN ?2 AND ?3
                    ORDER BY collected_on
                    "#,
                )
                .bind(representative_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Commission>(
                    r#"
                    SELECT id, sale_id, collection_id, representative_id,
                           amount_base_cents, rate_bps, days_elapsed, bucket,
                           collected_on, status, created_at, updated_at
                    FROM commissions
                    WHERE representative_id = ?1
                    ORDER BY collected_on
                    "#,
                )
                .bind(representative_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(
            representative = %representative_id,
            rows = commissions.len(),
            "Weekly aggregate fetched"
        );

        Ok(weekly_rollup(&commissions))
    }

    /// A representative's settlement statement for one calendar month.
    ///
    /// One row per commission whose collection is dated inside the month,
    /// joined with everything the printed statement shows: cash/check
    /// split, check metadata, client name/address/phone, sale code and
    /// tracking reference. Reversed rows stay visible (marked by status)
    /// so the statement explains any gap against an earlier draft, but
    /// the grand totals skip them.
    pub async fn monthly_statement(
        &self,
        representative_id: &str,
        year: i32,
        month: u32,
    ) -> LedgerResult<MonthlyStatement> {
        let representative = sqlx::query_as::<_, Representative>(
            r#"
            SELECT id, name, phone, zone, created_at
            FROM representatives
            WHERE id = ?1
            "#,
        )
        .bind(representative_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Representative", representative_id))?;

        let (start, end) = month_bounds(year, month)?;

        let rows = sqlx::query_as::<_, SettlementRow>(
            r#"
            SELECT m.id                AS commission_id,
                   s.code              AS sale_code,
                   c.code              AS collection_code,
                   cl.name             AS client_name,
                   cl.address          AS client_address,
                   cl.phone            AS client_phone,
                   m.collected_on      AS collected_on,
                   m.days_elapsed      AS days_elapsed,
                   m.bucket            AS bucket,
                   c.cash_cents        AS cash_cents,
                   c.check_cents       AS check_cents,
                   c.check_bank        AS check_bank,
                   c.check_number      AS check_number,
                   c.check_issued_on   AS check_issued_on,
                   s.tracking_ref      AS tracking_ref,
                   m.amount_base_cents AS amount_base_cents,
                   m.rate_bps          AS rate_bps,
                   m.status            AS status
            FROM commissions m
            JOIN collections c ON c.id = m.collection_id
            JOIN sales s ON s.id = m.sale_id
            JOIN clients cl ON cl.id = c.client_id
            WHERE m.representative_id = ?1
              AND m.collected_on BETWEEN ?2 AND ?3
            ORDER BY m.collected_on, c.code
            "#,
        )
        .bind(representative_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            representative = %representative_id,
            year,
            month,
            rows = rows.len(),
            "Monthly statement assembled"
        );

        Ok(MonthlyStatement::new(&representative, year, month, rows)?)
    }

    /// Closes a month's payout: flips the representative's pending
    /// commissions dated inside the month to paid.
    ///
    /// Returns how many rows were flipped. Reversed commissions are never
    /// touched, and a second close of the same month flips nothing.
    pub async fn mark_period_paid(
        &self,
        representative_id: &str,
        year: i32,
        month: u32,
    ) -> LedgerResult<u64> {
        let (start, end) = month_bounds(year, month)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE commissions SET status = ?4, updated_at = ?5
            WHERE representative_id = ?1
              AND collected_on BETWEEN ?2 AND ?3
              AND status = ?6
            "#,
        )
        .bind(representative_id)
        .bind(start)
        .bind(end)
        .bind(CommissionStatus::Paid)
        .bind(now)
        .bind(CommissionStatus::Pending)
        .execute(&self.pool)
        .await?;

        debug!(
            representative = %representative_id,
            year,
            month,
            paid = result.rows_affected(),
            "Commission period closed"
        );

        Ok(result.rows_affected())
    }
}

/// Inserts the commission row derived for a collection.
///
/// Runs inside the confirmation transaction, so the commission exists if
/// and only if the balance effects landed. The UNIQUE key on
/// `collection_id` makes a second materialization for the same collection
/// a no-op: one collection can never pay twice.
pub(crate) async fn materialize(
    conn: &mut SqliteConnection,
    draft: &CommissionDraft,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO commissions (
            id, sale_id, collection_id, representative_id,
            amount_base_cents, rate_bps, days_elapsed, bucket,
            collected_on, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT (collection_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&draft.sale_id)
    .bind(&draft.collection_id)
    .bind(&draft.representative_id)
    .bind(draft.amount_base_cents)
    .bind(draft.rate_bps)
    .bind(draft.days_elapsed)
    .bind(draft.bucket)
    .bind(draft.collected_on)
    .bind(CommissionStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
