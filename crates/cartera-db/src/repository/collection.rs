//! # Collection Ledger Repository
//!
//! Database operations for collections (payments received against sales).
//!
//! ## Collection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Collection Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE (pending)                                                   │
//! │     └── create() inserts through the reservation guard:                │
//! │         cash + check ≤ outstanding − Σ other pending collections      │
//! │         The guard is the WHERE clause of the insert itself, so two    │
//! │         racing registrations can never jointly over-reserve a sale.   │
//! │                                                                         │
//! │  2a. CONFIRM (pending → confirmed)   money actually arrived            │
//! │      └── confirm() in one transaction:                                 │
//! │          flip status, sale outstanding -= total, status resolution,   │
//! │          client balance -= total, commission row derived + inserted   │
//! │                                                                         │
//! │  2b. VOID (pending → voided)         registration was a mistake        │
//! │      └── void() releases the reserved amount, nothing else moves      │
//! │                                                                         │
//! │  3. REVERSE (confirmed → voided)     bounced check, bank error         │
//! │     └── reverse() puts the money back on the sale and the client      │
//! │         and marks the commission reversed                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pending collections reserve capacity but move no money: sale outstanding
//! and client balance change only on confirm (and change back on reverse).

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::sale::fetch_sale;
use crate::repository::{next_counter, settlement, COLLECTION_CODE_COUNTER};
use cartera_core::aging::RateSchedule;
use cartera_core::settlement::derive_commission;
use cartera_core::{
    validation, Collection, CollectionStatus, CommissionStatus, CoreError, Money, SaleStatus,
    ValidationError,
};

/// Check metadata captured alongside a check payment.
#[derive(Debug, Clone)]
pub struct CheckDetails {
    pub bank: String,
    pub number: String,
    pub issued_on: Option<NaiveDate>,
}

/// Repository for collection ledger operations.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: SqlitePool,
}

impl CollectionRepository {
    /// Creates a new CollectionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CollectionRepository { pool }
    }

    /// Registers a pending collection against a sale.
    ///
    /// ## The Reservation Guard
    /// The insert only lands when
    /// `cash + check ≤ outstanding − Σ(other pending collections)`,
    /// and that comparison happens inside the insert statement itself.
    /// Capacity already promised to pending registrations cannot be
    /// promised twice, no matter how the calls interleave.
    ///
    /// The sale's outstanding balance does not move here: a pending
    /// collection is a promise, not money.
    ///
    /// ## Errors
    /// * `CoreError::Overpayment` - amount exceeds unreserved outstanding
    ///   (a voided sale has zero outstanding, so it rejects the same way)
    /// * `CoreError::Validation` - non-positive tender, or `client_id`
    ///   naming a different client than the sale
    /// * `DbError::NotFound` - unknown sale
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        sale_id: &str,
        client_id: &str,
        representative_id: &str,
        collected_on: NaiveDate,
        cash_cents: i64,
        check_cents: i64,
        check: Option<CheckDetails>,
        remarks: Option<String>,
    ) -> LedgerResult<Collection> {
        validation::validate_uuid(representative_id)?;
        validation::validate_tender(cash_cents, check_cents)?;
        let total = cash_cents + check_cents;

        let mut tx = self.pool.begin().await?;
        let sale = fetch_sale(&mut *tx, sale_id).await?;

        if sale.client_id != client_id {
            return Err(ValidationError::InvalidFormat {
                field: "client_id".to_string(),
                reason: format!("does not match the client on sale {}", sale.code),
            }
            .into());
        }

        let seq = next_counter(&mut tx, COLLECTION_CODE_COUNTER).await?;
        let code = Collection::format_code(seq);
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let (check_bank, check_number, check_issued_on) = match check {
            Some(details) => (Some(details.bank), Some(details.number), details.issued_on),
            None => (None, None, None),
        };

        debug!(id = %id, code = %code, sale = %sale.code, total_cents = total, "Registering collection");

        let result = sqlx::query(
            r#"
            INSERT INTO collections (
                id, code, sale_id, client_id, representative_id, collected_on,
                cash_cents, check_cents, check_bank, check_number, check_issued_on,
                remarks, status, created_at, updated_at
            )
            SELECT ?1, ?2, s.id, s.client_id, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13
            FROM sales s
            WHERE s.id = ?14
              AND s.outstanding_cents - (
                    SELECT COALESCE(SUM(c.cash_cents + c.check_cents), 0)
                    FROM collections c
                    WHERE c.sale_id = s.id AND c.status = 'pending'
              ) >= ?15
            "#,
        )
        .bind(&id)
        .bind(&code)
        .bind(representative_id)
        .bind(collected_on)
        .bind(cash_cents)
        .bind(check_cents)
        .bind(&check_bank)
        .bind(&check_number)
        .bind(check_issued_on)
        .bind(&remarks)
        .bind(CollectionStatus::Pending)
        .bind(now)
        .bind(now)
        .bind(sale_id)
        .bind(total)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Guard refused: report how much is actually still collectable.
            let reserved: i64 = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(cash_cents + check_cents), 0)
                FROM collections
                WHERE sale_id = ?1 AND status = 'pending'
                "#,
            )
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(CoreError::Overpayment {
                sale_id: sale.code,
                outstanding_cents: sale.outstanding_cents - reserved,
                requested_cents: total,
            }
            .into());
        }

        tx.commit().await?;

        Ok(Collection {
            id,
            code,
            sale_id: sale.id,
            client_id: sale.client_id,
            representative_id: representative_id.to_string(),
            collected_on,
            cash_cents,
            check_cents,
            check_bank,
            check_number,
            check_issued_on,
            remarks,
            status: CollectionStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Confirms a pending collection: the money actually arrived.
    ///
    /// ## Atomic Unit
    /// 1. Flip the collection pending → confirmed (conditional update,
    ///    the gate against double confirmation)
    /// 2. Sale `outstanding -= total` (conditional on `outstanding >= total`)
    /// 3. Resolve the sale status against the new outstanding
    ///    (zero auto-completes the sale)
    /// 4. Client pending balance `-= total`
    /// 5. Derive the commission and insert it, keyed uniquely by this
    ///    collection
    ///
    /// Any step failing rolls back all of them.
    ///
    /// ## Errors
    /// * `CoreError::InvalidTransition` - collection is not pending
    /// * `CoreError::Overpayment` - outstanding shrank below this amount
    ///   since registration (also the shape a voided sale rejects with)
    /// * `CoreError::UnclassifiedAging` - more than 120 days after issue
    pub async fn confirm(
        &self,
        collection_id: &str,
        schedule: &RateSchedule,
    ) -> LedgerResult<Collection> {
        let mut tx = self.pool.begin().await?;

        let collection = fetch_collection(&mut *tx, collection_id).await?;
        collection.status.ensure_can_confirm(&collection.code)?;

        let sale = fetch_sale(&mut *tx, &collection.sale_id).await?;
        let total = collection.total().cents();
        let now = Utc::now();

        debug!(code = %collection.code, sale = %sale.code, total_cents = total, "Confirming collection");

        // Step 1: the gate. Exactly one confirmation can flip the row.
        let result = sqlx::query(
            "UPDATE collections SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(&collection.id)
        .bind(CollectionStatus::Confirmed)
        .bind(now)
        .bind(CollectionStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = fetch_collection(&mut *tx, collection_id).await?;
            current.status.ensure_can_confirm(&current.code)?;
            return Err(DbError::TransactionFailed(format!(
                "collection {} changed during confirm",
                current.code
            ))
            .into());
        }

        // Step 2: take the money off the sale, but never below zero.
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                outstanding_cents = outstanding_cents - ?2,
                updated_at = ?3
            WHERE id = ?1 AND outstanding_cents >= ?2
            "#,
        )
        .bind(&sale.id)
        .bind(total)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = fetch_sale(&mut *tx, &collection.sale_id).await?;
            return Err(CoreError::Overpayment {
                sale_id: current.code,
                outstanding_cents: current.outstanding_cents,
                requested_cents: total,
            }
            .into());
        }

        // Step 3: zero outstanding completes the sale.
        let remaining = Money::from_cents(sale.outstanding_cents - total);
        let next = sale.status.resolve_write(sale.status, remaining, &sale.code)?;
        if next != sale.status {
            sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&sale.id)
                .bind(next)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        // Step 4: the client owes that much less.
        sqlx::query(
            r#"
            UPDATE clients SET
                pending_balance_cents = pending_balance_cents - ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&collection.client_id)
        .bind(total)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Step 5: the commission is born in the same transaction.
        let draft = derive_commission(&sale, &collection, schedule)?;
        settlement::materialize(&mut *tx, &draft, now).await?;

        tx.commit().await?;

        debug!(code = %collection.code, bucket = %draft.bucket, commission_cents = draft.amount().cents(), "Collection confirmed");

        Ok(Collection {
            status: CollectionStatus::Confirmed,
            updated_at: now,
            ..collection
        })
    }

    /// Voids a pending collection, releasing its reservation.
    ///
    /// Only pending collections can be voided this way; a confirmed one
    /// has moved money and must go through [`reverse`](Self::reverse).
    pub async fn void(&self, collection_id: &str) -> LedgerResult<Collection> {
        let mut tx = self.pool.begin().await?;

        let collection = fetch_collection(&mut *tx, collection_id).await?;
        collection.status.ensure_can_void(&collection.code)?;

        let now = Utc::now();
        debug!(code = %collection.code, "Voiding collection");

        let result = sqlx::query(
            "UPDATE collections SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(&collection.id)
        .bind(CollectionStatus::Voided)
        .bind(now)
        .bind(CollectionStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = fetch_collection(&mut *tx, collection_id).await?;
            current.status.ensure_can_void(&current.code)?;
            return Err(DbError::TransactionFailed(format!(
                "collection {} changed during void",
                current.code
            ))
            .into());
        }

        tx.commit().await?;

        Ok(Collection {
            status: CollectionStatus::Voided,
            updated_at: now,
            ..collection
        })
    }

    /// Reverses a confirmed collection: the check bounced, the deposit
    /// failed, the money is gone again.
    ///
    /// ## Atomic Unit
    /// 1. Flip the collection confirmed → voided (the gate)
    /// 2. Sale `outstanding += total`; a completed sale reopens as shipped
    /// 3. Client pending balance `+= total`
    /// 4. The commission is marked reversed (the row stays, excluded from
    ///    payable totals)
    ///
    /// Rejected when the sale was voided in the meantime: a voided sale
    /// must keep zero outstanding, so its receivable cannot reopen.
    pub async fn reverse(&self, collection_id: &str) -> LedgerResult<Collection> {
        let mut tx = self.pool.begin().await?;

        let collection = fetch_collection(&mut *tx, collection_id).await?;
        collection.status.ensure_can_reverse(&collection.code)?;

        let sale = fetch_sale(&mut *tx, &collection.sale_id).await?;
        if sale.status == SaleStatus::Voided {
            return Err(CoreError::InvalidTransition {
                entity: "sale",
                id: sale.code,
                from: "voided",
                to: "shipped",
            }
            .into());
        }

        let total = collection.total().cents();
        let now = Utc::now();

        debug!(code = %collection.code, sale = %sale.code, total_cents = total, "Reversing collection");

        let result = sqlx::query(
            "UPDATE collections SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(&collection.id)
        .bind(CollectionStatus::Voided)
        .bind(now)
        .bind(CollectionStatus::Confirmed)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let current = fetch_collection(&mut *tx, collection_id).await?;
            current.status.ensure_can_reverse(&current.code)?;
            return Err(DbError::TransactionFailed(format!(
                "collection {} changed during reverse",
                current.code
            ))
            .into());
        }

        sqlx::query(
            r#"
            UPDATE sales SET
                outstanding_cents = outstanding_cents + ?2,
                status = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(total)
        .bind(sale.status.after_reversal())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE clients SET
                pending_balance_cents = pending_balance_cents + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&collection.client_id)
        .bind(total)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE commissions SET status = ?2, updated_at = ?3 WHERE collection_id = ?1",
        )
        .bind(&collection.id)
        .bind(CommissionStatus::Reversed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Collection {
            status: CollectionStatus::Voided,
            updated_at: now,
            ..collection
        })
    }

    /// Gets a collection by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, code, sale_id, client_id, representative_id, collected_on,
                   cash_cents, check_cents, check_bank, check_number, check_issued_on,
                   remarks, status, created_at, updated_at
            FROM collections
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    /// Gets a collection by its business code (e.g. `C000000017`).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, code, sale_id, client_id, representative_id, collected_on,
                   cash_cents, check_cents, check_bank, check_number, check_issued_on,
                   remarks, status, created_at, updated_at
            FROM collections
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    /// Lists all collections against a sale, oldest registration first.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, code, sale_id, client_id, representative_id, collected_on,
                   cash_cents, check_cents, check_bank, check_number, check_issued_on,
                   remarks, status, created_at, updated_at
            FROM collections
            WHERE sale_id = ?1
            ORDER BY code
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    /// Lists a representative's collections, newest first.
    pub async fn list_by_representative(&self, representative_id: &str) -> DbResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            r#"
            SELECT id, code, sale_id, client_id, representative_id, collected_on,
                   cash_cents, check_cents, check_bank, check_number, check_issued_on,
                   remarks, status, created_at, updated_at
            FROM collections
            WHERE representative_id = ?1
            ORDER BY collected_on DESC, code DESC
            "#,
        )
        .bind(representative_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }
}

/// Loads a collection row inside a transaction, or reports it missing.
pub(crate) async fn fetch_collection(
    conn: &mut SqliteConnection,
    collection_id: &str,
) -> LedgerResult<Collection> {
    let collection = sqlx::query_as::<_, Collection>(
        r#"
        SELECT id, code, sale_id, client_id, representative_id, collected_on,
               cash_cents, check_cents, check_bank, check_number, check_issued_on,
               remarks, status, created_at, updated_at
        FROM collections
        WHERE id = ?1
        "#,
    )
    .bind(collection_id)
    .fetch_optional(conn)
    .await?;

    collection.ok_or_else(|| DbError::not_found("Collection", collection_id).into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::SaleLine;
    use cartera_core::{AgingBucket, Client, Product, Representative, Sale, SaleStatus};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_registry(db: &Database) -> (String, String, String) {
        let now = Utc::now();
        let registry = db.registry();

        let rep = Representative {
            id: Uuid::new_v4().to_string(),
            name: "Elena Vargas".to_string(),
            phone: None,
            zone: Some("Norte".to_string()),
            created_at: now,
        };
        registry.insert_representative(&rep).await.unwrap();

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: "Farmacia San Rafael".to_string(),
            address: Some("Av. Central 123".to_string()),
            phone: Some("555-0101".to_string()),
            pending_balance_cents: 0,
            created_at: now,
            updated_at: now,
        };
        registry.insert_client(&client).await.unwrap();

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: "Amoxicillin 500mg".to_string(),
            price_cents: 100,
            stock: 500,
            created_at: now,
            updated_at: now,
        };
        registry.insert_product(&product).await.unwrap();

        (rep.id, client.id, product.id)
    }

    /// Creates a sale worth `total_cents` (product priced at 100/unit).
    async fn make_sale(
        db: &Database,
        rep_id: &str,
        client_id: &str,
        product_id: &str,
        issued_on: NaiveDate,
        total_cents: i64,
    ) -> Sale {
        db.sales()
            .create(
                client_id,
                rep_id,
                issued_on,
                &[SaleLine {
                    product_id: product_id.to_string(),
                    quantity: total_cents / 100,
                    unit_price_cents: None,
                }],
                None,
            )
            .await
            .unwrap()
    }

    async fn cash(
        db: &Database,
        sale: &Sale,
        rep_id: &str,
        collected_on: NaiveDate,
        cents: i64,
    ) -> LedgerResult<Collection> {
        db.collections()
            .create(&sale.id, &sale.client_id, rep_id, collected_on, cents, 0, None, None)
            .await
    }

    #[tokio::test]
    async fn test_create_collection() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        let collection = db
            .collections()
            .create(
                &sale.id,
                &client_id,
                &rep_id,
                date(2026, 8, 10),
                300,
                400,
                Some(CheckDetails {
                    bank: "Banco Nacional".to_string(),
                    number: "00451".to_string(),
                    issued_on: Some(date(2026, 8, 9)),
                }),
                Some("two tenders".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(collection.code, "C000000001");
        assert_eq!(collection.status, CollectionStatus::Pending);
        assert_eq!(collection.total().cents(), 700);
        assert_eq!(collection.check_bank.as_deref(), Some("Banco Nacional"));

        // Registration reserves but moves no money
        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.outstanding_cents, 1_000);

        let second = cash(&db, &sale, &rep_id, date(2026, 8, 11), 100).await.unwrap();
        assert_eq!(second.code, "C000000002");
    }

    #[tokio::test]
    async fn test_create_rejects_overpayment() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 500).await;

        let err = cash(&db, &sale, &rep_id, date(2026, 8, 10), 600).await.unwrap_err();
        match err {
            LedgerError::Domain(CoreError::Overpayment {
                sale_id,
                outstanding_cents,
                requested_cents,
            }) => {
                assert_eq!(sale_id, sale.code);
                assert_eq!(outstanding_cents, 500);
                assert_eq!(requested_cents, 600);
            }
            other => panic!("expected Overpayment, got {other:?}"),
        }

        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.outstanding_cents, 500);
        assert!(db.collections().list_by_sale(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_collections_reserve_capacity() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        let first = cash(&db, &sale, &rep_id, date(2026, 8, 10), 700).await.unwrap();

        // 700 of the 1000 is spoken for, 400 no longer fits
        let err = cash(&db, &sale, &rep_id, date(2026, 8, 11), 400).await.unwrap_err();
        match err {
            LedgerError::Domain(CoreError::Overpayment {
                outstanding_cents,
                requested_cents,
                ..
            }) => {
                assert_eq!(outstanding_cents, 300);
                assert_eq!(requested_cents, 400);
            }
            other => panic!("expected Overpayment, got {other:?}"),
        }

        // Voiding the reservation frees the capacity
        db.collections().void(&first.id).await.unwrap();
        let retry = cash(&db, &sale, &rep_id, date(2026, 8, 11), 400).await.unwrap();
        assert_eq!(retry.status, CollectionStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirm_decrements_outstanding_and_completes() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        db.sales().update_tracking(&sale.id, "TRK-1").await.unwrap();
        let schedule = RateSchedule::default();

        let first = cash(&db, &sale, &rep_id, date(2026, 8, 10), 400).await.unwrap();
        let confirmed = db.collections().confirm(&first.id, &schedule).await.unwrap();
        assert_eq!(confirmed.status, CollectionStatus::Confirmed);

        let after_first = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(after_first.outstanding_cents, 600);
        assert_eq!(after_first.status, SaleStatus::Shipped);

        let client = db.registry().get_client(&client_id).await.unwrap().unwrap();
        assert_eq!(client.pending_balance_cents, 600);

        // Collecting the remainder completes the sale on its own
        let second = cash(&db, &sale, &rep_id, date(2026, 8, 20), 600).await.unwrap();
        db.collections().confirm(&second.id, &schedule).await.unwrap();

        let after_second = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(after_second.outstanding_cents, 0);
        assert_eq!(after_second.status, SaleStatus::Completed);

        let client = db.registry().get_client(&client_id).await.unwrap().unwrap();
        assert_eq!(client.pending_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_confirm_twice_rejected() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        let schedule = RateSchedule::default();

        let collection = cash(&db, &sale, &rep_id, date(2026, 8, 10), 400).await.unwrap();
        db.collections().confirm(&collection.id, &schedule).await.unwrap();

        let err = db.collections().confirm(&collection.id, &schedule).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InvalidTransition { .. })
        ));

        // Decremented exactly once, one commission row
        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.outstanding_cents, 600);
        let commission = db.settlement().for_collection(&collection.id).await.unwrap();
        assert!(commission.is_some());
    }

    #[tokio::test]
    async fn test_confirmed_plus_outstanding_equals_total() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        let schedule = RateSchedule::default();

        for cents in [100, 250, 400] {
            let c = cash(&db, &sale, &rep_id, date(2026, 8, 10), cents).await.unwrap();
            db.collections().confirm(&c.id, &schedule).await.unwrap();
        }

        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        let confirmed: i64 = db
            .collections()
            .list_by_sale(&sale.id)
            .await
            .unwrap()
            .iter()
            .filter(|c| c.status == CollectionStatus::Confirmed)
            .map(|c| c.total().cents())
            .sum();
        assert_eq!(confirmed + sale.outstanding_cents, sale.total_cents);
        assert_eq!(sale.outstanding_cents, 250);
    }

    #[tokio::test]
    async fn test_void_applies_to_pending_only() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        let schedule = RateSchedule::default();

        let pending = cash(&db, &sale, &rep_id, date(2026, 8, 10), 300).await.unwrap();
        let voided = db.collections().void(&pending.id).await.unwrap();
        assert_eq!(voided.status, CollectionStatus::Voided);

        // Voided twice: no longer pending
        let err = db.collections().void(&pending.id).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InvalidTransition { .. })
        ));

        // A confirmed collection cannot be voided, only reversed
        let confirmed = cash(&db, &sale, &rep_id, date(2026, 8, 11), 300).await.unwrap();
        db.collections().confirm(&confirmed.id, &schedule).await.unwrap();
        let err = db.collections().void(&confirmed.id).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InvalidTransition { .. })
        ));

        // And a voided collection cannot be confirmed
        let err = db.collections().confirm(&pending.id, &schedule).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_reverse_restores_sale_and_marks_commission() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        db.sales().update_tracking(&sale.id, "TRK-7").await.unwrap();
        let schedule = RateSchedule::default();

        let collection = cash(&db, &sale, &rep_id, date(2026, 8, 10), 1_000).await.unwrap();
        db.collections().confirm(&collection.id, &schedule).await.unwrap();

        let paid_off = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(paid_off.status, SaleStatus::Completed);
        assert_eq!(paid_off.outstanding_cents, 0);

        let reversed = db.collections().reverse(&collection.id).await.unwrap();
        assert_eq!(reversed.status, CollectionStatus::Voided);

        // The receivable is back and the sale reopened
        let reopened = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(reopened.outstanding_cents, 1_000);
        assert_eq!(reopened.status, SaleStatus::Shipped);

        let client = db.registry().get_client(&client_id).await.unwrap().unwrap();
        assert_eq!(client.pending_balance_cents, 1_000);

        let commission = db
            .settlement()
            .for_collection(&collection.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commission.status, CommissionStatus::Reversed);
    }

    #[tokio::test]
    async fn test_reverse_requires_confirmed() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        let pending = cash(&db, &sale, &rep_id, date(2026, 8, 10), 300).await.unwrap();
        let err = db.collections().reverse(&pending.id).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_reverse_rejected_when_sale_voided() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        let schedule = RateSchedule::default();

        let collection = cash(&db, &sale, &rep_id, date(2026, 8, 10), 400).await.unwrap();
        db.collections().confirm(&collection.id, &schedule).await.unwrap();
        db.sales().void(&sale.id).await.unwrap();

        let err = db.collections().reverse(&collection.id).await.unwrap_err();
        match err {
            LedgerError::Domain(CoreError::InvalidTransition { entity, .. }) => {
                assert_eq!(entity, "sale");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_void_sale_after_partial_collection() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;
        let schedule = RateSchedule::default();

        let collection = cash(&db, &sale, &rep_id, date(2026, 8, 10), 800).await.unwrap();
        db.collections().confirm(&collection.id, &schedule).await.unwrap();

        // Client owes 200, 10 of 500 units are out
        let voided = db.sales().void(&sale.id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert_eq!(voided.outstanding_cents, 0);

        // Only the uncollected 200 comes off the client, stock returns in full
        let client = db.registry().get_client(&client_id).await.unwrap().unwrap();
        assert_eq!(client.pending_balance_cents, 0);
        assert_eq!(db.registry().product_stock(&product_id).await.unwrap(), 500);

        // The voided sale has no collectable capacity left
        let err = cash(&db, &voided, &rep_id, date(2026, 8, 12), 100).await.unwrap_err();
        match err {
            LedgerError::Domain(CoreError::Overpayment {
                outstanding_cents, ..
            }) => assert_eq!(outstanding_cents, 0),
            other => panic!("expected Overpayment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_aging_buckets_price_the_commission() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 7, 1), 1_000).await;
        let schedule = RateSchedule::default();

        // 10 days out: bucket A at 10%
        let quick = cash(&db, &sale, &rep_id, date(2026, 7, 11), 400).await.unwrap();
        db.collections().confirm(&quick.id, &schedule).await.unwrap();
        let commission = db
            .settlement()
            .for_collection(&quick.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commission.bucket, AgingBucket::A);
        assert_eq!(commission.days_elapsed, 10);
        assert_eq!(commission.rate_bps, 1_000);
        assert_eq!(commission.amount().cents(), 40);

        // 45 days out: bucket B at 7%
        let slow = cash(&db, &sale, &rep_id, date(2026, 8, 15), 600).await.unwrap();
        db.collections().confirm(&slow.id, &schedule).await.unwrap();
        let commission = db
            .settlement()
            .for_collection(&slow.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(commission.bucket, AgingBucket::B);
        assert_eq!(commission.days_elapsed, 45);
        assert_eq!(commission.rate_bps, 700);
        assert_eq!(commission.amount().cents(), 42);
    }

    #[tokio::test]
    async fn test_confirm_beyond_aging_window_rejected() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 1, 1), 1_000).await;
        let schedule = RateSchedule::default();

        // 121 days after issue: registration is fine, confirmation is not
        let collection = cash(&db, &sale, &rep_id, date(2026, 5, 2), 400).await.unwrap();
        let err = db.collections().confirm(&collection.id, &schedule).await.unwrap_err();
        match err {
            LedgerError::Domain(CoreError::UnclassifiedAging { days }) => assert_eq!(days, 121),
            other => panic!("expected UnclassifiedAging, got {other:?}"),
        }

        // The whole confirmation rolled back
        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.outstanding_cents, 1_000);
        let collection = db
            .collections()
            .get_by_id(&collection.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(collection.status, CollectionStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_cannot_over_reserve() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let db = db.clone();
            let sale_id = sale.id.clone();
            let client_id = client_id.clone();
            let rep_id = rep_id.clone();
            handles.push(tokio::spawn(async move {
                db.collections()
                    .create(
                        &sale_id,
                        &client_id,
                        &rep_id,
                        date(2026, 8, 10),
                        1_000,
                        0,
                        None,
                        None,
                    )
                    .await
            }));
        }

        let mut wins = 0;
        let mut overpayments = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(LedgerError::Domain(CoreError::Overpayment { .. })) => overpayments += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(overpayments, 3);

        // Exactly one reservation landed
        let pending: i64 = db
            .collections()
            .list_by_sale(&sale.id)
            .await
            .unwrap()
            .iter()
            .filter(|c| c.status == CollectionStatus::Pending)
            .map(|c| c.total().cents())
            .sum();
        assert_eq!(pending, 1_000);
    }

    #[tokio::test]
    async fn test_client_mismatch_rejected() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        let other = Client {
            id: Uuid::new_v4().to_string(),
            name: "Farmacia del Centro".to_string(),
            address: None,
            phone: None,
            pending_balance_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.registry().insert_client(&other).await.unwrap();

        let err = db
            .collections()
            .create(&sale.id, &other.id, &rep_id, date(2026, 8, 10), 100, 0, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Domain(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reads_by_code_sale_and_representative() {
        let db = test_db().await;
        let (rep_id, client_id, product_id) = seed_registry(&db).await;
        let sale = make_sale(&db, &rep_id, &client_id, &product_id, date(2026, 8, 1), 1_000).await;

        cash(&db, &sale, &rep_id, date(2026, 8, 10), 200).await.unwrap();
        cash(&db, &sale, &rep_id, date(2026, 8, 12), 300).await.unwrap();

        let found = db
            .collections()
            .get_by_code("C000000002")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.total().cents(), 300);

        let by_sale = db.collections().list_by_sale(&sale.id).await.unwrap();
        assert_eq!(by_sale.len(), 2);
        assert_eq!(by_sale[0].code, "C000000001");

        let by_rep = db.collections().list_by_representative(&rep_id).await.unwrap();
        assert_eq!(by_rep.len(), 2);
        // Newest first
        assert_eq!(by_rep[0].collected_on, date(2026, 8, 12));
    }
}
