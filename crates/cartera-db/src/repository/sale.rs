//! # Sale Ledger Repository
//!
//! Database operations for sales and their line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Sale { status: Pending, outstanding == total }      │
//! │         (one transaction: code counter, stock decrements per line,    │
//! │          item snapshots, client balance += total)                      │
//! │                                                                         │
//! │  2. SHIP                                                               │
//! │     └── update_tracking() → Sale { status: Shipped }                   │
//! │                                                                         │
//! │  3. COLLECT (collection ledger)                                        │
//! │     └── confirmed collections decrement outstanding;                   │
//! │         outstanding == 0 auto-completes the sale                       │
//! │                                                                         │
//! │  4. (OPTIONAL) VOID                                                    │
//! │     └── void() → Sale { status: Voided, outstanding: 0 }               │
//! │         (client balance -= former outstanding, full stock restore)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status decisions are never made here: every write goes through the
//! resolution rules on [`SaleStatus`].

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::{next_counter, SALE_CODE_COUNTER};
use cartera_core::{validation, CoreError, Money, Product, Sale, SaleItem, SaleStatus};

/// One requested line on a new sale.
///
/// The unit price is optional: omitted, the product's current list price is
/// frozen onto the line; given, the override is frozen instead (negotiated
/// wholesale pricing).
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
}

/// Repository for sale ledger operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale with its line items.
    ///
    /// ## Atomic Unit
    /// 1. Allocate the next `V` code from the counter
    /// 2. Per line: freeze the product name/price, decrement stock with a
    ///    conditional update (the WHERE clause IS the stock check)
    /// 3. Insert the sale with `outstanding == total`
    /// 4. Client pending balance `+= total`
    ///
    /// Any line failing the stock check aborts the whole creation; the
    /// transaction rolls back every prior decrement.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - no lines, bad quantity, bad price
    /// * `CoreError::InsufficientStock` - a line exceeds available stock
    /// * `DbError::NotFound` - unknown product or client
    pub async fn create(
        &self,
        client_id: &str,
        representative_id: &str,
        issued_on: NaiveDate,
        lines: &[SaleLine],
        notes: Option<String>,
    ) -> LedgerResult<Sale> {
        validation::validate_uuid(client_id)?;
        validation::validate_uuid(representative_id)?;
        validation::validate_sale_lines(lines.len())?;
        for line in lines {
            validation::validate_quantity(line.quantity)?;
            if let Some(cents) = line.unit_price_cents {
                validation::validate_price_cents(cents)?;
            }
        }

        let mut tx = self.pool.begin().await?;

        let seq = next_counter(&mut tx, SALE_CODE_COUNTER).await?;
        let code = Sale::format_code(seq);
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, code = %code, lines = lines.len(), "Creating sale");

        let mut items: Vec<SaleItem> = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, name, price_cents, stock, created_at, updated_at
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(&line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

            // Conditional decrement: two racing sales cannot both take the
            // last units, whichever loses sees rows_affected() == 0.
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            let unit_price_cents = line.unit_price_cents.unwrap_or(product.price_cents);
            let line_total = Money::from_cents(unit_price_cents).multiply_quantity(line.quantity);
            total = total + line_total;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: id.clone(),
                product_id: product.id,
                name_snapshot: product.name,
                unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line_total.cents(),
                created_at: now,
            });
        }

        let sale = Sale {
            id,
            code,
            client_id: client_id.to_string(),
            representative_id: representative_id.to_string(),
            issued_on,
            total_cents: total.cents(),
            outstanding_cents: total.cents(),
            status: SaleStatus::Pending,
            tracking_ref: None,
            notes,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, code, client_id, representative_id, issued_on,
                total_cents, outstanding_cents, status,
                tracking_ref, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.code)
        .bind(&sale.client_id)
        .bind(&sale.representative_id)
        .bind(sale.issued_on)
        .bind(sale.total_cents)
        .bind(sale.outstanding_cents)
        .bind(sale.status)
        .bind(&sale.tracking_ref)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                pending_balance_cents = pending_balance_cents + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&sale.client_id)
        .bind(sale.total_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", client_id).into());
        }

        tx.commit().await?;

        debug!(code = %sale.code, total_cents = sale.total_cents, "Sale created");
        Ok(sale)
    }

    /// Stores a carrier tracking reference on a sale.
    ///
    /// Assigning tracking is what ships a sale: a pending sale moves to
    /// shipped. A fully collected sale is forced to completed, a voided
    /// sale keeps the reference but never leaves voided.
    pub async fn update_tracking(&self, sale_id: &str, tracking: &str) -> LedgerResult<Sale> {
        let tracking = validation::validate_tracking_ref(tracking)?;

        let mut tx = self.pool.begin().await?;
        let sale = fetch_sale(&mut *tx, sale_id).await?;

        let next = sale.status.after_tracking(sale.outstanding());
        let now = Utc::now();

        debug!(code = %sale.code, tracking = %tracking, status = %next, "Updating tracking");

        sqlx::query(
            r#"
            UPDATE sales SET tracking_ref = ?2, status = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&sale.id)
        .bind(&tracking)
        .bind(next)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Sale {
            tracking_ref: Some(tracking),
            status: next,
            updated_at: now,
            ..sale
        })
    }

    /// Writes a requested lifecycle status through the resolution rule.
    ///
    /// The stored status may differ from the request: a fully collected
    /// sale lands on completed whatever was asked. Requesting voided runs
    /// the full void path with its compensations.
    ///
    /// ## Errors
    /// * `CoreError::InvalidTransition` - backward move, completed while
    ///   owing, or any attempt to leave voided
    pub async fn set_status(&self, sale_id: &str, requested: SaleStatus) -> LedgerResult<Sale> {
        if requested == SaleStatus::Voided {
            return self.void(sale_id).await;
        }

        let mut tx = self.pool.begin().await?;
        let sale = fetch_sale(&mut *tx, sale_id).await?;

        let next = sale
            .status
            .resolve_write(requested, sale.outstanding(), &sale.code)?;
        let now = Utc::now();

        debug!(code = %sale.code, from = %sale.status, to = %next, "Setting sale status");

        sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&sale.id)
            .bind(next)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Sale {
            status: next,
            updated_at: now,
            ..sale
        })
    }

    /// Voids a sale. Idempotent: voiding a voided sale is a no-op.
    ///
    /// ## Atomic Unit
    /// 1. Client pending balance `-=` the CURRENTLY outstanding portion
    ///    (confirmed collections keep their effects)
    /// 2. Stock restored in full for every line item
    /// 3. Outstanding zeroed, status voided
    pub async fn void(&self, sale_id: &str) -> LedgerResult<Sale> {
        let mut tx = self.pool.begin().await?;
        let sale = fetch_sale(&mut *tx, sale_id).await?;

        if sale.status == SaleStatus::Voided {
            return Ok(sale);
        }

        let next = sale
            .status
            .resolve_write(SaleStatus::Voided, sale.outstanding(), &sale.code)?;
        let now = Utc::now();

        debug!(code = %sale.code, outstanding_cents = sale.outstanding_cents, "Voiding sale");

        if sale.outstanding_cents > 0 {
            sqlx::query(
                r#"
                UPDATE clients SET
                    pending_balance_cents = pending_balance_cents - ?2,
                    updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&sale.client_id)
            .bind(sale.outstanding_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let items = fetch_items(&mut *tx, &sale.id).await?;
        for item in &items {
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&item.product_id)
                .bind(item.quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE sales SET status = ?2, outstanding_cents = 0, updated_at = ?3 WHERE id = ?1",
        )
        .bind(&sale.id)
        .bind(next)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Sale {
            status: next,
            outstanding_cents: 0,
            updated_at: now,
            ..sale
        })
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, client_id, representative_id, issued_on,
                   total_cents, outstanding_cents, status,
                   tracking_ref, notes, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by its business code (e.g. `V000000042`).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, client_id, representative_id, issued_on,
                   total_cents, outstanding_cents, status,
                   tracking_ref, notes, created_at, updated_at
            FROM sales
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists a representative's sales, newest first.
    pub async fn list_by_representative(&self, representative_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, client_id, representative_id, issued_on,
                   total_cents, outstanding_cents, status,
                   tracking_ref, notes, created_at, updated_at
            FROM sales
            WHERE representative_id = ?1
            ORDER BY issued_on DESC, code DESC
            "#,
        )
        .bind(representative_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets all line items for a sale.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        let items = fetch_items(&mut conn, sale_id).await?;
        Ok(items)
    }
}

/// Loads a sale row inside a transaction, or reports it missing.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> LedgerResult<Sale> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, code, client_id, representative_id, issued_on,
               total_cents, outstanding_cents, status,
               tracking_ref, notes, created_at, updated_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .fetch_optional(conn)
    .await?;

    sale.ok_or_else(|| DbError::not_found("Sale", sale_id).into())
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, name_snapshot,
               unit_price_cents, quantity, line_total_cents, created_at
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY created_at
        "#,
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
