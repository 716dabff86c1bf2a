//! # Reference Registry Repository
//!
//! Persistence for the reference data the ledgers read and adjust:
//! representatives, clients, and products.
//!
//! The engine does not own these registries (the surrounding application
//! manages them); this repository exists so the ledger operations have real
//! collaborators. Two aggregates ARE ledger-owned and only ever change
//! through ledger operations: the client pending balance and the product
//! stock. The insert/get operations here never touch them outside of their
//! initial values.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, LedgerResult};
use cartera_core::{validation, Client, Product, Representative};

/// Repository for reference-registry database operations.
#[derive(Debug, Clone)]
pub struct RegistryRepository {
    pool: SqlitePool,
}

impl RegistryRepository {
    /// Creates a new RegistryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegistryRepository { pool }
    }

    // ===== Representatives =====

    /// Inserts a representative.
    pub async fn insert_representative(&self, rep: &Representative) -> LedgerResult<()> {
        validation::validate_name(&rep.name)?;

        debug!(id = %rep.id, name = %rep.name, "Inserting representative");

        sqlx::query(
            r#"
            INSERT INTO representatives (id, name, phone, zone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&rep.id)
        .bind(&rep.name)
        .bind(&rep.phone)
        .bind(&rep.zone)
        .bind(rep.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a representative by ID.
    pub async fn get_representative(&self, id: &str) -> DbResult<Option<Representative>> {
        let rep = sqlx::query_as::<_, Representative>(
            r#"
            SELECT id, name, phone, zone, created_at
            FROM representatives
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rep)
    }

    /// Counts registered representatives.
    ///
    /// ## Usage
    /// The seed binary checks this to avoid double-seeding a database.
    pub async fn count_representatives(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM representatives")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // ===== Clients =====

    /// Inserts a client.
    pub async fn insert_client(&self, client: &Client) -> LedgerResult<()> {
        validation::validate_name(&client.name)?;

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, address, phone, pending_balance_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(client.pending_balance_cents)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a client by ID.
    pub async fn get_client(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, address, phone, pending_balance_cents,
                   created_at, updated_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    // ===== Products =====

    /// Inserts a product.
    pub async fn insert_product(&self, product: &Product) -> LedgerResult<()> {
        validation::validate_name(&product.name)?;
        validation::validate_price_cents(product.price_cents)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets the current stock level of a product.
    pub async fn product_stock(&self, id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
