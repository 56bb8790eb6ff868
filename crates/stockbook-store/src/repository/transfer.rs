//! # Transfer Engine
//!
//! Atomic cross-table stock movements between the two locations.
//!
//! ## Common Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Check-Then-Act Transfer                     │
//! │                                                             │
//! │  BEGIN                                                      │
//! │    │                                                        │
//! │    ├── read current quantity (debited side)                 │
//! │    ├── validate: requested ≤ available, else                │
//! │    │   InsufficientStock and ROLLBACK                       │
//! │    ├── write new quantity                                   │
//! │    ├── write counterpart table (upsert / delete-at-zero)    │
//! │    │                                                        │
//! │  COMMIT   (any failure → ROLLBACK, both tables untouched)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! No partial transfer is ever observable: readers outside the transaction
//! see either the full before-state or the full after-state. The write
//! serializer guarantees no second mutation interleaves between the check
//! and the act.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use stockbook_core::validation::validate_transfer_quantity;

/// Repository for atomic move/sell/return operations.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    /// Creates a new TransferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    /// Moves stock from the source location to the destination location.
    ///
    /// Decrements the source quantity and upserts the destination row,
    /// caching the source name on first transfer-in.
    ///
    /// ## Errors
    /// - `Validation` - quantity ≤ 0
    /// - `NotFound` - no source row for `article_id`
    /// - `InsufficientStock` - quantity exceeds source stock
    pub async fn move_to_secondary(&self, article_id: i64, quantity: i64) -> LedgerResult<()> {
        let quantity = validate_transfer_quantity(quantity)?;

        debug!(article_id, quantity, "Moving stock to secondary");

        let mut tx = self.pool.begin().await?;

        let source: Option<(i64, String)> =
            sqlx::query_as("SELECT quantity, name FROM articles WHERE id = ?1")
                .bind(article_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (available, name) = source.ok_or_else(|| LedgerError::not_found("article", article_id))?;

        if quantity > available {
            return Err(LedgerError::insufficient(name, available, quantity));
        }

        sqlx::query("UPDATE articles SET quantity = quantity - ?2 WHERE id = ?1")
            .bind(article_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO secondary_stock (article_id, name, quantity) VALUES (?1, ?2, ?3)
            ON CONFLICT (article_id) DO UPDATE SET
                quantity = secondary_stock.quantity + excluded.quantity,
                name = COALESCE(NULLIF(secondary_stock.name, ''), excluded.name)
            "#,
        )
        .bind(article_id)
        .bind(&name)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sells stock out of the destination location.
    ///
    /// Decrements the destination quantity; the row is deleted entirely once
    /// it reaches zero. The article's price row is untouched.
    ///
    /// ## Errors
    /// - `Validation` - quantity ≤ 0
    /// - `NotFound` - no destination row for `article_id`
    /// - `InsufficientStock` - quantity exceeds destination stock
    pub async fn sell_secondary(&self, article_id: i64, quantity: i64) -> LedgerResult<()> {
        let quantity = validate_transfer_quantity(quantity)?;

        debug!(article_id, quantity, "Selling from secondary");

        let mut tx = self.pool.begin().await?;

        let (available, name) = self.read_secondary(&mut tx, article_id).await?;

        if quantity > available {
            return Err(LedgerError::insufficient(name, available, quantity));
        }

        self.debit_secondary(&mut tx, article_id, available, quantity)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Returns stock from the destination location back to the source.
    ///
    /// Decrements/deletes the destination row like a sale, then upserts the
    /// source row. If the article identity no longer exists at the source,
    /// the row is re-created with a fresh next display position.
    ///
    /// ## Errors
    /// - `Validation` - quantity ≤ 0
    /// - `NotFound` - no destination row for `article_id`
    /// - `InsufficientStock` - quantity exceeds destination stock
    pub async fn return_to_main(&self, article_id: i64, quantity: i64) -> LedgerResult<()> {
        let quantity = validate_transfer_quantity(quantity)?;

        debug!(article_id, quantity, "Returning stock to main");

        let mut tx = self.pool.begin().await?;

        let (available, name) = self.read_secondary(&mut tx, article_id).await?;

        if quantity > available {
            return Err(LedgerError::insufficient(name, available, quantity));
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = ?1")
            .bind(article_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_some() {
            sqlx::query("UPDATE articles SET quantity = quantity + ?2 WHERE id = ?1")
                .bind(article_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        } else {
            let next_position: i64 =
                sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) + 1 FROM articles")
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                "INSERT INTO articles (id, name, quantity, position) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(article_id)
            .bind(&name)
            .bind(quantity)
            .bind(next_position)
            .execute(&mut *tx)
            .await?;
        }

        self.debit_secondary(&mut tx, article_id, available, quantity)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Reads the destination row inside the transfer transaction.
    ///
    /// The name is coalesced from the source row when the cache is empty,
    /// so error messages and re-created source rows carry a real name.
    async fn read_secondary(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        article_id: i64,
    ) -> LedgerResult<(i64, String)> {
        let row: Option<(i64, String)> = sqlx::query_as(
            r#"
            SELECT s.quantity, COALESCE(NULLIF(s.name, ''), a.name, '') AS name
            FROM secondary_stock s
            LEFT JOIN articles a ON a.id = s.article_id
            WHERE s.article_id = ?1
            "#,
        )
        .bind(article_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.ok_or_else(|| LedgerError::not_found("secondary stock", article_id))
    }

    /// Decrements the destination row, deleting it once it reaches zero.
    async fn debit_secondary(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        article_id: i64,
        available: i64,
        quantity: i64,
    ) -> LedgerResult<()> {
        let remaining = available - quantity;

        if remaining <= 0 {
            sqlx::query("DELETE FROM secondary_stock WHERE article_id = ?1")
                .bind(article_id)
                .execute(&mut **tx)
                .await?;
        } else {
            sqlx::query("UPDATE secondary_stock SET quantity = ?2 WHERE article_id = ?1")
                .bind(article_id)
                .bind(remaining)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
