//! # Article Repository
//!
//! The ledger store: CRUD over source stock, the destination stock cache,
//! and prices.
//!
//! ## Key Operations
//! - Merge-on-add (no duplicate names, quantities accumulate)
//! - Position-ordered fetches for both locations
//! - Transactional bulk reorder
//! - Price upsert, decoupled from stock levels

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use stockbook_core::validation::{validate_article_name, validate_price, validate_quantity};
use stockbook_core::{Article, PriceEntry, SecondaryStockEntry};

/// Repository for source stock, destination stock reads, and prices.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    pool: SqlitePool,
}

impl ArticleRepository {
    /// Creates a new ArticleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ArticleRepository { pool }
    }

    // =========================================================================
    // Source Stock
    // =========================================================================

    /// Adds stock at the source location.
    ///
    /// If an article with this name already exists, its quantity is
    /// incremented and its position left unchanged - no duplicate row.
    /// Otherwise a new row is created at the end of the display order
    /// (max(position) + 1).
    pub async fn add(&self, name: &str, quantity: i64) -> LedgerResult<Article> {
        let name = validate_article_name(name)?;
        let quantity = validate_quantity(quantity)?;

        debug!(name = %name, quantity, "Adding article");

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;

        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE articles SET quantity = quantity + ?2 WHERE id = ?1")
                    .bind(id)
                    .bind(quantity)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => {
                let next_position: i64 =
                    sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) + 1 FROM articles")
                        .fetch_one(&mut *tx)
                        .await?;

                let result = sqlx::query(
                    "INSERT INTO articles (name, quantity, position) VALUES (?1, ?2, ?3)",
                )
                .bind(name)
                .bind(quantity)
                .bind(next_position)
                .execute(&mut *tx)
                .await?;

                result.last_insert_rowid()
            }
        };

        let article = sqlx::query_as::<_, Article>(
            "SELECT id, name, quantity, position FROM articles WHERE id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(article)
    }

    /// Fetches all source stock rows, ordered by position then name.
    pub async fn fetch_all(&self) -> LedgerResult<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            "SELECT id, name, quantity, position FROM articles ORDER BY position, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    /// Total units on hand at the source location. 0 on an empty table.
    pub async fn total_quantity(&self) -> LedgerResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM articles")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    /// Overwrites an article's name and quantity unconditionally.
    ///
    /// Deliberately performs no quantity validation - unlike the transfer
    /// engine, this path accepts any value the caller supplies, including a
    /// negative quantity. The asymmetry is historical behavior; see
    /// DESIGN.md before "fixing" it.
    pub async fn update(&self, id: i64, name: &str, quantity: i64) -> LedgerResult<()> {
        debug!(id, name = %name, quantity, "Updating article");

        let result = sqlx::query("UPDATE articles SET name = ?2, quantity = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found("article", id));
        }

        Ok(())
    }

    /// Deletes a source stock row.
    ///
    /// Cascades to the article's price and destination rows via foreign
    /// keys. Historical order snapshots are untouched.
    pub async fn delete(&self, id: i64) -> LedgerResult<()> {
        debug!(id, "Deleting article");

        let result = sqlx::query("DELETE FROM articles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found("article", id));
        }

        Ok(())
    }

    /// Reassigns display positions 1..N following the given id sequence.
    ///
    /// Runs in one transaction: any failure (including an unknown id) rolls
    /// back every position change.
    pub async fn reorder(&self, ordered_ids: &[i64]) -> LedgerResult<()> {
        debug!(count = ordered_ids.len(), "Reordering articles");

        let mut tx = self.pool.begin().await?;

        for (index, id) in ordered_ids.iter().enumerate() {
            let position = index as i64 + 1;
            let result = sqlx::query("UPDATE articles SET position = ?2 WHERE id = ?1")
                .bind(*id)
                .bind(position)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(LedgerError::not_found("article", *id));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Destination Stock (reads; mutations live in the transfer engine)
    // =========================================================================

    /// Fetches all destination stock rows, ordered by the source article's
    /// position then name.
    ///
    /// A missing cached name is coalesced from the source row. Rows whose
    /// source article no longer exists sort last (pre-cascade legacy data).
    pub async fn fetch_secondary(&self) -> LedgerResult<Vec<SecondaryStockEntry>> {
        let entries = sqlx::query_as::<_, SecondaryStockEntry>(
            r#"
            SELECT
                s.article_id,
                COALESCE(NULLIF(s.name, ''), a.name, '') AS name,
                s.quantity
            FROM secondary_stock s
            LEFT JOIN articles a ON a.id = s.article_id
            ORDER BY (a.position IS NULL), a.position, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    // Prices
    // =========================================================================

    /// Fetches all price rows.
    pub async fn fetch_prices(&self) -> LedgerResult<Vec<PriceEntry>> {
        let prices =
            sqlx::query_as::<_, PriceEntry>("SELECT article_id, price FROM prices ORDER BY article_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(prices)
    }

    /// Sets the unit price for an article (upsert).
    ///
    /// The price row is independent of stock: it persists when either
    /// location's quantity reaches zero, and goes away only with the
    /// article itself.
    pub async fn set_price(&self, article_id: i64, price: f64) -> LedgerResult<()> {
        let price = validate_price(price)?;

        debug!(article_id, price, "Setting price");

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = ?1")
            .bind(article_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(LedgerError::not_found("article", article_id));
        }

        sqlx::query(
            r#"
            INSERT INTO prices (article_id, price) VALUES (?1, ?2)
            ON CONFLICT (article_id) DO UPDATE SET price = excluded.price
            "#,
        )
        .bind(article_id)
        .bind(price)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Ledger, LedgerConfig};

    async fn ledger() -> Ledger {
        Ledger::open(LedgerConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_merges_on_name() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let first = repo.add("Widget", 5).await.unwrap();
        let merged = repo.add("Widget", 3).await.unwrap();

        assert_eq!(first.id, merged.id);
        assert_eq!(merged.quantity, 8);
        assert_eq!(merged.position, first.position);

        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Widget");
    }

    #[tokio::test]
    async fn test_add_assigns_next_position() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("A", 1).await.unwrap();
        let b = repo.add("B", 1).await.unwrap();
        assert!(b.position > a.position);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        assert!(matches!(
            repo.add("", 1).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            repo.add("Widget", -1).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_is_unvalidated_overwrite() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("Widget", 5).await.unwrap();
        // Negative quantity passes through; historical behavior.
        repo.update(a.id, "Gadget", -2).await.unwrap();

        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all[0].name, "Gadget");
        assert_eq!(all[0].quantity, -2);
    }

    #[tokio::test]
    async fn test_update_to_taken_name_is_constraint_error() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        repo.add("A", 1).await.unwrap();
        let b = repo.add("B", 1).await.unwrap();

        // Unlike add, update has no merge path; the unique index fires.
        assert!(matches!(
            repo.update(b.id, "A", 1).await,
            Err(LedgerError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        assert!(matches!(
            repo.update(999, "X", 1).await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_price_and_secondary() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("Widget", 10).await.unwrap();
        repo.set_price(a.id, 2.5).await.unwrap();
        ledger.transfers().move_to_secondary(a.id, 4).await.unwrap();

        repo.delete(a.id).await.unwrap();

        assert!(repo.fetch_all().await.unwrap().is_empty());
        assert!(repo.fetch_prices().await.unwrap().is_empty());
        assert!(repo.fetch_secondary().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reorder_rolls_back_on_unknown_id() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("A", 1).await.unwrap();
        let b = repo.add("B", 1).await.unwrap();

        let err = repo.reorder(&[b.id, 999, a.id]).await;
        assert!(matches!(err, Err(LedgerError::NotFound { .. })));

        // Positions unchanged: A still sorts before B.
        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all[0].name, "A");
        assert_eq!(all[1].name, "B");
    }

    #[tokio::test]
    async fn test_reorder_assigns_dense_positions() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("A", 1).await.unwrap();
        let b = repo.add("B", 1).await.unwrap();
        let c = repo.add("C", 1).await.unwrap();

        repo.reorder(&[c.id, a.id, b.id]).await.unwrap();

        let all = repo.fetch_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(all[0].position, 1);
        assert_eq!(all[2].position, 3);
    }

    #[tokio::test]
    async fn test_total_quantity_defaults_to_zero() {
        let ledger = ledger().await;
        assert_eq!(ledger.articles().total_quantity().await.unwrap(), 0);

        ledger.articles().add("A", 7).await.unwrap();
        ledger.articles().add("B", 5).await.unwrap();
        assert_eq!(ledger.articles().total_quantity().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_set_price_upserts_and_checks_existence() {
        let ledger = ledger().await;
        let repo = ledger.articles();

        let a = repo.add("Widget", 1).await.unwrap();
        repo.set_price(a.id, 2.0).await.unwrap();
        repo.set_price(a.id, 3.5).await.unwrap();

        let prices = repo.fetch_prices().await.unwrap();
        assert_eq!(prices.len(), 1);
        assert!((prices[0].price - 3.5).abs() < f64::EPSILON);

        assert!(matches!(
            repo.set_price(999, 1.0).await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            repo.set_price(a.id, -1.0).await,
            Err(LedgerError::Validation(_))
        ));
    }
}
