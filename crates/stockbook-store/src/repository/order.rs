//! # Order Repository
//!
//! Immutable priced snapshots of completed sales.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Order Persistence                        │
//! │                                                             │
//! │  save_order("Bob", lines)                                   │
//! │    │                                                        │
//! │    ├── BEGIN                                                │
//! │    ├── INSERT client_orders (header)                        │
//! │    ├── INSERT client_order_items ×N  (frozen name/price)    │
//! │    └── COMMIT   (any failure discards the whole order)      │
//! │                                                             │
//! │  fetch_orders()   → totals recomputed from lines per query  │
//! │  fetch_order_items(id) → frozen snapshots, never live data  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers debit destination stock via `sell_secondary` *before* saving the
//! order. The two phases are separate transactions: after a contention
//! failure, retrying `save_order` blindly duplicates the order - re-query
//! history first.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use stockbook_core::validation::validate_client_name;
use stockbook_core::{ClientOrder, OrderItem, OrderItemDraft};

/// Repository for client order snapshots.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a completed sale: one header plus one line per item, in a
    /// single transaction.
    ///
    /// Line values are stored exactly as supplied - the engine never
    /// consults the live price or stock tables, so the snapshot stays true
    /// to what the client was actually charged.
    pub async fn save(&self, client: &str, items: &[OrderItemDraft]) -> LedgerResult<ClientOrder> {
        let client = validate_client_name(client)?;
        let created_at = Utc::now();

        debug!(client = %client, lines = items.len(), "Saving order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO client_orders (client, created_at) VALUES (?1, ?2)")
            .bind(client)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        let order_id = result.last_insert_rowid();

        let mut total = 0.0;
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO client_order_items (order_id, article_id, quantity, price, name)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(order_id)
            .bind(item.article_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(&item.name)
            .execute(&mut *tx)
            .await?;

            total += item.quantity as f64 * item.price;
        }

        tx.commit().await?;

        Ok(ClientOrder {
            id: order_id,
            client: client.to_string(),
            created_at,
            total,
        })
    }

    /// Fetches all order headers, newest first.
    ///
    /// Totals are Σ(quantity × price) over the line items, computed at query
    /// time. Recomputing on every read costs a join but cannot diverge from
    /// the lines the way a cached column could.
    pub async fn fetch_all(&self) -> LedgerResult<Vec<ClientOrder>> {
        let orders = sqlx::query_as::<_, ClientOrder>(
            r#"
            SELECT
                o.id,
                o.client,
                o.created_at,
                COALESCE(SUM(i.quantity * i.price), 0.0) AS total
            FROM client_orders o
            LEFT JOIN client_order_items i ON i.order_id = o.id
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Fetches the line items of one order.
    ///
    /// Rows keep their frozen name snapshot; only a legacy row with no
    /// snapshot falls back to the live article name (and to an empty string
    /// once that article is gone). An unknown order id yields an empty list.
    pub async fn fetch_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                i.id,
                i.order_id,
                i.article_id,
                i.quantity,
                i.price,
                COALESCE(NULLIF(i.name, ''), a.name, '') AS name
            FROM client_order_items i
            LEFT JOIN articles a ON a.id = i.article_id
            WHERE i.order_id = ?1
            ORDER BY i.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Deletes an order: header and items in one transaction, plus a
    /// best-effort removal of any map pin whose name matches the client.
    ///
    /// The pin link is a string match by convention - there is no key
    /// between pins and orders, and a renamed client leaves its pin behind.
    pub async fn delete(&self, order_id: i64) -> LedgerResult<()> {
        debug!(order_id, "Deleting order");

        let mut tx = self.pool.begin().await?;

        let client: Option<String> =
            sqlx::query_scalar("SELECT client FROM client_orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;

        let client = client.ok_or_else(|| LedgerError::not_found("order", order_id))?;

        // Items go with the header via ON DELETE CASCADE.
        sqlx::query("DELETE FROM client_orders WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM client_pins WHERE name = ?1")
            .bind(&client)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
