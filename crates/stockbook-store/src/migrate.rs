//! # Schema Migrator
//!
//! Versioned, idempotent schema upgrades, applied at startup.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Migration Process                        │
//! │                                                             │
//! │  Ledger::open                                               │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Read PRAGMA user_version                                   │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  For each step with from_version ≥ current:                 │
//! │       │                                                     │
//! │       ├── BEGIN                                             │
//! │       ├── run the step's SQL batch                          │
//! │       ├── PRAGMA user_version = from_version + 1            │
//! │       └── COMMIT   (failure → ROLLBACK, version untouched)  │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Store is at LATEST_VERSION                                 │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step is a no-op against a store already at or above its target
//! version - the loop skips it. A failed step rolls back, leaves the version
//! untouched for retry on next startup, and `Ledger::open` fails, so no
//! handle ever operates on a half-migrated schema.
//!
//! ## Adding New Migrations
//! 1. Append a `Migration` entry with `from_version = LATEST_VERSION`
//! 2. Bump `LATEST_VERSION`
//! 3. **NEVER** modify existing steps - always add new ones

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};

/// Schema version a fully migrated store reports.
pub const LATEST_VERSION: i64 = 4;

/// One schema upgrade step.
///
/// Applies against a store at exactly `from_version` and advances it to
/// `from_version + 1`.
pub struct Migration {
    pub from_version: i64,
    pub description: &'static str,
    sql: &'static str,
}

/// Ordered upgrade history. Index i advances version i to i+1.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        from_version: 0,
        description: "base schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                quantity INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS secondary_stock (
                article_id INTEGER PRIMARY KEY,
                name TEXT,
                quantity INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS prices (
                article_id INTEGER PRIMARY KEY,
                price REAL NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS client_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS client_order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL REFERENCES client_orders (id),
                article_id INTEGER NOT NULL REFERENCES articles (id),
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                name TEXT
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS client_pins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL
            );
        "#,
    },
    Migration {
        from_version: 1,
        description: "cascade article deletes to secondary stock and prices",
        // Table rebuild: SQLite cannot add a foreign key in place. Rows
        // orphaned before the constraint existed are dropped here.
        sql: r#"
            CREATE TABLE secondary_stock_new (
                article_id INTEGER PRIMARY KEY
                    REFERENCES articles (id) ON DELETE CASCADE,
                name TEXT,
                quantity INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO secondary_stock_new (article_id, name, quantity)
                SELECT s.article_id, s.name, s.quantity
                FROM secondary_stock s
                WHERE EXISTS (SELECT 1 FROM articles a WHERE a.id = s.article_id);
            DROP TABLE secondary_stock;
            ALTER TABLE secondary_stock_new RENAME TO secondary_stock;

            CREATE TABLE prices_new (
                article_id INTEGER PRIMARY KEY
                    REFERENCES articles (id) ON DELETE CASCADE,
                price REAL NOT NULL DEFAULT 0
            );
            INSERT INTO prices_new (article_id, price)
                SELECT p.article_id, p.price
                FROM prices p
                WHERE EXISTS (SELECT 1 FROM articles a WHERE a.id = p.article_id);
            DROP TABLE prices;
            ALTER TABLE prices_new RENAME TO prices;
        "#,
    },
    Migration {
        from_version: 2,
        description: "decouple order-item snapshots from live articles",
        // Line items are historical snapshots; the foreign key to articles
        // goes away so deleting an article never rewrites sale history. The
        // key to the order header stays, now cascading.
        sql: r#"
            CREATE TABLE client_order_items_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL
                    REFERENCES client_orders (id) ON DELETE CASCADE,
                article_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                name TEXT
            );
            INSERT INTO client_order_items_new
                    (id, order_id, article_id, quantity, price, name)
                SELECT id, order_id, article_id, quantity, price, name
                FROM client_order_items;
            DROP TABLE client_order_items;
            ALTER TABLE client_order_items_new RENAME TO client_order_items;
            CREATE INDEX IF NOT EXISTS idx_order_items_order
                ON client_order_items (order_id);
        "#,
    },
    Migration {
        from_version: 3,
        description: "explicit display position, backfilled from row ids",
        sql: r#"
            ALTER TABLE articles ADD COLUMN position INTEGER NOT NULL DEFAULT 0;
            UPDATE articles SET position = id;
            CREATE INDEX IF NOT EXISTS idx_articles_position
                ON articles (position, name);
        "#,
    },
];

/// Applies all pending schema upgrades.
///
/// Idempotent: running twice in a row performs zero changes on the second
/// run. Each step commits its SQL and the version bump atomically.
pub async fn run(pool: &SqlitePool) -> LedgerResult<()> {
    let mut version = current_version(pool).await?;

    if version > LATEST_VERSION {
        return Err(LedgerError::Migration(format!(
            "store version {version} is newer than this build supports ({LATEST_VERSION})"
        )));
    }

    if version == LATEST_VERSION {
        debug!(version, "schema already current");
        return Ok(());
    }

    for step in MIGRATIONS {
        if step.from_version < version {
            continue;
        }

        let target = step.from_version + 1;
        info!(from = step.from_version, to = target, step = step.description, "applying migration");

        let mut tx = pool.begin().await.map_err(migration_err)?;

        sqlx::raw_sql(step.sql)
            .execute(&mut *tx)
            .await
            .map_err(migration_err)?;

        // user_version lives in the database header and participates in the
        // transaction: a rollback leaves it untouched.
        sqlx::query(&format!("PRAGMA user_version = {target}"))
            .execute(&mut *tx)
            .await
            .map_err(migration_err)?;

        tx.commit().await.map_err(migration_err)?;
        version = target;
    }

    info!(version, "schema migrations complete");
    Ok(())
}

/// Reads the stored schema version (`PRAGMA user_version`).
pub async fn current_version(pool: &SqlitePool) -> LedgerResult<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(migration_err)?;

    Ok(version)
}

fn migration_err(err: sqlx::Error) -> LedgerError {
    LedgerError::Migration(err.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_dense_and_ordered() {
        for (i, step) in MIGRATIONS.iter().enumerate() {
            assert_eq!(step.from_version, i as i64);
        }
        assert_eq!(MIGRATIONS.len() as i64, LATEST_VERSION);
    }
}
