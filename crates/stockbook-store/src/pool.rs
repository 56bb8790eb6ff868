//! # Ledger Handle & Pool Management
//!
//! Connection pool creation, configuration, and the typed facade the UI
//! layer consumes.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Ledger Handle                          │
//! │                                                             │
//! │  App startup                                                │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  LedgerConfig::new(path) ← pool sizing, busy timeout        │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Ledger::open(config).await                                 │
//! │       ├── create SqlitePool (WAL, NORMAL sync, FKs on)      │
//! │       ├── run schema migrations (refuse handle on failure)  │
//! │       └── spawn the write serializer worker                 │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  reads  ──────────────► pool (concurrent)                   │
//! │  writes ── enqueue ───► serializer ──► pool (one at a time) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! Write-Ahead Logging lets readers proceed while the single serialized
//! writer holds the write lock; the busy timeout bounds how long a write
//! waits for that lock before surfacing [`LedgerError::Contention`].

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::migrate;
use crate::repository::article::ArticleRepository;
use crate::repository::order::OrderRepository;
use crate::repository::pin::PinRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::transfer::TransferRepository;
use crate::serializer::WriteSerializer;
use stockbook_core::{
    Article, ClientOrder, ClientPin, OrderItem, OrderItemDraft, PriceEntry, SecondaryStockEntry,
};

// =============================================================================
// Configuration
// =============================================================================

/// Ledger store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = LedgerConfig::new("/path/to/stockbook.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (reads are concurrent; writes are serialized anyway)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Bounded wait for the exclusive write lock. Exceeding it surfaces
    /// [`LedgerError::Contention`] with no automatic retry.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Timeout for acquiring a pooled connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,
}

impl LedgerConfig {
    /// Creates a configuration with the given database path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the bounded write-lock wait.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the pooled-connection acquire timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Creates an in-memory configuration (for testing).
    ///
    /// In-memory SQLite requires a single connection: every connection gets
    /// its own private database otherwise.
    pub fn in_memory() -> Self {
        LedgerConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Main store handle: the typed API the UI layer consumes.
///
/// Every engine operation is an async method here. Mutating calls
/// are routed through the write serializer, so at most one write runs
/// against the store at any time and each caller gets its own operation's
/// result. Read-only calls hit the pool directly and may run concurrently
/// with a pending write; await the write first when read-after-write
/// consistency matters.
///
/// Cloning is cheap and shares the pool, the serializer queue, and therefore
/// the write ordering.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
    serializer: WriteSerializer,
}

impl Ledger {
    /// Opens the store: creates the pool, migrates the schema, spawns the
    /// write serializer.
    ///
    /// ## Errors
    /// - [`LedgerError::Storage`] - the database cannot be opened
    /// - [`LedgerError::Migration`] - an upgrade step failed; no handle is
    ///   returned, so nothing can operate on the half-migrated schema (the
    ///   failed step rolled back and will retry on next open)
    pub async fn open(config: LedgerConfig) -> LedgerResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening ledger store"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| LedgerError::Storage(e.to_string()))?
            // WAL: readers don't block the serialized writer
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL: safe from corruption, may lose last transaction on crash
            .synchronous(SqliteSynchronous::Normal)
            // Cascading deletes depend on enforced foreign keys
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        migrate::run(&pool).await?;

        let serializer = WriteSerializer::spawn();

        info!(
            max_connections = config.max_connections,
            "Ledger store ready"
        );

        Ok(Ledger { pool, serializer })
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced queries not covered by the typed API. Mutations through
    /// the raw pool bypass the write serializer; prefer the methods below.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Repository accessors
    // =========================================================================

    /// Returns the article repository (source stock, secondary reads, prices).
    pub fn articles(&self) -> ArticleRepository {
        ArticleRepository::new(self.pool.clone())
    }

    /// Returns the transfer repository (move/sell/return).
    pub fn transfers(&self) -> TransferRepository {
        TransferRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Returns the settings repository.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Returns the pin repository.
    pub fn pins(&self) -> PinRepository {
        PinRepository::new(self.pool.clone())
    }

    // =========================================================================
    // Source stock
    // =========================================================================

    /// Adds stock at the source location, merging into an existing row when
    /// the name already exists.
    pub async fn add_article(&self, name: &str, quantity: i64) -> LedgerResult<Article> {
        let repo = self.articles();
        let name = name.to_string();
        self.serializer
            .enqueue(move || async move { repo.add(&name, quantity).await })
            .await
    }

    /// Fetches all source stock, ordered by position then name.
    pub async fn fetch_articles(&self) -> LedgerResult<Vec<Article>> {
        self.articles().fetch_all().await
    }

    /// Total units at the source location; 0 on an empty table.
    pub async fn fetch_total_quantity(&self) -> LedgerResult<i64> {
        self.articles().total_quantity().await
    }

    /// Overwrites an article unconditionally. No quantity validation here -
    /// see [`ArticleRepository::update`] for the documented asymmetry with
    /// the transfer engine.
    pub async fn update_article(&self, id: i64, name: &str, quantity: i64) -> LedgerResult<()> {
        let repo = self.articles();
        let name = name.to_string();
        self.serializer
            .enqueue(move || async move { repo.update(id, &name, quantity).await })
            .await
    }

    /// Deletes an article; cascades to its price and destination rows,
    /// leaves order history untouched.
    pub async fn delete_article(&self, id: i64) -> LedgerResult<()> {
        let repo = self.articles();
        self.serializer
            .enqueue(move || async move { repo.delete(id).await })
            .await
    }

    /// Reassigns display positions 1..N following the given sequence,
    /// atomically.
    pub async fn reorder_articles(&self, ordered_ids: Vec<i64>) -> LedgerResult<()> {
        let repo = self.articles();
        self.serializer
            .enqueue(move || async move { repo.reorder(&ordered_ids).await })
            .await
    }

    // =========================================================================
    // Destination stock & transfers
    // =========================================================================

    /// Fetches all destination stock, ordered by the source article's
    /// position then name, with missing name caches coalesced.
    pub async fn fetch_secondary_stock(&self) -> LedgerResult<Vec<SecondaryStockEntry>> {
        self.articles().fetch_secondary().await
    }

    /// Moves stock from source to destination atomically.
    pub async fn move_to_secondary(&self, id: i64, quantity: i64) -> LedgerResult<()> {
        let repo = self.transfers();
        self.serializer
            .enqueue(move || async move { repo.move_to_secondary(id, quantity).await })
            .await
    }

    /// Sells stock out of the destination location atomically.
    pub async fn sell_secondary(&self, id: i64, quantity: i64) -> LedgerResult<()> {
        let repo = self.transfers();
        self.serializer
            .enqueue(move || async move { repo.sell_secondary(id, quantity).await })
            .await
    }

    /// Returns destination stock to the source location atomically.
    pub async fn return_to_main(&self, id: i64, quantity: i64) -> LedgerResult<()> {
        let repo = self.transfers();
        self.serializer
            .enqueue(move || async move { repo.return_to_main(id, quantity).await })
            .await
    }

    // =========================================================================
    // Prices
    // =========================================================================

    /// Fetches all price rows.
    pub async fn fetch_prices(&self) -> LedgerResult<Vec<PriceEntry>> {
        self.articles().fetch_prices().await
    }

    /// Sets an article's unit price (upsert).
    pub async fn set_price(&self, article_id: i64, price: f64) -> LedgerResult<()> {
        let repo = self.articles();
        self.serializer
            .enqueue(move || async move { repo.set_price(article_id, price).await })
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Persists a completed sale snapshot.
    ///
    /// Debit destination stock with [`sell_secondary`](Self::sell_secondary)
    /// first; the two phases are separate transactions, so a blind retry of
    /// this call after a contention failure duplicates the order.
    pub async fn save_order(
        &self,
        client: &str,
        items: Vec<OrderItemDraft>,
    ) -> LedgerResult<ClientOrder> {
        let repo = self.orders();
        let client = client.to_string();
        self.serializer
            .enqueue(move || async move { repo.save(&client, &items).await })
            .await
    }

    /// Fetches all order headers with per-query computed totals, newest
    /// first.
    pub async fn fetch_orders(&self) -> LedgerResult<Vec<ClientOrder>> {
        self.orders().fetch_all().await
    }

    /// Fetches one order's frozen line items.
    pub async fn fetch_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
        self.orders().fetch_items(order_id).await
    }

    /// Deletes an order and, best effort, its same-named map pin.
    pub async fn delete_order(&self, order_id: i64) -> LedgerResult<()> {
        let repo = self.orders();
        self.serializer
            .enqueue(move || async move { repo.delete(order_id).await })
            .await
    }

    // =========================================================================
    // Settings & pins
    // =========================================================================

    /// Reads a setting; `None` when never saved.
    pub async fn get_setting(&self, key: &str) -> LedgerResult<Option<String>> {
        self.settings().get(key).await
    }

    /// Saves a setting (upsert).
    pub async fn save_setting(&self, key: &str, value: &str) -> LedgerResult<()> {
        let repo = self.settings();
        let key = key.to_string();
        let value = value.to_string();
        self.serializer
            .enqueue(move || async move { repo.save(&key, &value).await })
            .await
    }

    /// Fetches all client map pins.
    pub async fn fetch_pins(&self) -> LedgerResult<Vec<ClientPin>> {
        self.pins().fetch_all().await
    }

    /// Adds a client map pin.
    pub async fn add_pin(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> LedgerResult<ClientPin> {
        let repo = self.pins();
        let name = name.to_string();
        self.serializer
            .enqueue(move || async move { repo.add(&name, latitude, longitude).await })
            .await
    }

    /// Deletes a client map pin.
    pub async fn delete_pin(&self, id: i64) -> LedgerResult<()> {
        let repo = self.pins();
        self.serializer
            .enqueue(move || async move { repo.delete(id).await })
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_open() {
        let ledger = Ledger::open(LedgerConfig::in_memory()).await.unwrap();
        assert_eq!(ledger.fetch_total_quantity().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = LedgerConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_writes_through_facade_are_ordered() {
        let ledger = Ledger::open(LedgerConfig::in_memory()).await.unwrap();

        // Same article mutated twice through the facade; the serializer
        // guarantees the merge sees the first add.
        ledger.add_article("Widget", 5).await.unwrap();
        ledger.add_article("Widget", 3).await.unwrap();

        let articles = ledger.fetch_articles().await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].quantity, 8);
    }
}
