//! # stockbook-store: Ledger & Transaction Engine
//!
//! This crate is the persistence layer of Stockbook. It keeps
//! source-location stock, destination-location stock, pricing, and
//! client-order history mutually consistent under sequential access, schema
//! evolution, and partial failure.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Stockbook Data Flow                      │
//! │                                                             │
//! │  UI shell (screens, map, receipts - not in this workspace)  │
//! │       │  typed async calls                                  │
//! │       ▼                                                     │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │              stockbook-store (THIS CRATE)             │  │
//! │  │                                                       │  │
//! │  │  ┌────────┐ ┌────────────┐ ┌──────────┐ ┌──────────┐  │  │
//! │  │  │ Ledger │ │   Write    │ │ Schema   │ │  Repos   │  │  │
//! │  │  │(pool.rs│ │ Serializer │ │ Migrator │ │ article  │  │  │
//! │  │  │ facade)│ │ (mpsc+task)│ │(user_ver)│ │ transfer │  │  │
//! │  │  │        │ │            │ │          │ │ order .. │  │  │
//! │  │  └────────┘ └────────────┘ └──────────┘ └──────────┘  │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  SQLite database (WAL)                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - `Ledger` handle, configuration, typed operations
//! - [`serializer`] - single-writer discipline for mutating calls
//! - [`migrate`] - versioned, idempotent schema upgrades
//! - [`error`] - the `LedgerError` taxonomy
//! - [`repository`] - per-area SQL (articles, transfers, orders, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_store::{Ledger, LedgerConfig};
//!
//! let ledger = Ledger::open(LedgerConfig::new("stockbook.db")).await?;
//!
//! let article = ledger.add_article("Widget", 10).await?;
//! ledger.move_to_secondary(article.id, 4).await?;
//! ledger.set_price(article.id, 2.5).await?;
//! ```
//!
//! ## Guarantees
//!
//! - At most one mutating operation runs at any time (write serializer);
//!   reads are concurrent.
//! - Every mutating call either fully applies or changes nothing.
//! - The store never operates on a half-migrated schema: `open` fails
//!   instead of returning a handle.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrate;
pub mod pool;
pub mod repository;
pub mod serializer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{LedgerError, LedgerResult};
pub use pool::{Ledger, LedgerConfig};
pub use serializer::WriteSerializer;

// Repository re-exports for convenience
pub use repository::article::ArticleRepository;
pub use repository::order::OrderRepository;
pub use repository::pin::PinRepository;
pub use repository::settings::SettingsRepository;
pub use repository::transfer::TransferRepository;
