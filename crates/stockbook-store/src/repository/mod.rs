//! # Repository Module
//!
//! Database repository implementations for the ledger engine.
//!
//! Each repository holds a clone of the shared [`sqlx::SqlitePool`] and
//! isolates the SQL for one area of the schema. Obtain instances through the
//! [`Ledger`](crate::Ledger) facade - its methods route every mutation
//! through the write serializer, which is what upholds the single-writer
//! contract. Calling a mutating repository method directly is safe for the
//! database (transactions still apply) but bypasses write ordering.
//!
//! ## Available Repositories
//!
//! - [`ArticleRepository`](article::ArticleRepository) - source stock,
//!   destination stock reads, prices
//! - [`TransferRepository`](transfer::TransferRepository) - atomic
//!   move/sell/return between the two locations
//! - [`OrderRepository`](order::OrderRepository) - immutable sale snapshots
//! - [`SettingsRepository`](settings::SettingsRepository) - key-value settings
//! - [`PinRepository`](pin::PinRepository) - client map pins

pub mod article;
pub mod order;
pub mod pin;
pub mod settings;
pub mod transfer;
