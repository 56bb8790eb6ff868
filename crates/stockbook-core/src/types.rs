//! # Domain Types
//!
//! Core domain types used throughout Stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Domain Types                          │
//! │                                                             │
//! │  ┌────────────────┐  ┌─────────────────────┐                │
//! │  │    Article     │  │ SecondaryStockEntry │                │
//! │  │  ───────────── │  │  ─────────────────  │                │
//! │  │  id (i64)      │  │  article_id (i64)   │                │
//! │  │  name (unique) │  │  name (cache)       │                │
//! │  │  quantity      │  │  quantity           │                │
//! │  │  position      │  └─────────────────────┘                │
//! │  └────────────────┘                                         │
//! │                                                             │
//! │  ┌────────────────┐  ┌────────────────┐  ┌───────────────┐  │
//! │  │  ClientOrder   │  │   OrderItem    │  │   ClientPin   │  │
//! │  │  ───────────── │  │  ───────────── │  │  ───────────  │  │
//! │  │  id, client    │  │  order_id      │  │  id, name     │  │
//! │  │  created_at    │  │  qty, price    │  │  latitude     │  │
//! │  │  total (Σ)     │  │  name snapshot │  │  longitude    │  │
//! │  └────────────────┘  └────────────────┘  └───────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! [`OrderItem`] freezes name and price at the time of sale. It carries the
//! article id only as a historical reference - there is deliberately no
//! referential constraint back to the live article table, so deleting an
//! article never rewrites sale history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Source Stock
// =============================================================================

/// A stock line at the primary (source) location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Article {
    /// Row id, assigned by the store.
    pub id: i64,

    /// Display name. Unique across source stock; adding an existing name
    /// merges quantities instead of creating a duplicate row.
    pub name: String,

    /// Units on hand at the source location. Never negative.
    pub quantity: i64,

    /// Display ordering. Values may have gaps; only relative order matters.
    pub position: i64,
}

// =============================================================================
// Destination Stock
// =============================================================================

/// A stock line at the secondary (destination) location.
///
/// Created on first transfer-in, deleted once its quantity reaches zero.
/// The name is a cache of the source article's name at transfer time;
/// reads coalesce a missing cache from the live source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SecondaryStockEntry {
    /// Identity of the source article this stock was transferred from.
    pub article_id: i64,

    /// Cached name snapshot.
    pub name: String,

    /// Units on hand at the destination location. Never negative.
    pub quantity: i64,
}

// =============================================================================
// Pricing
// =============================================================================

/// Unit price for an article.
///
/// Prices live in their own table: they are independent of either location's
/// quantity and survive a location's stock reaching zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceEntry {
    pub article_id: i64,
    /// Unit price. Non-negative, finite.
    pub price: f64,
}

// =============================================================================
// Client Orders
// =============================================================================

/// A completed sale to a named client (order header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ClientOrder {
    pub id: i64,

    /// Client name as entered at sale time. Map pins match on this string.
    pub client: String,

    pub created_at: DateTime<Utc>,

    /// Order total, Σ(quantity × price) over line items. Computed at query
    /// time from the lines - never stored, so it cannot diverge from them.
    pub total: f64,
}

/// A line item of a completed sale.
///
/// Immutable once written. Name and price are frozen snapshots; `article_id`
/// is a historical reference with no constraint back to live stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub article_id: i64,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub price: f64,
    /// Article name at time of sale (frozen).
    pub name: String,
}

impl OrderItem {
    /// Line total for this item.
    #[inline]
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// Input for one line of a saved order.
///
/// The caller supplies the snapshot values; the engine persists them blindly
/// and never consults the live price or stock tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDraft {
    pub article_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub name: String,
}

// =============================================================================
// Client Pins
// =============================================================================

/// A named point on the client map.
///
/// Pins are matched to orders by the client name string, not by key. Renaming
/// a client orphans the pin; the store preserves this historical behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ClientPin {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================
