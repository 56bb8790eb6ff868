//! # stockbook-core: Pure Domain Logic for Stockbook
//!
//! This crate contains the domain types and validation rules for Stockbook
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Stockbook Architecture                    │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                     UI Shell                          │  │
//! │  │   stock screens ─► transfer dialog ─► order history   │  │
//! │  └──────────────────────────┬────────────────────────────┘  │
//! │                             │ typed async calls             │
//! │  ┌──────────────────────────▼────────────────────────────┐  │
//! │  │           ★ stockbook-core (THIS CRATE) ★             │  │
//! │  │                                                       │  │
//! │  │   ┌───────────┐  ┌───────────┐                        │  │
//! │  │   │   types   │  │ validation│                        │  │
//! │  │   │  Article  │  │   rules   │                        │  │
//! │  │   │   Order   │  │  checks   │                        │  │
//! │  │   └───────────┘  └───────────┘                        │  │
//! │  │                                                       │  │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS               │  │
//! │  └──────────────────────────┬────────────────────────────┘  │
//! │                             │                               │
//! │  ┌──────────────────────────▼────────────────────────────┐  │
//! │  │           stockbook-store (Ledger Engine)             │  │
//! │  │     SQLite queries, migrations, write serializer      │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Article, ClientOrder, ClientPin, etc.)
//! - [`error`] - Validation error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: Stock quantities are whole units (i64), never fractions
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an article name.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum length of a client name (orders and map pins).
pub const MAX_CLIENT_NAME_LENGTH: usize = 120;

/// Maximum length of a settings key.
pub const MAX_SETTING_KEY_LENGTH: usize = 64;

/// Maximum quantity accepted for a single stock line or transfer.
///
/// Prevents accidental over-entry (e.g., typing 100000 instead of 100).
pub const MAX_QUANTITY: i64 = 999_999;
