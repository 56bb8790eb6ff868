//! # Ledger Error Types
//!
//! The error taxonomy for the ledger & transaction engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                        │
//! │                                                             │
//! │  SQLite Error (sqlx::Error)                                 │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  LedgerError (this module) ← categorized, typed             │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  UI shell maps each variant to a user-facing message        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store-level failures propagate unmodified through the facade and the
//! write serializer. Every mutating call either fully applies or changes
//! nothing; an `Err` never leaves partial state behind.

use stockbook_core::ValidationError;
use thiserror::Error;

/// Errors surfaced by every ledger operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller input failed domain validation (bad quantity or price on a
    /// transfer/add/price call). Plain `update_article` deliberately skips
    /// this check.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A transfer, sale, or return asked for more units than are available.
    #[error("insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Operation targeted an id with no row behind it.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: i64 },

    /// The bounded wait for the exclusive write lock was exceeded.
    ///
    /// There is no automatic retry. Retrying the whole operation is safe for
    /// quantity-upsert-style calls but not for `save_order` - a blind retry
    /// duplicates the order.
    #[error("write lock wait exceeded, operation not applied")]
    Contention,

    /// A database constraint fired that no upsert path absorbed
    /// (unique-key collision, foreign key violation).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A schema upgrade step failed. The store refuses further operations
    /// rather than run against a half-migrated schema.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Residual engine failure (I/O, pool, corruption).
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id,
        }
    }

    /// Creates an InsufficientStock error.
    pub fn insufficient(name: impl Into<String>, available: i64, requested: i64) -> Self {
        LedgerError::InsufficientStock {
            name: name.into(),
            available,
            requested,
        }
    }
}

/// Convert sqlx errors to LedgerError.
///
/// ## Error Mapping
/// ```text
/// SQLITE_BUSY / "database is locked"  → Contention
/// constraint failures                 → Constraint
/// sqlx::Error::RowNotFound            → NotFound (id unknown at this layer)
/// sqlx::Error::PoolTimedOut           → Contention
/// Other                               → Storage
/// ```
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => LedgerError::NotFound {
                entity: "record".to_string(),
                id: -1,
            },

            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                let msg = db_err.message().to_string();

                // SQLITE_BUSY is 5; 517 is SQLITE_BUSY_SNAPSHOT under WAL.
                if code == "5" || code == "517" || msg.contains("database is locked") {
                    LedgerError::Contention
                } else if msg.contains("constraint failed") {
                    LedgerError::Constraint(msg)
                } else {
                    LedgerError::Storage(msg)
                }
            }

            sqlx::Error::PoolTimedOut => LedgerError::Contention,

            other => LedgerError::Storage(other.to_string()),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::insufficient("Widget", 3, 5);
        assert_eq!(
            err.to_string(),
            "insufficient stock for 'Widget': available 3, requested 5"
        );

        let err = LedgerError::not_found("article", 42);
        assert_eq!(err.to_string(), "article not found: 42");
    }

    #[test]
    fn test_validation_error_folds_in() {
        let err: LedgerError = ValidationError::Negative {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
