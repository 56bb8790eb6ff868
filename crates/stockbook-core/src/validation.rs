//! # Validation Module
//!
//! Input validation rules for Stockbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Validation Layers                        │
//! │                                                             │
//! │  Layer 1: UI shell                                          │
//! │  ├── Basic format checks (empty, length)                    │
//! │  └── Immediate user feedback                                │
//! │           │                                                 │
//! │           ▼                                                 │
//! │  Layer 2: THIS MODULE - domain rule validation              │
//! │           │                                                 │
//! │           ▼                                                 │
//! │  Layer 3: Database (SQLite)                                 │
//! │  ├── NOT NULL / CHECK constraints                           │
//! │  ├── UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! One deliberate gap: plain article updates bypass quantity validation
//! entirely (the store documents this asymmetry), so there is no
//! `validate_update` here.

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_CLIENT_NAME_LENGTH, MAX_NAME_LENGTH, MAX_QUANTITY, MAX_SETTING_KEY_LENGTH};

// =============================================================================
// String Validators
// =============================================================================

/// Validates an article name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`MAX_NAME_LENGTH`] characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_article_name(name: &str) -> ValidationResult<&str> {
    validate_name_field("name", name, MAX_NAME_LENGTH)
}

/// Validates a client name (orders and map pins).
pub fn validate_client_name(client: &str) -> ValidationResult<&str> {
    validate_name_field("client", client, MAX_CLIENT_NAME_LENGTH)
}

/// Validates a settings key.
pub fn validate_setting_key(key: &str) -> ValidationResult<&str> {
    validate_name_field("key", key, MAX_SETTING_KEY_LENGTH)
}

fn validate_name_field<'a>(
    field: &str,
    value: &'a str,
    max: usize,
) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock quantity supplied to an add operation.
///
/// ## Rules
/// - Must not be negative (the stock invariant holds at insert time)
/// - Must be at most [`MAX_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<i64> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }

    Ok(quantity)
}

/// Validates a quantity supplied to a transfer, sale, or return.
///
/// Transfers of zero or negative units are rejected outright; moving nothing
/// is always a caller bug.
pub fn validate_transfer_quantity(quantity: i64) -> ValidationResult<i64> {
    if quantity <= 0 {
        return Err(ValidationError::NotPositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(quantity)
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be a finite number (no NaN, no infinities)
/// - Must not be negative
pub fn validate_price(price: f64) -> ValidationResult<f64> {
    if !price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(price)
}

/// Validates a map coordinate pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> ValidationResult<()> {
    if !latitude.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "latitude".to_string(),
        });
    }
    if !longitude.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "longitude".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
