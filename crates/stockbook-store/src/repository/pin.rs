//! # Pin Repository
//!
//! Named points on the client map.
//!
//! Pins are matched to orders by client-name string, not by key: deleting an
//! order removes its same-named pin (best effort, see the order repository),
//! and renaming a client orphans the pin. Preserved behavior - do not
//! "repair" it with a foreign key.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use stockbook_core::validation::{validate_client_name, validate_coordinates};
use stockbook_core::ClientPin;

/// Repository for client map pins.
#[derive(Debug, Clone)]
pub struct PinRepository {
    pool: SqlitePool,
}

impl PinRepository {
    /// Creates a new PinRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PinRepository { pool }
    }

    /// Fetches all pins, ordered by name.
    pub async fn fetch_all(&self) -> LedgerResult<Vec<ClientPin>> {
        let pins = sqlx::query_as::<_, ClientPin>(
            "SELECT id, name, latitude, longitude FROM client_pins ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pins)
    }

    /// Adds a pin.
    pub async fn add(&self, name: &str, latitude: f64, longitude: f64) -> LedgerResult<ClientPin> {
        let name = validate_client_name(name)?;
        validate_coordinates(latitude, longitude)?;

        debug!(name = %name, latitude, longitude, "Adding pin");

        let result = sqlx::query(
            "INSERT INTO client_pins (name, latitude, longitude) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(latitude)
        .bind(longitude)
        .execute(&self.pool)
        .await?;

        Ok(ClientPin {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            latitude,
            longitude,
        })
    }

    /// Deletes a pin by id.
    pub async fn delete(&self, id: i64) -> LedgerResult<()> {
        debug!(id, "Deleting pin");

        let result = sqlx::query("DELETE FROM client_pins WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::not_found("pin", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
