//! # Settings Repository
//!
//! Generic key-value application settings. Writes share the write
//! serializer with the ledger but have no transactional coupling to it.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::LedgerResult;
use stockbook_core::validation::validate_setting_key;

/// Repository for key-value settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads a setting. `None` when the key has never been saved.
    pub async fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(key.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Saves a setting (upsert).
    pub async fn save(&self, key: &str, value: &str) -> LedgerResult<()> {
        let key = validate_setting_key(key)?;

        debug!(key = %key, "Saving setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Ledger, LedgerConfig};

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let ledger = Ledger::open(LedgerConfig::in_memory()).await.unwrap();
        assert_eq!(ledger.settings().get("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_overwrite() {
        let ledger = Ledger::open(LedgerConfig::in_memory()).await.unwrap();
        let repo = ledger.settings();

        repo.save("theme", "dark").await.unwrap();
        repo.save("theme", "light").await.unwrap();

        assert_eq!(repo.get("theme").await.unwrap().as_deref(), Some("light"));
    }
}
