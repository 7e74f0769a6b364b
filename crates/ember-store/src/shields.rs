use chrono::Utc;
use rusqlite::OptionalExtension;
use tracing::{instrument, warn};

use ember_core::ShieldState;

use crate::database::Database;
use crate::error::StoreError;

/// Persisted per-domain shield settings. The domain column holds the
/// normalized host; settings are stored as a JSON record.
#[derive(Clone)]
pub struct ShieldSettingsRepo {
    db: Database,
}

impl ShieldSettingsRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or replace the settings for a domain.
    #[instrument(skip(self, state))]
    pub fn upsert(&self, domain: &str, state: &ShieldState) -> Result<(), StoreError> {
        let settings = serde_json::to_string(state)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO shield_settings (domain, settings, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(domain) DO UPDATE SET settings = ?2, updated_at = ?3",
                rusqlite::params![domain, settings, now],
            )?;
            Ok(())
        })
    }

    /// Fetch the settings for one domain.
    pub fn get(&self, domain: &str) -> Result<Option<ShieldState>, StoreError> {
        let raw: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT settings FROM shield_settings WHERE domain = ?1",
                [domain],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })?;

        match raw {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(state) => Ok(Some(state)),
                Err(e) => {
                    warn!(domain, error = %e, "unreadable shield settings treated as absent");
                    Ok(None)
                }
            },
        }
    }

    /// Load every persisted record. Rows that fail to parse are skipped.
    #[instrument(skip(self))]
    pub fn load_all(&self) -> Result<Vec<(String, ShieldState)>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT domain, settings FROM shield_settings ORDER BY domain")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (domain, raw) = row?;
                match serde_json::from_str::<ShieldState>(&raw) {
                    Ok(state) => out.push((domain, state)),
                    Err(e) => {
                        warn!(domain, error = %e, "skipping unreadable shield settings row");
                    }
                }
            }
            Ok(out)
        })
    }
}
