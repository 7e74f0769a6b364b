use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::database::Database;
use crate::error::StoreError;

/// Key-value preference storage. One key is owned by exactly one caller;
/// there is no cross-key transaction discipline.
#[derive(Clone)]
pub struct PrefsRepo {
    db: Database,
}

impl PrefsRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read a preference. A missing key is `Ok(None)`, never an error.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StoreError::from)
        })
    }

    /// Write a preference, overwriting any existing value.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO prefs (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                rusqlite::params![key, value, now],
            )?;
            Ok(())
        })
    }

    /// Remove a preference. Removing a missing key is not an error.
    #[instrument(skip(self))]
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM prefs WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    /// Wipe every preference.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM prefs", [])?;
            Ok(())
        })
    }

    /// Read a JSON-encoded preference. Malformed persisted values (e.g. the
    /// shape written by an older build) read as `None`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "unreadable preference treated as absent");
                Ok(None)
            }
        }
    }

    /// Write a JSON-encoded preference.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> PrefsRepo {
        PrefsRepo::new(Database::in_memory().unwrap())
    }

    #[test]
    fn missing_key_is_none() {
        assert_eq!(repo().get("nope").unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let prefs = repo();
        prefs.set("a", "1").unwrap();
        assert_eq!(prefs.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn set_overwrites() {
        let prefs = repo();
        prefs.set("a", "1").unwrap();
        prefs.set("a", "2").unwrap();
        assert_eq!(prefs.get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_deletes_and_is_idempotent() {
        let prefs = repo();
        prefs.set("a", "1").unwrap();
        prefs.remove("a").unwrap();
        assert_eq!(prefs.get("a").unwrap(), None);
        prefs.remove("a").unwrap();
    }

    #[test]
    fn clear_wipes_everything() {
        let prefs = repo();
        prefs.set("a", "1").unwrap();
        prefs.set("b", "2").unwrap();
        prefs.clear().unwrap();
        assert_eq!(prefs.get("a").unwrap(), None);
        assert_eq!(prefs.get("b").unwrap(), None);
    }

    #[test]
    fn json_round_trip() {
        let prefs = repo();
        prefs.set_json("triple", &vec![1i64, 2, 3]).unwrap();
        assert_eq!(
            prefs.get_json::<Vec<i64>>("triple").unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn malformed_json_reads_as_absent() {
        let prefs = repo();
        prefs.set("triple", "not json").unwrap();
        assert_eq!(prefs.get_json::<Vec<i64>>("triple").unwrap(), None);
    }

    #[test]
    fn wrong_shape_reads_as_absent() {
        let prefs = repo();
        prefs.set("triple", r#"{"a":1}"#).unwrap();
        assert_eq!(prefs.get_json::<Vec<i64>>("triple").unwrap(), None);
    }
}
