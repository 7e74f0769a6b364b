use std::sync::Arc;

use tracing::{info, instrument};

use ember_store::{ShieldSettingsRepo, StoreError};

use crate::registry::ShieldRegistry;

/// Loads the persisted per-domain records into the registry. The launcher
/// spawns `load` and uses its completion as the settings-loaded signal.
pub struct ShieldLoader {
    repo: ShieldSettingsRepo,
    registry: Arc<ShieldRegistry>,
}

impl ShieldLoader {
    pub fn new(repo: ShieldSettingsRepo, registry: Arc<ShieldRegistry>) -> Self {
        Self { repo, registry }
    }

    /// Fill the registry from storage. Returns the number of records loaded.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, StoreError> {
        let rows = self.repo.load_all()?;
        let count = rows.len();
        for (domain, state) in rows {
            self.registry.insert(domain, state);
        }
        info!(count, "shield settings loaded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::ShieldState;
    use ember_store::Database;

    #[tokio::test]
    async fn load_fills_registry_from_storage() {
        let repo = ShieldSettingsRepo::new(Database::in_memory().unwrap());
        let state = ShieldState {
            block_ads: Some(false),
            ..Default::default()
        };
        repo.upsert("example.com", &state).unwrap();
        repo.upsert("news.site.org", &ShieldState::default()).unwrap();

        let registry = Arc::new(ShieldRegistry::new());
        let loader = ShieldLoader::new(repo, registry.clone());

        let count = loader.load().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(registry.get("example.com"), Some(state));
    }

    #[tokio::test]
    async fn load_of_empty_store_is_empty_registry() {
        let repo = ShieldSettingsRepo::new(Database::in_memory().unwrap());
        let registry = Arc::new(ShieldRegistry::new());
        let loader = ShieldLoader::new(repo, registry.clone());

        assert_eq!(loader.load().await.unwrap(), 0);
        assert!(registry.is_empty());
    }
}
