use dashmap::DashMap;
use parking_lot::RwLock;

use ember_core::ShieldState;

/// In-memory mapping of normalized domain to shield settings, filled by the
/// loader once the persisted records arrive. Readable from any thread.
pub struct ShieldRegistry {
    by_domain: DashMap<String, ShieldState>,
    locale: RwLock<String>,
}

impl Default for ShieldRegistry {
    fn default() -> Self {
        Self {
            by_domain: DashMap::new(),
            locale: RwLock::new("en".to_string()),
        }
    }
}

impl ShieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str) -> Option<ShieldState> {
        self.by_domain.get(domain).map(|entry| entry.clone())
    }

    pub fn insert(&self, domain: impl Into<String>, state: ShieldState) {
        self.by_domain.insert(domain.into(), state);
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }

    /// Locale code used when picking regional filter lists.
    pub fn locale(&self) -> String {
        self.locale.read().clone()
    }

    pub fn set_locale(&self, locale: impl Into<String>) {
        *self.locale.write() = locale.into();
    }
}
