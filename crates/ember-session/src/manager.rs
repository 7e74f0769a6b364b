use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use ember_core::TabId;

use crate::tab::{Tab, WebContent};

#[derive(Default)]
struct Inner {
    tabs: Vec<Arc<Tab>>,
    selected: Option<usize>,
}

/// Owns the open tabs and tracks which one is displayed. Window-level
/// management lives in the UI shell; orchestration only ever asks for the
/// selected tab.
#[derive(Default)]
pub struct TabManager {
    inner: RwLock<Inner>,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tab and select it.
    pub fn add_tab(&self, web: Arc<dyn WebContent>) -> Arc<Tab> {
        let tab = Arc::new(Tab::new(web));
        let mut inner = self.inner.write();
        inner.tabs.push(tab.clone());
        inner.selected = Some(inner.tabs.len() - 1);
        debug!(tab_id = %tab.id(), "tab added");
        tab
    }

    /// Select a tab by id. Returns false when the id is unknown.
    pub fn select(&self, id: &TabId) -> bool {
        let mut inner = self.inner.write();
        match inner.tabs.iter().position(|t| t.id() == id) {
            Some(index) => {
                inner.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn selected_tab(&self) -> Option<Arc<Tab>> {
        let inner = self.inner.read();
        inner.selected.and_then(|i| inner.tabs.get(i).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.read().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().tabs.is_empty()
    }
}
