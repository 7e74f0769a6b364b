use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use ember_core::{normalized_host, ShieldState, TabId};

/// In-memory shield state of a page. `Unset` means the page rendered under
/// default assumptions and has not yet been reconciled against the
/// persisted per-domain record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ShieldSlot {
    #[default]
    Unset,
    Set(ShieldState),
}

impl ShieldSlot {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn state(&self) -> Option<&ShieldState> {
        match self {
            Self::Unset => None,
            Self::Set(state) => Some(state),
        }
    }
}

/// Facade over the displayed page. The rendering engine lives in the UI
/// shell; orchestration only needs the current URL and a way to re-fetch
/// the page from its origin.
pub trait WebContent: Send + Sync {
    fn url(&self) -> Option<Url>;
    fn reload_from_origin(&self);
}

/// One browser tab: a web content handle plus its shield slot.
pub struct Tab {
    id: TabId,
    web: Arc<dyn WebContent>,
    shields: Mutex<ShieldSlot>,
}

impl Tab {
    pub fn new(web: Arc<dyn WebContent>) -> Self {
        Self {
            id: TabId::new(),
            web,
            shields: Mutex::new(ShieldSlot::Unset),
        }
    }

    pub fn id(&self) -> &TabId {
        &self.id
    }

    /// Normalized host of the currently displayed URL, if any.
    pub fn host(&self) -> Option<String> {
        self.web.url().as_ref().and_then(normalized_host)
    }

    pub fn shield_slot(&self) -> ShieldSlot {
        self.shields.lock().clone()
    }

    pub fn set_shield_state(&self, state: ShieldState) {
        *self.shields.lock() = ShieldSlot::Set(state);
    }

    pub fn reload_from_origin(&self) {
        self.web.reload_from_origin();
    }
}
