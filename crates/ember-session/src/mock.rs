//! Test double for the displayed-page facade.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use url::Url;

use crate::tab::WebContent;

/// A fake page that records reload requests.
pub struct MockWebContent {
    url: Mutex<Option<Url>>,
    reloads: AtomicUsize,
}

impl MockWebContent {
    /// A page displaying the given URL. Panics on an unparseable URL
    /// (test-setup error).
    pub fn at(url: &str) -> Self {
        Self {
            url: Mutex::new(Some(Url::parse(url).expect("valid test url"))),
            reloads: AtomicUsize::new(0),
        }
    }

    /// A page with nothing loaded.
    pub fn blank() -> Self {
        Self {
            url: Mutex::new(None),
            reloads: AtomicUsize::new(0),
        }
    }

    pub fn navigate(&self, url: &str) {
        *self.url.lock() = Some(Url::parse(url).expect("valid test url"));
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }
}

impl WebContent for MockWebContent {
    fn url(&self) -> Option<Url> {
        self.url.lock().clone()
    }

    fn reload_from_origin(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }
}
