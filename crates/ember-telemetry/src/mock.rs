//! Test double for the outbound reporting seam.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::usage::{PingError, PingSender, UsagePing};

/// Captures pings instead of sending them. Deterministic testing without
/// a network.
#[derive(Default)]
pub struct MockPingSender {
    sent: Mutex<Vec<UsagePing>>,
    calls: AtomicUsize,
    fail: bool,
}

impl MockPingSender {
    /// A sender whose every send fails at the transport level.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> Vec<UsagePing> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl PingSender for MockPingSender {
    async fn send(&self, ping: &UsagePing) -> Result<(), PingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.sent.lock().push(ping.clone());
        if self.fail {
            return Err(PingError::Transport("mock transport down".into()));
        }
        Ok(())
    }
}
