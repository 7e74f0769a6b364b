use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use ember_store::PrefsRepo;

/// Marker left in storage for the whole early-boot window. Still present at
/// the next launch means that run crashed before booting cleanly.
pub const BOOT_INCOMPLETE_KEY: &str = "boot.incomplete";

/// Written as the marker value; presence is what matters, not the content.
const BOOT_MARKER_VALUE: &str = "remove me when booted";

/// How long the process must keep running before the marker is cleared.
pub const DEFAULT_BOOT_OK_DELAY: Duration = Duration::from_secs(10);

/// One-shot restore-safety state. The first consumer gets the derived
/// answer; every consumer after that is told "safe". Downstream tab
/// creation probes this speculatively and must never see "unsafe" twice.
#[derive(Debug)]
enum RestoreSafety {
    Unconsumed(bool),
    Consumed,
}

/// Decides, once per process lifetime, whether restoring the previous
/// session's tabs is safe, and maintains the boot-incomplete marker.
pub struct BootGuard {
    prefs: PrefsRepo,
    delay: Duration,
    prior_marker_seen: Mutex<Option<bool>>,
    safety: Mutex<RestoreSafety>,
    forced_unsafe: AtomicBool,
}

impl BootGuard {
    pub fn new(prefs: PrefsRepo, delay: Duration) -> Self {
        Self {
            prefs,
            delay,
            prior_marker_seen: Mutex::new(None),
            safety: Mutex::new(RestoreSafety::Unconsumed(true)),
            forced_unsafe: AtomicBool::new(false),
        }
    }

    /// First step of the launch sequence: observe whether the previous run
    /// left its marker behind, then write ours. Idempotent: repeat calls
    /// keep the first observation and the marker stays present. Storage
    /// errors are swallowed; an unreadable marker counts as absent.
    #[instrument(skip(self))]
    pub fn on_launch_begin(&self) {
        let mut seen = self.prior_marker_seen.lock();
        if seen.is_none() {
            let present = match self.prefs.get(BOOT_INCOMPLETE_KEY) {
                Ok(value) => value.is_some(),
                Err(e) => {
                    warn!(error = %e, "failed to read boot marker, assuming absent");
                    false
                }
            };
            *seen = Some(present);
        }

        if let Err(e) = self.prefs.set(BOOT_INCOMPLETE_KEY, BOOT_MARKER_VALUE) {
            warn!(error = %e, "failed to write boot marker");
        }
    }

    /// Second step, once preferences are usable: derive the restore-safety
    /// answer from the pre-write observation and start the delayed clear.
    /// The clear task removes the marker after the grace period, confirming
    /// this run survived its early boot window; it is raced against the
    /// orchestrator's shutdown token so teardown never leaves a dangling
    /// timer.
    #[instrument(skip(self, shutdown))]
    pub fn on_prefs_ready(&self, shutdown: &CancellationToken) -> bool {
        let prior_seen = (*self.prior_marker_seen.lock()).unwrap_or(false);
        let safe = !prior_seen && !self.forced_unsafe.load(Ordering::SeqCst);
        *self.safety.lock() = RestoreSafety::Unconsumed(safe);
        debug!(safe, "restore safety derived");

        let prefs = self.prefs.clone();
        let delay = self.delay;
        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("boot marker clear cancelled by shutdown");
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = prefs.remove(BOOT_INCOMPLETE_KEY) {
                        warn!(error = %e, "failed to clear boot marker");
                    } else {
                        debug!("boot marker cleared, early boot window survived");
                    }
                }
            }
        });

        safe
    }

    /// Consume the restore-safety answer. The first call returns the derived
    /// value; all later calls return `true`.
    pub fn should_restore_tabs(&self) -> bool {
        let mut safety = self.safety.lock();
        match std::mem::replace(&mut *safety, RestoreSafety::Consumed) {
            RestoreSafety::Unconsumed(safe) => safe,
            RestoreSafety::Consumed => true,
        }
    }

    /// Force the unconsumed answer to "unsafe" (UI test harness override).
    /// Sticky across `on_prefs_ready`.
    pub fn mark_restore_unsafe(&self) {
        self.forced_unsafe.store(true, Ordering::SeqCst);
        let mut safety = self.safety.lock();
        if let RestoreSafety::Unconsumed(_) = *safety {
            *safety = RestoreSafety::Unconsumed(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_store::Database;

    fn prefs() -> PrefsRepo {
        PrefsRepo::new(Database::in_memory().unwrap())
    }

    fn guard(prefs: &PrefsRepo) -> BootGuard {
        BootGuard::new(prefs.clone(), DEFAULT_BOOT_OK_DELAY)
    }

    #[tokio::test(start_paused = true)]
    async fn clean_prior_run_is_safe_to_restore() {
        let prefs = prefs();
        let boot = guard(&prefs);
        let shutdown = CancellationToken::new();

        boot.on_launch_begin();
        assert!(boot.on_prefs_ready(&shutdown));
        assert!(boot.should_restore_tabs());
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_prior_run_is_unsafe_once() {
        let prefs = prefs();
        prefs.set(BOOT_INCOMPLETE_KEY, "leftover").unwrap();
        let boot = guard(&prefs);
        let shutdown = CancellationToken::new();

        boot.on_launch_begin();
        assert!(!boot.on_prefs_ready(&shutdown));

        // First call reports the original answer, every later call is safe.
        assert!(!boot.should_restore_tabs());
        assert!(boot.should_restore_tabs());
        assert!(boot.should_restore_tabs());
    }

    #[tokio::test(start_paused = true)]
    async fn launch_begin_writes_marker_before_prefs_ready() {
        let prefs = prefs();
        let boot = guard(&prefs);

        boot.on_launch_begin();
        assert!(prefs.get(BOOT_INCOMPLETE_KEY).unwrap().is_some());

        // The observation reflects the pre-write read, not our own marker.
        assert!(boot.on_prefs_ready(&CancellationToken::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn launch_begin_is_idempotent() {
        let prefs = prefs();
        prefs.set(BOOT_INCOMPLETE_KEY, "leftover").unwrap();
        let boot = guard(&prefs);

        boot.on_launch_begin();
        boot.on_launch_begin();
        boot.on_launch_begin();

        assert!(prefs.get(BOOT_INCOMPLETE_KEY).unwrap().is_some());
        // Repeat calls keep the first observation.
        assert!(!boot.on_prefs_ready(&CancellationToken::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn marker_cleared_after_grace_period() {
        let prefs = prefs();
        let boot = guard(&prefs);
        let shutdown = CancellationToken::new();

        boot.on_launch_begin();
        boot.on_prefs_ready(&shutdown);
        assert!(prefs.get(BOOT_INCOMPLETE_KEY).unwrap().is_some());

        tokio::time::sleep(DEFAULT_BOOT_OK_DELAY + Duration::from_millis(100)).await;
        assert!(prefs.get(BOOT_INCOMPLETE_KEY).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_delayed_clear() {
        let prefs = prefs();
        let boot = guard(&prefs);
        let shutdown = CancellationToken::new();

        boot.on_launch_begin();
        boot.on_prefs_ready(&shutdown);
        shutdown.cancel();

        tokio::time::sleep(DEFAULT_BOOT_OK_DELAY + Duration::from_millis(100)).await;
        // Marker survives: the process is tearing down, not booting cleanly.
        assert!(prefs.get(BOOT_INCOMPLETE_KEY).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn forced_unsafe_survives_prefs_ready() {
        let prefs = prefs();
        let boot = guard(&prefs);

        boot.mark_restore_unsafe();
        boot.on_launch_begin();
        assert!(!boot.on_prefs_ready(&CancellationToken::new()));
        assert!(!boot.should_restore_tabs());
        assert!(boot.should_restore_tabs());
    }
}
