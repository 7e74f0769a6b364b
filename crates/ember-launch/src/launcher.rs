use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use ember_core::{AppEvent, AppInfo, ReleaseChannel};
use ember_session::TabManager;
use ember_shields::{ShieldLoader, ShieldRegistry};
use ember_store::{Database, PrefsRepo, ShieldSettingsRepo};
use ember_telemetry::{HttpPingSender, PingSender, UsageTracker};

use crate::boot::{BootGuard, DEFAULT_BOOT_OK_DELAY};
use crate::main_queue::{main_queue, MainQueue, MainQueueRunner};
use crate::overrides::{apply_overrides, LaunchOverrides};
use crate::reconcile::ShieldReconciler;

/// Wiring-time knobs for the launcher.
pub struct LauncherConfig {
    /// Grace period before the boot-incomplete marker is cleared.
    pub boot_ok_delay: Duration,
    /// Defer between a foreground transition and the usage evaluation.
    pub foreground_ping_delay: Duration,
    pub telemetry_endpoint: Url,
    pub app: AppInfo,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            boot_ok_delay: DEFAULT_BOOT_OK_DELAY,
            foreground_ping_delay: Duration::from_secs(10),
            telemetry_endpoint: Url::parse("https://updates.emberbrowser.com/1/usage/ios")
                .expect("valid endpoint"),
            app: AppInfo::new(env!("CARGO_PKG_VERSION"), ReleaseChannel::Stable),
        }
    }
}

/// Owns the startup orchestration: boot integrity, shield reconciliation
/// and usage reporting. Constructed once at process start and handed to
/// whatever needs it; there is no process-wide singleton.
pub struct Launcher {
    db: Database,
    prefs: PrefsRepo,
    boot: BootGuard,
    registry: Arc<ShieldRegistry>,
    reconciler: Arc<ShieldReconciler>,
    tabs: Arc<TabManager>,
    usage: Arc<UsageTracker>,
    queue: MainQueue,
    shutdown: CancellationToken,
    foreground_ping_delay: Duration,
}

impl Launcher {
    /// Build the launcher and the main-queue runner. The caller spawns the
    /// runner (with `shutdown_token`) before calling `launch`.
    pub fn new(db: Database, tabs: Arc<TabManager>, config: LauncherConfig) -> (Self, MainQueueRunner) {
        let prefs = PrefsRepo::new(db.clone());
        let boot = BootGuard::new(prefs.clone(), config.boot_ok_delay);
        let registry = Arc::new(ShieldRegistry::new());
        let reconciler = Arc::new(ShieldReconciler::new(tabs.clone(), registry.clone()));
        let (queue, runner) = main_queue();

        let sender: Arc<dyn PingSender> = Arc::new(HttpPingSender::new(config.telemetry_endpoint));
        let usage = Arc::new(UsageTracker::new(prefs.clone(), sender, config.app));

        let launcher = Self {
            db,
            prefs,
            boot,
            registry,
            reconciler,
            tabs,
            usage,
            queue,
            shutdown: CancellationToken::new(),
            foreground_ping_delay: config.foreground_ping_delay,
        };
        (launcher, runner)
    }

    /// Swap the outbound reporting seam (tests).
    pub fn with_ping_sender(mut self, sender: Arc<dyn PingSender>, app: AppInfo) -> Self {
        self.usage = Arc::new(UsageTracker::new(self.prefs.clone(), sender, app));
        self
    }

    /// Run the launch sequence: overrides, boot marker, restore-safety
    /// derivation, then the asynchronous shield-settings load whose
    /// completion triggers the one reconciliation pass. Returns the handle
    /// of the settings pipeline; production discards it.
    #[instrument(skip(self, overrides))]
    pub fn launch(&self, overrides: &LaunchOverrides) -> tokio::task::JoinHandle<()> {
        apply_overrides(overrides, &self.prefs, &self.boot, &self.registry);

        // Marker write strictly precedes the preference read that derives
        // restore safety.
        self.boot.on_launch_begin();
        let restore_safe = self.boot.on_prefs_ready(&self.shutdown);
        info!(restore_safe, "launch sequence started");

        let loader = ShieldLoader::new(
            ShieldSettingsRepo::new(self.db.clone()),
            self.registry.clone(),
        );
        let reconciler = Arc::clone(&self.reconciler);
        let queue = self.queue.clone();
        tokio::spawn(async move {
            match loader.load().await {
                Ok(count) => {
                    debug!(count, "shield settings ready, scheduling reconciliation");
                    reconciler.reconcile_on(&queue);
                }
                Err(e) => {
                    // The page keeps rendering under its current in-memory
                    // state; no reconciliation, no crash.
                    warn!(error = %e, "shield settings load failed, skipping reconciliation");
                }
            }
        })
    }

    /// Consume lifecycle events until shutdown. A foreground transition
    /// schedules one deferred usage evaluation.
    pub async fn run_events(&self, mut events: broadcast::Receiver<AppEvent>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Ok(AppEvent::WillEnterForeground) => {
                        let usage = Arc::clone(&self.usage);
                        let delay = self.foreground_ping_delay;
                        let cancel = self.shutdown.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = cancel.cancelled() => {}
                                _ = tokio::time::sleep(delay) => {
                                    let _ = usage.evaluate(Utc::now());
                                }
                            }
                        });
                    }
                    Ok(AppEvent::DidEnterBackground) => {
                        debug!("entered background");
                    }
                    Ok(AppEvent::WillTerminate) => {
                        self.shutdown();
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "lifecycle events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Cancel the boot-clear timer, the main queue and the event loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// One-shot restore-safety probe; see `BootGuard::should_restore_tabs`.
    pub fn should_restore_tabs(&self) -> bool {
        self.boot.should_restore_tabs()
    }

    pub fn tabs(&self) -> &Arc<TabManager> {
        &self.tabs
    }

    pub fn shields(&self) -> &Arc<ShieldRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &MainQueue {
        &self.queue
    }
}
