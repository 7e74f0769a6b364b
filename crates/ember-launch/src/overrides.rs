use tracing::{info, warn};

use ember_shields::ShieldRegistry;
use ember_store::PrefsRepo;

use crate::boot::BootGuard;

pub const INTRO_SEEN_KEY: &str = "onboarding.intro_seen";
pub const OPT_IN_SEEN_KEY: &str = "onboarding.optin_seen";

/// Test-harness overrides applied to persisted state before the launch
/// sequence runs. Plain plumbing, no orchestration logic.
#[derive(Clone, Debug, Default)]
pub struct LaunchOverrides {
    /// Wipe every preference first.
    pub clear_prefs: bool,
    /// Mark the intro as already seen.
    pub skip_onboarding: bool,
    /// Force the opt-in dialog to show again.
    pub show_opt_in: bool,
    /// UI test run: tab restoration is forced unsafe; when this is the only
    /// override, onboarding dialogs are marked seen as well.
    pub ui_test: bool,
    /// Locale override for regional shield lists.
    pub locale: Option<String>,
}

impl LaunchOverrides {
    pub fn is_empty(&self) -> bool {
        self.set_count() == 0
    }

    fn set_count(&self) -> usize {
        [
            self.clear_prefs,
            self.skip_onboarding,
            self.show_opt_in,
            self.ui_test,
            self.locale.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// Apply the overrides. Failures are logged and never abort the launch;
/// these are conveniences for test harnesses, not load-bearing state.
pub fn apply_overrides(
    overrides: &LaunchOverrides,
    prefs: &PrefsRepo,
    boot: &BootGuard,
    shields: &ShieldRegistry,
) {
    if overrides.is_empty() {
        return;
    }
    info!(?overrides, "applying launch overrides");

    if overrides.clear_prefs {
        if let Err(e) = prefs.clear() {
            warn!(error = %e, "failed to clear preferences");
        }
    }
    if overrides.skip_onboarding {
        if let Err(e) = prefs.set(INTRO_SEEN_KEY, "1") {
            warn!(error = %e, "failed to mark intro seen");
        }
    }
    if overrides.show_opt_in {
        if let Err(e) = prefs.remove(OPT_IN_SEEN_KEY) {
            warn!(error = %e, "failed to reset opt-in");
        }
    }
    if overrides.ui_test {
        boot.mark_restore_unsafe();
        if overrides.set_count() == 1 {
            let _ = prefs.set(INTRO_SEEN_KEY, "1");
            let _ = prefs.set(OPT_IN_SEEN_KEY, "1");
        }
    }
    if let Some(locale) = &overrides.locale {
        shields.set_locale(locale.clone());
    }
}
