pub mod boot;
pub mod launcher;
pub mod main_queue;
pub mod overrides;
pub mod reconcile;

pub use boot::{BootGuard, BOOT_INCOMPLETE_KEY, DEFAULT_BOOT_OK_DELAY};
pub use launcher::{Launcher, LauncherConfig};
pub use main_queue::{main_queue, MainQueue, MainQueueRunner};
pub use overrides::{apply_overrides, LaunchOverrides};
pub use reconcile::ShieldReconciler;
