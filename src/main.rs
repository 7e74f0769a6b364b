use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;

use ember_core::AppEvent;
use ember_launch::{LaunchOverrides, Launcher, LauncherConfig};
use ember_session::TabManager;
use ember_store::Database;

#[derive(Parser, Debug)]
#[command(name = "ember", about = "Ember browser startup orchestrator", version)]
struct Cli {
    /// Wipe all preferences before launch (test harness)
    #[arg(long)]
    test_clear_prefs: bool,

    /// Mark onboarding as already seen (test harness)
    #[arg(long)]
    test_skip_onboarding: bool,

    /// Show the opt-in dialog again (test harness)
    #[arg(long)]
    test_show_opt_in: bool,

    /// UI-test mode: tab restoration is forced off
    #[arg(long)]
    ui_test: bool,

    /// Locale override for regional shield lists
    #[arg(long)]
    locale: Option<String>,

    /// Profile data directory (defaults to ~/.ember)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ember_telemetry::init_logging("info");
    tracing::info!("starting ember");

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| dirs_home().join(".ember"));
    let db = Database::open(&data_dir.join("profile.db"))?;

    let tabs = Arc::new(TabManager::new());
    let (launcher, queue_runner) = Launcher::new(db, tabs, LauncherConfig::default());
    tokio::spawn(queue_runner.run(launcher.shutdown_token()));

    let overrides = LaunchOverrides {
        clear_prefs: cli.test_clear_prefs,
        skip_onboarding: cli.test_skip_onboarding,
        show_opt_in: cli.test_show_opt_in,
        ui_test: cli.ui_test,
        locale: cli.locale.clone(),
    };
    let _settings_pipeline = launcher.launch(&overrides);

    // The platform shell owns real lifecycle notifications; a headless run
    // synthesizes the initial foreground transition.
    let (event_tx, event_rx) = broadcast::channel(64);
    let _ = event_tx.send(AppEvent::WillEnterForeground);

    let launcher = Arc::new(launcher);
    let event_loop = {
        let launcher = Arc::clone(&launcher);
        tokio::spawn(async move { launcher.run_events(event_rx).await })
    };

    tracing::info!(
        restore_tabs = launcher.should_restore_tabs(),
        "ember ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let _ = event_tx.send(AppEvent::WillTerminate);
    launcher.shutdown();
    let _ = event_loop.await;

    Ok(())
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
