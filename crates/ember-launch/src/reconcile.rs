use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use ember_session::TabManager;
use ember_shields::ShieldRegistry;

use crate::main_queue::MainQueue;

/// After the persisted shield settings finish loading, brings the displayed
/// page's in-memory shield state in line with them. Runs at most once per
/// launch, on the main queue, since it mutates displayed-page state.
pub struct ShieldReconciler {
    tabs: Arc<TabManager>,
    registry: Arc<ShieldRegistry>,
    done: AtomicBool,
}

impl ShieldReconciler {
    pub fn new(tabs: Arc<TabManager>, registry: Arc<ShieldRegistry>) -> Self {
        Self {
            tabs,
            registry,
            done: AtomicBool::new(false),
        }
    }

    /// Post the single reconciliation pass. A duplicate settings-loaded
    /// signal is ignored.
    pub fn reconcile_on(&self, queue: &MainQueue) {
        if self.done.swap(true, Ordering::SeqCst) {
            debug!("shield reconciliation already ran");
            return;
        }
        let tabs = Arc::clone(&self.tabs);
        let registry = Arc::clone(&self.registry);
        queue.post(move || reconcile_pass(&tabs, &registry));
    }
}

fn reconcile_pass(tabs: &TabManager, registry: &ShieldRegistry) {
    let Some(tab) = tabs.selected_tab() else {
        debug!("no selected tab, skipping shield reconciliation");
        return;
    };
    // A slot someone already decided is never overwritten, and a reload is
    // never forced speculatively.
    if !tab.shield_slot().is_unset() {
        return;
    }
    let Some(host) = tab.host() else {
        return;
    };
    let Some(state) = registry.get(&host) else {
        return;
    };

    // The first render happened under default assumptions. Mutate first,
    // then reload, so the re-render sees the persisted state.
    tab.set_shield_state(state);
    tab.reload_from_origin();
    info!(host = %host, "shield state reconciled, reloading page");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::ShieldState;
    use ember_session::mock::MockWebContent;
    use ember_session::ShieldSlot;
    use tokio_util::sync::CancellationToken;

    use crate::main_queue::main_queue;

    fn persisted() -> ShieldState {
        ShieldState {
            block_ads: Some(false),
            block_trackers: Some(true),
            ..Default::default()
        }
    }

    async fn run_reconciler(
        tabs: Arc<TabManager>,
        registry: Arc<ShieldRegistry>,
        passes: usize,
    ) {
        let (queue, runner) = main_queue();
        let reconciler = ShieldReconciler::new(tabs, registry);
        for _ in 0..passes {
            reconciler.reconcile_on(&queue);
        }
        drop(queue);
        runner.run(CancellationToken::new()).await;
    }

    #[tokio::test]
    async fn unset_slot_with_record_is_reconciled_and_reloaded_once() {
        let tabs = Arc::new(TabManager::new());
        let web = Arc::new(MockWebContent::at("https://www.example.com/page"));
        tabs.add_tab(web.clone());

        let registry = Arc::new(ShieldRegistry::new());
        registry.insert("example.com", persisted());

        run_reconciler(tabs.clone(), registry, 1).await;

        let tab = tabs.selected_tab().unwrap();
        assert_eq!(tab.shield_slot(), ShieldSlot::Set(persisted()));
        assert_eq!(web.reload_count(), 1);
    }

    #[tokio::test]
    async fn already_set_slot_is_left_alone() {
        let tabs = Arc::new(TabManager::new());
        let web = Arc::new(MockWebContent::at("https://example.com"));
        let tab = tabs.add_tab(web.clone());
        let user_choice = ShieldState {
            block_scripts: Some(true),
            ..Default::default()
        };
        tab.set_shield_state(user_choice.clone());

        let registry = Arc::new(ShieldRegistry::new());
        registry.insert("example.com", persisted());

        run_reconciler(tabs.clone(), registry, 1).await;

        assert_eq!(
            tabs.selected_tab().unwrap().shield_slot(),
            ShieldSlot::Set(user_choice)
        );
        assert_eq!(web.reload_count(), 0);
    }

    #[tokio::test]
    async fn no_persisted_record_means_no_reload() {
        let tabs = Arc::new(TabManager::new());
        let web = Arc::new(MockWebContent::at("https://example.com"));
        tabs.add_tab(web.clone());

        run_reconciler(tabs.clone(), Arc::new(ShieldRegistry::new()), 1).await;

        assert!(tabs.selected_tab().unwrap().shield_slot().is_unset());
        assert_eq!(web.reload_count(), 0);
    }

    #[tokio::test]
    async fn no_selected_tab_is_a_no_op() {
        let tabs = Arc::new(TabManager::new());
        let registry = Arc::new(ShieldRegistry::new());
        registry.insert("example.com", persisted());

        run_reconciler(tabs, registry, 1).await;
    }

    #[tokio::test]
    async fn hostless_page_is_a_no_op() {
        let tabs = Arc::new(TabManager::new());
        let web = Arc::new(MockWebContent::blank());
        tabs.add_tab(web.clone());

        let registry = Arc::new(ShieldRegistry::new());
        registry.insert("example.com", persisted());

        run_reconciler(tabs, registry, 1).await;
        assert_eq!(web.reload_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_signal_runs_a_single_pass() {
        let tabs = Arc::new(TabManager::new());
        let web = Arc::new(MockWebContent::at("https://example.com"));
        tabs.add_tab(web.clone());

        let registry = Arc::new(ShieldRegistry::new());
        registry.insert("example.com", persisted());

        run_reconciler(tabs, registry, 3).await;
        assert_eq!(web.reload_count(), 1);
    }
}
