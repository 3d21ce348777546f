use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

use crate::store::{DocumentStore, UserRegistry};

/// Periodic reconciliation with the backing files: any write that changes a
/// modified-time, whoever made it, triggers a reload within one interval.
/// No request is needed for external edits to become visible.
pub fn spawn_watcher(
    store: Arc<DocumentStore>,
    registry: Arc<UserRegistry>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // tokio::time::interval panics on a zero period
        let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seen_data = data_mtimes(&store);
        let mut seen_users = mtime(registry.path());
        loop {
            ticker.tick().await;
            let data_now = data_mtimes(&store);
            if data_now != seen_data {
                seen_data = data_now;
                store.load();
                info!("data files changed on disk, snapshot reloaded");
            }
            let users_now = mtime(registry.path());
            if users_now != seen_users {
                seen_users = users_now;
                registry.load();
                info!("users file changed on disk, registry reloaded");
            }
        }
    })
}

fn data_mtimes(store: &DocumentStore) -> (Option<SystemTime>, Option<SystemTime>) {
    (mtime(store.primary_path()), mtime(store.fallback_path()))
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
