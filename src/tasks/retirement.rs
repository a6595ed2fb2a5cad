//! Retirement Task
//!
//! Background task that runs queued retirement passes whenever a put on a
//! [`SharedStore`] signals that the store may be over budget.

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::shared::SharedStore;

/// Spawns the retirement worker for a shared store.
///
/// The task loops forever: it waits for a put to signal work, acquires the
/// write lock and drains every queued pass. Signals that arrive while a pass
/// is running are coalesced into one wakeup, and since a drain runs every
/// queued pass none are lost.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let shared = SharedStore::from_config(StoreConfig::default().with_max_size(1024));
/// let worker = spawn_retirement_task(shared.clone());
/// // Later, during shutdown:
/// worker.abort();
/// ```
pub fn spawn_retirement_task<V>(shared: SharedStore<V>) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting retirement worker");

        loop {
            shared.retirement_requested().await;

            let evicted = shared.run_pending_retirements().await;

            if evicted > 0 {
                debug!("Retirement worker evicted {} entries", evicted);
            }
        }
    })
}
