//! Bounded task runner: one tokio task per item, at most `limit` running.
//!
//! ## Concurrency Model
//!
//! - Every item gets its own spawned task up front
//! - A task acquires a semaphore permit before doing any work
//! - The permit is released when the task's future completes (RAII), on the
//!   failure paths as well
//! - [`run_bounded`] joins every task before returning
//!
//! Queued tasks are not ordered: whichever task the runtime polls first
//! gets the next free permit.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Run `task` once per item with at most `limit` instances in flight, and
/// wait for all of them.
///
/// Returns each task's output in completion order. A task that panics is
/// logged and contributes no output; the others are unaffected.
pub async fn run_bounded<T, O, F, Fut>(items: Vec<T>, limit: usize, task: F) -> Vec<O>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let task = Arc::new(task);
    let mut set = JoinSet::new();

    debug!(tasks = items.len(), limit, "scheduling bounded tasks");

    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let task = Arc::clone(&task);
        set.spawn(async move {
            // The semaphore is never closed while tasks are alive.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                error!("task semaphore closed; dropping task");
                return None;
            };
            Some(task(item).await)
        });
    }

    let mut outputs = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(e) => error!("task failed to complete: {}", e),
        }
    }
    outputs
}
