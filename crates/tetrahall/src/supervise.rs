//! Panic-isolated background tasks.
//!
//! The maintenance and tournament loops must be self-healing: nothing
//! restarts this process if a loop dies, so a panic in one iteration is
//! caught and the loop is relaunched rather than propagated.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::error;

/// Runs `task` as a supervised background task.
///
/// Each generation of the task runs in its own tokio task. If a
/// generation panics, the panic is logged at error level and a new
/// generation is spawned from the factory; a clean return ends the
/// supervision. The returned handle covers the supervisor itself —
/// aborting it stops the current generation from being replaced.
pub fn spawn_supervised<F, Fut>(name: &'static str, mut task: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match tokio::spawn(task()).await {
                Ok(()) => break,
                Err(e) if e.is_panic() => {
                    error!(task = name, "background task panicked, relaunching");
                }
                // Cancelled: the runtime is going away.
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_panicking_generation_is_relaunched() {
        let generations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&generations);

        let handle = spawn_supervised("test-loop", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("iteration blew up");
                }
            }
        });

        handle.await.unwrap();
        assert_eq!(generations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clean_return_ends_supervision() {
        let generations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&generations);

        let handle = spawn_supervised("test-loop", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {}
        });

        handle.await.unwrap();
        assert_eq!(generations.load(Ordering::SeqCst), 1);
    }
}
