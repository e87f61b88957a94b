//! Signal-driven, multi-stage graceful shutdown.
//!
//! The drain is a linear, one-shot sequence — each stage is a
//! precondition for the next and there is no rollback:
//!
//! 1. stop admitting public requests (in-flight ones may finish)
//! 2. deactivate every remote game-server connection (best effort)
//! 3. wait until the fleet has zero registered members
//! 4. wait until all queued background work reports completion
//!
//! Both waits are unbounded by design: the reference behavior is to
//! wait forever rather than abandon a half-drained fleet. The spin is
//! replaced by a sleep-poll so the wait doesn't burn a core.

use std::sync::Arc;

use tokio::time::{self, Duration};
use tracing::{info, warn};

use crate::flags::ProcessFlags;
use crate::fleet::Fleet;

/// Pause between the drain finishing and the process exiting, so final
/// log output gets flushed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Coordinates the drain sequence against the fleet and process flags.
pub struct ShutdownOrchestrator<F: Fleet> {
    flags: Arc<ProcessFlags>,
    fleet: Arc<F>,
    poll_interval: Duration,
}

impl<F: Fleet> ShutdownOrchestrator<F> {
    pub fn new(flags: Arc<ProcessFlags>, fleet: Arc<F>) -> Self {
        Self {
            flags,
            fleet,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides how often the two drain waits re-check their
    /// condition.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Runs the four-stage drain. Returns once the process may exit.
    pub async fn drain(&self) {
        self.flags.disable_pub_server();
        info!("public server disabled, deactivating game servers");

        if let Err(e) = self.fleet.deactivate_all().await {
            warn!(error = %e, "errors occurred while deactivating game servers");
        }

        while self.fleet.num_of_gs() > 0 {
            time::sleep(self.poll_interval).await;
        }
        self.flags.set_all_gs_released();
        info!("all game servers released");

        while !self.flags.prog_can_exit() {
            time::sleep(self.poll_interval).await;
        }
        info!("background work drained");
    }

    /// Waits for SIGINT/SIGTERM, drains, pauses for the log-flush
    /// grace period, and terminates the process with a non-zero
    /// status. Never returns.
    pub async fn run(self) {
        wait_for_signal().await;
        self.drain().await;
        info!("the hall server is exiting gracefully");
        time::sleep(SHUTDOWN_GRACE).await;
        std::process::exit(1);
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "could not install SIGTERM handler, waiting on interrupt only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
