//! Process-wide admission and drain flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// The three process-wide flags that gate admission and drive the
/// shutdown drain.
///
/// One holder instead of loose globals, so ownership and lifecycle are
/// explicit: the shutdown orchestrator is the only writer of
/// `pub_server_enable` and `all_gs_released`; `prog_can_exit` is set by
/// whatever owns the background work queue once it drains. Everything
/// else only reads.
#[derive(Debug)]
pub struct ProcessFlags {
    /// Gates acceptance of new public requests.
    pub_server_enable: AtomicBool,
    /// Set once the remote fleet reaches zero members during shutdown.
    all_gs_released: AtomicBool,
    /// Set once all queued background work has drained.
    prog_can_exit: AtomicBool,
}

impl ProcessFlags {
    /// Flags for a freshly started process: accepting traffic, nothing
    /// released, nothing drained.
    pub fn new() -> Self {
        Self {
            pub_server_enable: AtomicBool::new(true),
            all_gs_released: AtomicBool::new(false),
            prog_can_exit: AtomicBool::new(false),
        }
    }

    /// Read point for admission control on public request handlers.
    pub fn pub_server_enabled(&self) -> bool {
        self.pub_server_enable.load(Ordering::SeqCst)
    }

    /// Stops admission of new public requests. One-way.
    pub fn disable_pub_server(&self) {
        self.pub_server_enable.store(false, Ordering::SeqCst);
    }

    pub fn all_gs_released(&self) -> bool {
        self.all_gs_released.load(Ordering::SeqCst)
    }

    pub fn set_all_gs_released(&self) {
        self.all_gs_released.store(true, Ordering::SeqCst);
    }

    pub fn prog_can_exit(&self) -> bool {
        self.prog_can_exit.load(Ordering::SeqCst)
    }

    pub fn set_prog_can_exit(&self) {
        self.prog_can_exit.store(true, Ordering::SeqCst);
    }
}

impl Default for ProcessFlags {
    fn default() -> Self {
        Self::new()
    }
}
