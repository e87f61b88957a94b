//! Pausable countdown ticker for Tetrahall match timers.
//!
//! A [`Countdown`] fires at a fixed interval and can be paused, resumed,
//! and reset. It drives a table's per-second match countdown: the table's
//! countdown task awaits [`Countdown::wait`], decrements its remaining
//! seconds on each tick, and exits as soon as a wait reports the ticker
//! was paused.
//!
//! The ticker keeps a stored next-deadline rather than sleeping a fresh
//! interval per call, so consecutive waits hold a steady cadence even
//! when the caller does work between ticks.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::debug;

/// Outcome of a single [`Countdown::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One full interval elapsed.
    Elapsed,
    /// The ticker was paused before (or while) the interval elapsed.
    Paused,
}

#[derive(Debug)]
struct Inner {
    paused: bool,
    /// Deadline of the next tick. `None` means the next wait arms a
    /// fresh interval from now.
    next: Option<Instant>,
}

/// A pausable fixed-interval ticker.
///
/// Starts paused; call [`start`](Self::start) to arm it. All methods
/// take `&self` — the ticker is meant to be owned by a table and shared
/// with that table's countdown task.
#[derive(Debug)]
pub struct Countdown {
    interval: Duration,
    inner: Mutex<Inner>,
    pause_signal: Notify,
}

impl Countdown {
    /// Creates a ticker firing every `interval_ms` milliseconds, paused.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            inner: Mutex::new(Inner {
                paused: true,
                next: None,
            }),
            pause_signal: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unpauses the ticker. The next [`wait`](Self::wait) arms a fresh
    /// interval if none is pending.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.paused {
            inner.paused = false;
            debug!(interval_ms = self.interval.as_millis() as u64, "countdown started");
        }
    }

    /// Pauses the ticker and wakes any in-flight [`wait`](Self::wait),
    /// which then reports [`Tick::Paused`]. Idempotent.
    pub fn pause(&self) {
        let mut inner = self.lock();
        if !inner.paused {
            inner.paused = true;
            debug!("countdown paused");
        }
        drop(inner);
        self.pause_signal.notify_waiters();
    }

    /// Discards any pending deadline so the next tick starts a full
    /// interval from the moment it is armed.
    pub fn reset(&self) {
        self.lock().next = None;
    }

    /// Whether the ticker is currently paused.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Waits for the next tick.
    ///
    /// Resolves with [`Tick::Elapsed`] when a full interval has passed,
    /// or [`Tick::Paused`] immediately if the ticker is paused — either
    /// before the call or while waiting.
    pub async fn wait(&self) -> Tick {
        let deadline = {
            let mut inner = self.lock();
            if inner.paused {
                return Tick::Paused;
            }
            let deadline = inner
                .next
                .unwrap_or_else(|| Instant::now() + self.interval);
            inner.next = Some(deadline + self.interval);
            deadline
        };

        tokio::select! {
            _ = time::sleep_until(deadline) => {
                // A pause may have landed after we registered; report it
                // rather than handing out a tick from a paused ticker.
                if self.is_paused() { Tick::Paused } else { Tick::Elapsed }
            }
            _ = self.pause_signal.notified() => Tick::Paused,
        }
    }

    /// The configured tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
