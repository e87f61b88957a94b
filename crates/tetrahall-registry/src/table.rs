//! Table: one match's complete mutable state.
//!
//! A table holds two player seats, an observer set, per-seat readiness
//! flags, the match countdown, and (while a game runs) one simulation
//! instance per seat. Every mutable field lives behind the table's own
//! mutex; identity fields (`id`, `title`, `host`, `bet`) are fixed at
//! creation and read lock-free.
//!
//! Lock ordering: a table's methods never touch the registry or the
//! sorted index. Callers holding the registry lock may take a table
//! lock, never the reverse.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tetrahall_protocol::{GameOverReason, TableId, TableStatus, User, UserId};
use tetrahall_timer::{Countdown, Tick};

use crate::sim::{GameSim, SimError, LOOKAHEAD_PIECES, SIM_TICK_MS, ZONE_HEIGHT, ZONE_WIDTH};
use crate::view::{TableView, UserView};
use crate::RegistryError;

/// Countdown granted to each game, in seconds.
pub const GAME_SECONDS: i64 = 120;

/// Countdown tick interval.
const COUNTDOWN_INTERVAL_MS: u64 = 1000;

/// Depth of the tick and game-over channels. Sends never block: a
/// full channel drops the value rather than stalling the countdown.
const SIGNAL_CHANNEL_DEPTH: usize = 8;

/// An empty table is reclaimed after this many seconds.
const MAX_NO_PLAYER_SECS: u64 = 10;
/// A running game is reclaimed after this many seconds of play.
const MAX_GAME_SECS: u64 = 300;
/// An occupied-but-waiting table is reclaimed after this many seconds.
const MAX_IDLE_SECS: u64 = 3600;

#[derive(Debug)]
struct TableInner<G> {
    status: TableStatus,
    seat_one: Option<Arc<User>>,
    seat_two: Option<Arc<User>>,
    ready_one: bool,
    ready_two: bool,
    observers: HashMap<UserId, Arc<User>>,
    sim_one: Option<G>,
    sim_two: Option<G>,
    /// Wall-clock stamp of the last transition into Waiting or InGame.
    start_time: Instant,
    remained_seconds: i64,
}

/// Receiver ends of the table's outbound signal channels, handed out
/// once to whatever forwards them to clients.
#[derive(Debug)]
struct SignalReceivers {
    ticks: Option<mpsc::Receiver<i64>>,
    game_over: Option<mpsc::Receiver<GameOverReason>>,
}

/// One match instance. Created and owned by the registry; shared as
/// `Arc<Table<G>>` with request handlers and the table's countdown task.
#[derive(Debug)]
pub struct Table<G: GameSim> {
    id: TableId,
    title: String,
    host: String,
    bet: u64,
    timer: Countdown,
    tick_tx: mpsc::Sender<i64>,
    game_over_tx: mpsc::Sender<GameOverReason>,
    receivers: Mutex<SignalReceivers>,
    inner: Mutex<TableInner<G>>,
}

impl<G: GameSim> Table<G> {
    /// Creates a table in the `Waiting` state with an armed-but-paused
    /// countdown and empty seats.
    pub fn new(id: TableId, title: impl Into<String>, host: impl Into<String>, bet: u64) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(SIGNAL_CHANNEL_DEPTH);
        let (game_over_tx, game_over_rx) = mpsc::channel(SIGNAL_CHANNEL_DEPTH);
        Self {
            id,
            title: title.into(),
            host: host.into(),
            bet,
            timer: Countdown::new(COUNTDOWN_INTERVAL_MS),
            tick_tx,
            game_over_tx,
            receivers: Mutex::new(SignalReceivers {
                ticks: Some(tick_rx),
                game_over: Some(game_over_rx),
            }),
            inner: Mutex::new(TableInner {
                status: TableStatus::Waiting,
                seat_one: None,
                seat_two: None,
                ready_one: false,
                ready_two: false,
                observers: HashMap::new(),
                sim_one: None,
                sim_two: None,
                start_time: Instant::now(),
                remained_seconds: GAME_SECONDS,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableInner<G>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The hosting game server, as `"ip:port"`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The ip portion of [`host`](Self::host).
    pub fn ip(&self) -> &str {
        self.host.split(':').next().unwrap_or(&self.host)
    }

    pub fn bet(&self) -> u64 {
        self.bet
    }

    // -----------------------------------------------------------------
    // Occupancy
    // -----------------------------------------------------------------

    /// Seats a player: seat 1 if empty, else seat 2, else `RoomFull`.
    pub fn join(&self, user: Arc<User>) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        if inner.seat_one.is_none() {
            info!(table_id = %self.id, uid = %user.uid, seat = 1, "player joined");
            inner.seat_one = Some(user);
        } else if inner.seat_two.is_none() {
            info!(table_id = %self.id, uid = %user.uid, seat = 2, "player joined");
            inner.seat_two = Some(user);
        } else {
            return Err(RegistryError::RoomFull(self.id));
        }
        Ok(())
    }

    /// Adds an observer. Always succeeds; re-joining replaces the old
    /// entry.
    pub fn join_observer(&self, user: Arc<User>) {
        let mut inner = self.lock();
        debug!(table_id = %self.id, uid = %user.uid, "observer joined");
        inner.observers.insert(user.uid, user);
    }

    /// Removes `uid` from whichever role it holds: vacating a seat
    /// clears that seat's ready flag; otherwise the uid is dropped from
    /// the observers. Unknown uids are a no-op.
    pub fn quit(&self, uid: UserId) {
        let mut inner = self.lock();
        if inner.seat_one.as_ref().is_some_and(|u| u.uid == uid) {
            inner.seat_one = None;
            inner.ready_one = false;
            info!(table_id = %self.id, %uid, seat = 1, "player quit");
        } else if inner.seat_two.as_ref().is_some_and(|u| u.uid == uid) {
            inner.seat_two = None;
            inner.ready_two = false;
            info!(table_id = %self.id, %uid, seat = 2, "player quit");
        } else if inner.observers.remove(&uid).is_some() {
            debug!(table_id = %self.id, %uid, "observer quit");
        }
    }

    /// Drops every observer at once.
    pub fn quit_all_observers(&self) {
        self.lock().observers.clear();
    }

    pub fn is_full(&self) -> bool {
        let inner = self.lock();
        inner.seat_one.is_some() && inner.seat_two.is_some()
    }

    pub fn has_no_player(&self) -> bool {
        let inner = self.lock();
        inner.seat_one.is_none() && inner.seat_two.is_none()
    }

    // -----------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------

    /// Toggles the ready flag of whichever seat `uid` occupies. No-op
    /// when `uid` matches neither seat.
    pub fn switch_ready(&self, uid: UserId) {
        let mut inner = self.lock();
        if inner.seat_one.as_ref().is_some_and(|u| u.uid == uid) {
            inner.ready_one = !inner.ready_one;
        } else if inner.seat_two.as_ref().is_some_and(|u| u.uid == uid) {
            inner.ready_two = !inner.ready_two;
        }
    }

    /// True iff both seats are ready. The caller decides whether to
    /// invoke [`start_game`](Self::start_game) in response.
    pub fn should_start(&self) -> bool {
        let inner = self.lock();
        inner.ready_one && inner.ready_two
    }

    // -----------------------------------------------------------------
    // Game lifecycle
    // -----------------------------------------------------------------

    /// Starts the match: builds both simulations, starts them and the
    /// countdown ticker, stamps the transition, and spawns the table's
    /// countdown task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_game(self: &Arc<Self>) -> Result<(), SimError> {
        {
            let mut inner = self.lock();
            let mut sim_one =
                G::new_game(ZONE_HEIGHT, ZONE_WIDTH, LOOKAHEAD_PIECES, SIM_TICK_MS)?;
            let mut sim_two =
                G::new_game(ZONE_HEIGHT, ZONE_WIDTH, LOOKAHEAD_PIECES, SIM_TICK_MS)?;
            sim_one.start();
            sim_two.start();
            inner.sim_one = Some(sim_one);
            inner.sim_two = Some(sim_two);
            self.timer.start();
            inner.start_time = Instant::now();
            inner.status = TableStatus::InGame;
        }
        info!(table_id = %self.id, "game started");
        let table = Arc::clone(self);
        tokio::spawn(async move { table.run_countdown().await });
        Ok(())
    }

    /// Stops the match: pauses and resets the ticker (ending the
    /// countdown task), stops both simulations, and returns to
    /// `Waiting` with a fresh transition stamp.
    pub fn stop_game(&self) {
        self.timer.pause();
        self.timer.reset();
        let mut inner = self.lock();
        if let Some(sim) = inner.sim_one.as_mut() {
            sim.stop();
        }
        if let Some(sim) = inner.sim_two.as_mut() {
            sim.stop();
        }
        inner.status = TableStatus::Waiting;
        inner.start_time = Instant::now();
        drop(inner);
        info!(table_id = %self.id, "game stopped");
    }

    /// Returns the table to a clean `Waiting` baseline: no simulations,
    /// both ready flags cleared, countdown back at [`GAME_SECONDS`].
    pub fn reset_table(&self) {
        let mut inner = self.lock();
        inner.sim_one = None;
        inner.sim_two = None;
        inner.ready_one = false;
        inner.ready_two = false;
        inner.remained_seconds = GAME_SECONDS;
        inner.status = TableStatus::Waiting;
    }

    /// Pauses the countdown ticker so the table's countdown task (if
    /// any) winds down. Called by the registry when releasing a table.
    pub(crate) fn halt_countdown(&self) {
        self.timer.pause();
    }

    /// The table's countdown loop. One logical thread of control per
    /// table while a game is in progress.
    ///
    /// Each tick decrements the remaining seconds under the table lock.
    /// At zero a normal-timeout game-over signal is pushed and the loop
    /// exits; otherwise the new remainder goes out on the tick channel.
    /// The loop exits without signaling when the ticker is paused.
    async fn run_countdown(self: Arc<Self>) {
        loop {
            if self.timer.is_paused() {
                return;
            }
            if self.timer.wait().await == Tick::Paused {
                return;
            }
            let remaining = {
                let mut inner = self.lock();
                inner.remained_seconds -= 1;
                inner.remained_seconds
            };
            if remaining <= 0 {
                self.signal_game_over(GameOverReason::Timeout);
                return;
            }
            // try_send: a slow reader must never stall the countdown.
            if self.tick_tx.try_send(remaining).is_err() {
                debug!(table_id = %self.id, remaining, "tick channel full, dropping update");
            }
        }
    }

    /// Pushes a game-over reason on the table's signal channel.
    /// Non-blocking; a full channel drops the signal with a warning.
    pub fn signal_game_over(&self, reason: GameOverReason) {
        if self.game_over_tx.try_send(reason).is_err() {
            warn!(table_id = %self.id, ?reason, "game-over channel full, dropping signal");
        }
    }

    /// Takes the tick-channel receiver. `None` after the first call.
    pub fn take_tick_rx(&self) -> Option<mpsc::Receiver<i64>> {
        self.receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ticks
            .take()
    }

    /// Takes the game-over-channel receiver. `None` after the first call.
    pub fn take_game_over_rx(&self) -> Option<mpsc::Receiver<GameOverReason>> {
        self.receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .game_over
            .take()
    }

    // -----------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------

    /// Whether the table is due for reclamation.
    ///
    /// Measured from the last state transition: an empty table expires
    /// after 10 s, a running game after 300 s, an occupied-but-waiting
    /// table after an hour. Abandoned empty tables go first; a game
    /// past 300 s has either finished or lost its clients.
    pub fn expired(&self) -> bool {
        let inner = self.lock();
        let elapsed = inner.start_time.elapsed();
        if inner.seat_one.is_none() && inner.seat_two.is_none() {
            return elapsed > Duration::from_secs(MAX_NO_PLAYER_SECS);
        }
        if inner.status.is_in_game() {
            return elapsed > Duration::from_secs(MAX_GAME_SECS);
        }
        elapsed > Duration::from_secs(MAX_IDLE_SECS)
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn status(&self) -> TableStatus {
        self.lock().status
    }

    /// Whether a match is currently running.
    pub fn is_started(&self) -> bool {
        self.lock().status.is_in_game()
    }

    /// Seconds left on the match countdown.
    pub fn remained_seconds(&self) -> i64 {
        self.lock().remained_seconds
    }

    /// Uids of the seated players, seat 1 first.
    pub fn player_uids(&self) -> Vec<UserId> {
        let inner = self.lock();
        inner
            .seat_one
            .iter()
            .chain(inner.seat_two.iter())
            .map(|u| u.uid)
            .collect()
    }

    /// Uids of every observer.
    pub fn observer_uids(&self) -> Vec<UserId> {
        self.lock().observers.keys().copied().collect()
    }

    /// Uids of everyone at the table: observers and seated players.
    pub fn all_user_uids(&self) -> Vec<UserId> {
        let inner = self.lock();
        let mut uids: Vec<UserId> = inner.observers.keys().copied().collect();
        uids.extend(inner.seat_one.iter().map(|u| u.uid));
        uids.extend(inner.seat_two.iter().map(|u| u.uid));
        uids
    }

    /// The other seat's uid, if `uid` is seated and has an opponent.
    pub fn opponent_of(&self, uid: UserId) -> Option<UserId> {
        let inner = self.lock();
        if inner.seat_one.as_ref().is_some_and(|u| u.uid == uid) {
            return inner.seat_two.as_ref().map(|u| u.uid);
        }
        if inner.seat_two.as_ref().is_some_and(|u| u.uid == uid) {
            return inner.seat_one.as_ref().map(|u| u.uid);
        }
        None
    }

    /// Whether `uid` occupies seat 1.
    pub fn is_player_one(&self, uid: UserId) -> bool {
        self.lock().seat_one.as_ref().is_some_and(|u| u.uid == uid)
    }

    /// Looks up a seated player or observer by uid.
    pub fn user_by_id(&self, uid: UserId) -> Option<Arc<User>> {
        let inner = self.lock();
        if let Some(u) = inner.seat_one.as_ref().filter(|u| u.uid == uid) {
            return Some(Arc::clone(u));
        }
        if let Some(u) = inner.seat_two.as_ref().filter(|u| u.uid == uid) {
            return Some(Arc::clone(u));
        }
        inner.observers.get(&uid).cloned()
    }

    /// Whether `uid` is seated or observing.
    pub fn contains_user(&self, uid: UserId) -> bool {
        let inner = self.lock();
        inner.seat_one.as_ref().is_some_and(|u| u.uid == uid)
            || inner.seat_two.as_ref().is_some_and(|u| u.uid == uid)
            || inner.observers.contains_key(&uid)
    }

    /// Borrows both seats' simulation instances under the table lock.
    ///
    /// Present only while a game is running; `reset_table` clears them.
    /// This is how a handler drives the engines (piece moves, field
    /// queries) without the table exposing its lock.
    pub fn with_sims<R>(&self, f: impl FnOnce(Option<&mut G>, Option<&mut G>) -> R) -> R {
        let mut inner = self.lock();
        let TableInner { sim_one, sim_two, .. } = &mut *inner;
        f(sim_one.as_mut(), sim_two.as_mut())
    }

    /// A consistent snapshot of the table for listing.
    pub fn view(&self) -> TableView {
        let inner = self.lock();
        TableView {
            id: self.id,
            title: self.title.clone(),
            host: self.host.clone(),
            status: inner.status,
            bet: self.bet,
            player_one: inner.seat_one.as_deref().map(UserView::from),
            player_two: inner.seat_two.as_deref().map(UserView::from),
            player_one_ready: inner.ready_one,
            player_two_ready: inner.ready_two,
            observers: inner.observers.values().map(|u| UserView::from(u.as_ref())).collect(),
        }
    }
}
