//! Tournament lifecycle trigger.
//!
//! The bracket's internal logic lives outside this crate. The hall's
//! only responsibility is the replacement cycle: keep exactly one
//! bracket alive, and when it ends (or none exists yet), build the
//! next one from the latest tournament configuration, hosted on the
//! fleet member with the most spare capacity.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::info;

use crate::fleet::Fleet;
use crate::supervise::spawn_supervised;

/// How often the scheduler checks whether the bracket needs replacing.
pub const TOURNAMENT_PERIOD: Duration = Duration::from_secs(5);

/// Configuration for the next tournament.
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub candidate_count: u32,
    pub gold_award: u64,
    pub silver_award: u64,
    pub sponsor: String,
}

/// A running tournament bracket.
pub trait Bracket: Send + Sync + 'static {
    /// Whether this tournament has finished.
    fn ended(&self) -> bool;
}

/// Builds a bracket from a configuration and a host address.
pub trait BracketFactory: Send + Sync + 'static {
    type Bracket: Bracket;

    fn new_hall(&self, config: &TournamentConfig, host_addr: &str) -> Self::Bracket;
}

/// Latest-value source of the next tournament's configuration.
pub trait NextTournamentSource: Send + Sync + 'static {
    fn flash_get(&self) -> impl Future<Output = TournamentConfig> + Send;
}

/// The singleton bracket slot, shared with whatever reads tournaments.
pub type SharedBracket<B> = Arc<RwLock<Option<B>>>;

/// Periodic loop replacing the bracket once it ends.
///
/// Never runs concurrently with itself — there is exactly one spawned
/// loop per scheduler. Replacement is visible to readers of the shared
/// slot on the next read; there is no staleness guarantee tighter than
/// the check period.
pub struct TournamentScheduler<F: Fleet, S: NextTournamentSource, B: BracketFactory> {
    fleet: Arc<F>,
    source: Arc<S>,
    factory: Arc<B>,
    current: SharedBracket<B::Bracket>,
    game_server_port: u16,
}

impl<F: Fleet, S: NextTournamentSource, B: BracketFactory> Clone
    for TournamentScheduler<F, S, B>
{
    fn clone(&self) -> Self {
        Self {
            fleet: Arc::clone(&self.fleet),
            source: Arc::clone(&self.source),
            factory: Arc::clone(&self.factory),
            current: Arc::clone(&self.current),
            game_server_port: self.game_server_port,
        }
    }
}

impl<F: Fleet, S: NextTournamentSource, B: BracketFactory> TournamentScheduler<F, S, B> {
    pub fn new(
        fleet: Arc<F>,
        source: Arc<S>,
        factory: Arc<B>,
        game_server_port: u16,
    ) -> Self {
        Self {
            fleet,
            source,
            factory,
            current: Arc::new(RwLock::new(None)),
            game_server_port,
        }
    }

    /// The shared bracket slot, for readers.
    pub fn bracket(&self) -> SharedBracket<B::Bracket> {
        Arc::clone(&self.current)
    }

    /// Spawns the replacement loop, panic-isolated.
    pub fn spawn(self) -> JoinHandle<()> {
        spawn_supervised("tournament", move || {
            let this = self.clone();
            async move { this.run().await }
        })
    }

    async fn run(&self) {
        info!("tournament scheduler started");
        loop {
            time::sleep(TOURNAMENT_PERIOD).await;
            self.replace_if_ended().await;
        }
    }

    /// Builds a fresh bracket when none exists or the current one has
    /// ended; otherwise does nothing.
    pub async fn replace_if_ended(&self) {
        let needs_new = match &*self.current.read().await {
            None => true,
            Some(bracket) => bracket.ended(),
        };
        if !needs_new {
            return;
        }

        let config = self.source.flash_get().await;
        let host = format!("{}:{}", self.fleet.best_server(), self.game_server_port);
        let bracket = self.factory.new_hall(&config, &host);
        *self.current.write().await = Some(bracket);
        info!(
            host = %host,
            sponsor = %config.sponsor,
            candidates = config.candidate_count,
            "new tournament bracket created"
        );
    }
}
