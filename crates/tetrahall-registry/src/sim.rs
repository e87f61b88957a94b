//! Seam to the external game-piece simulation engine.
//!
//! The engine that actually runs a match lives outside this crate. A
//! table constructs one simulation per seat when a game starts and
//! stops both when it ends; everything in between is the engine's
//! business.

/// Board height used for every match.
pub const ZONE_HEIGHT: usize = 20;
/// Board width used for every match.
pub const ZONE_WIDTH: usize = 10;
/// How many upcoming pieces the engine exposes to players.
pub const LOOKAHEAD_PIECES: usize = 5;
/// Simulation tick interval in milliseconds.
pub const SIM_TICK_MS: u64 = 1000;

/// Failure constructing a simulation instance.
#[derive(Debug, thiserror::Error)]
#[error("simulation error: {0}")]
pub struct SimError(pub String);

/// One player's running match simulation.
pub trait GameSim: Send + 'static {
    /// Builds a simulation for the given board and pacing parameters.
    fn new_game(
        height: usize,
        width: usize,
        lookahead: usize,
        tick_ms: u64,
    ) -> Result<Self, SimError>
    where
        Self: Sized;

    /// Begins running the simulation.
    fn start(&mut self);

    /// Halts the simulation.
    fn stop(&mut self);
}
