//! # Tetrahall
//!
//! Hall orchestration for the Tetrahall lobby server: the background
//! loops and shutdown machinery that sit on top of the table registry.
//!
//! The registry itself (tables, seats, expiry detection, pagination)
//! lives in `tetrahall-registry`; this crate consumes it and adds:
//!
//! - [`MaintenanceLoop`] — reaps expired tables: remote delete, free
//!   occupants, release
//! - [`TournamentScheduler`] — keeps the singleton tournament bracket
//!   replaced once it ends
//! - [`ShutdownOrchestrator`] — signal-driven four-stage drain
//! - [`ProcessFlags`] — the process-wide admission/drain flags
//! - the collaborator seams: [`Fleet`], [`UserCache`], and the
//!   tournament traits

mod flags;
mod fleet;
mod maintenance;
mod shutdown;
mod supervise;
mod tournament;
mod users;

pub use flags::ProcessFlags;
pub use fleet::{Fleet, GameServerStub, RemoteError};
pub use maintenance::{MaintenanceLoop, MAINTENANCE_PERIOD};
pub use shutdown::{ShutdownOrchestrator, SHUTDOWN_GRACE};
pub use supervise::spawn_supervised;
pub use tournament::{
    Bracket, BracketFactory, NextTournamentSource, SharedBracket, TournamentConfig,
    TournamentScheduler, TOURNAMENT_PERIOD,
};
pub use users::UserCache;
