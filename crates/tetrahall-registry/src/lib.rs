//! Table registry and match state machine for the Tetrahall lobby server.
//!
//! This crate is the authoritative in-memory record of every active
//! table: who is seated where, who is ready, which matches are running,
//! and which tables have gone stale.
//!
//! # Key types
//!
//! - [`TableRegistry`] — creates/deletes tables, runs the expiry sweep,
//!   serves paginated listings
//! - [`Table`] — one match's state machine (seats, readiness, countdown)
//! - [`SortedIds`] — the ascending id index behind pagination
//! - [`GameSim`] — the seam to the external match simulation engine
//! - [`RegistryError`] — the recoverable failure taxonomy

mod error;
mod index;
mod registry;
mod sim;
mod table;
mod view;

pub use error::RegistryError;
pub use index::SortedIds;
pub use registry::{TableRegistry, EXPIRY_SCAN_PERIOD};
pub use sim::{GameSim, SimError, LOOKAHEAD_PIECES, SIM_TICK_MS, ZONE_HEIGHT, ZONE_WIDTH};
pub use table::{Table, GAME_SECONDS};
pub use view::{TableView, UserView};
