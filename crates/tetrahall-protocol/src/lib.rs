//! Shared identity and status types for the Tetrahall lobby server.
//!
//! Everything here is plain data: id newtypes, the user record, and the
//! two small enums describing a table's lifecycle. The registry, the
//! maintenance loops, and whatever request-handler layer sits on top all
//! speak in these types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a table (one two-player match plus observers).
///
/// Ids are assigned by the caller at creation and never change. The
/// newtype keeps them from mixing with user ids in signatures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A unique identifier for a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user as known to the hall.
///
/// The external user cache owns the authoritative record; tables hold
/// shared references and never free users themselves. Marking a user
/// free again is always the maintenance layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub name: String,
}

impl User {
    pub fn new(uid: u64, name: impl Into<String>) -> Self {
        Self {
            uid: UserId(uid),
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table status
// ---------------------------------------------------------------------------

/// Lifecycle status of a table.
///
/// Tables cycle `Waiting → InGame → Waiting`; there is no terminal
/// state — a table lives until the registry releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStatus {
    /// Seats may be filling up, nobody is playing yet.
    Waiting,
    /// Both players are in a running match.
    InGame,
}

impl TableStatus {
    /// Returns `true` if a match is currently running.
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InGame)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::InGame => write!(f, "InGame"),
        }
    }
}

// ---------------------------------------------------------------------------
// Game-over reasons
// ---------------------------------------------------------------------------

/// Why a running game ended, as reported on a table's game-over channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// The match countdown ran out.
    Timeout,
    /// Seat 1's occupant quit mid-game.
    PlayerOneQuit,
    /// Seat 2's occupant quit mid-game.
    PlayerTwoQuit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(TableId(7).to_string(), "T-7");
        assert_eq!(UserId(42).to_string(), "U-42");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&TableId(3)).unwrap();
        assert_eq!(json, "3");
        let back: TableId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TableId(3));
    }

    #[test]
    fn test_table_ids_order_numerically() {
        let mut ids = vec![TableId(10), TableId(2), TableId(7)];
        ids.sort();
        assert_eq!(ids, vec![TableId(2), TableId(7), TableId(10)]);
    }

    #[test]
    fn test_status_is_in_game() {
        assert!(TableStatus::InGame.is_in_game());
        assert!(!TableStatus::Waiting.is_in_game());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TableStatus::Waiting.to_string(), "Waiting");
        assert_eq!(TableStatus::InGame.to_string(), "InGame");
    }
}
