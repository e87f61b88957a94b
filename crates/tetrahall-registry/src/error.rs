//! Error types for the table registry.

use tetrahall_protocol::TableId;

/// Errors returned by registry and table operations.
///
/// All of these are recoverable conditions reported back to the caller.
/// The registry never logs them as errors itself — they are part of the
/// normal request flow (a user tried to sit at a full table, etc.).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A table with this id already exists.
    #[error("table {0} already exists")]
    AlreadyExists(TableId),

    /// No table with this id.
    #[error("table {0} not found")]
    NotFound(TableId),

    /// Both seats are taken — the table cannot accept another player.
    #[error("table {0} is full")]
    RoomFull(TableId),
}
