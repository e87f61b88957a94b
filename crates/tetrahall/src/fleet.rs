//! Seams to the remote game-server fleet.
//!
//! The hall never owns remote connection state — the fleet collaborator
//! does. These traits are the full contract the hall consumes: drain
//! the fleet at shutdown, count members, reach one member's stub to
//! drop a table, and pick the least-loaded member to host a tournament.
//!
//! Traits instead of concrete types so production wires in the real
//! RPC client layer while tests substitute recording mocks.

use std::future::Future;

use tetrahall_protocol::TableId;

/// Failure reported by a remote game-server call.
///
/// Always best-effort from the hall's point of view: logged as a
/// warning, never fatal, and local cleanup proceeds regardless.
#[derive(Debug, thiserror::Error)]
#[error("remote call failed: {0}")]
pub struct RemoteError(pub String);

/// Handle to one remote game-server process.
pub trait GameServerStub: Send {
    /// Tells the remote server to drop a table.
    fn delete_table(
        &self,
        table_id: TableId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Membership manager for the remote game-server fleet.
pub trait Fleet: Send + Sync + 'static {
    type Stub: GameServerStub;

    /// Deactivates every remote game-server connection so the fleet
    /// stops taking new matches and unregisters as it drains.
    fn deactivate_all(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Number of game servers currently registered.
    fn num_of_gs(&self) -> usize;

    /// The stub for the game server at `ip`, if one is registered.
    fn stub(&self, ip: &str) -> Option<Self::Stub>;

    /// Address of the fleet member with the most spare capacity.
    fn best_server(&self) -> String;
}
