//! Seam to the external user cache.

use tetrahall_protocol::UserId;

/// The cache tracking which users are busy at a table vs. free.
///
/// The cache owns every user record; tables only hold references.
/// Releasing users back to the free pool is the maintenance loop's
/// job, never a table's.
pub trait UserCache: Send + Sync + 'static {
    /// Marks users as no longer occupied by any table.
    fn set_free(&self, uids: &[UserId]);
}
