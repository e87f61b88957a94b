//! Read-only table views returned by paginated listing.

use serde::Serialize;

use tetrahall_protocol::{TableId, TableStatus, User, UserId};

/// Default page size when the caller passes a non-positive one.
pub(crate) const DEFAULT_TABLES_PER_PAGE: i64 = 9;

/// A user as shown in a table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub uid: UserId,
    pub name: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid,
            name: user.name.clone(),
        }
    }
}

/// A snapshot of one table, safe to hand to a serialization layer.
///
/// Built under the table's lock, so seats and ready flags are mutually
/// consistent at the moment of the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub id: TableId,
    pub title: String,
    pub host: String,
    pub status: TableStatus,
    pub bet: u64,
    pub player_one: Option<UserView>,
    pub player_two: Option<UserView>,
    pub player_one_ready: bool,
    pub player_two_ready: bool,
    pub observers: Vec<UserView>,
}
