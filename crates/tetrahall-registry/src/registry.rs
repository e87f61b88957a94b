//! The table registry: the process-wide map of live tables, its sorted
//! index, and the expiry sweep.
//!
//! Detection and disposal of stale tables are deliberately split: the
//! sweep only copies expired tables into a snapshot, and a separate
//! caller (the maintenance loop) performs the side-effecting remote
//! cleanup before calling [`TableRegistry::release_expired`]. That
//! keeps slow remote calls out of the sweep's critical section.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use tetrahall_protocol::{TableId, User};

use crate::index::SortedIds;
use crate::sim::GameSim;
use crate::table::Table;
use crate::view::{TableView, DEFAULT_TABLES_PER_PAGE};
use crate::RegistryError;

/// How often the background sweep looks for expired tables.
pub const EXPIRY_SCAN_PERIOD: Duration = Duration::from_secs(5);

struct TableMaps<G: GameSim> {
    live: HashMap<TableId, Arc<Table<G>>>,
    /// Tables the sweep has flagged; always a subset of `live`. Grown
    /// only by the sweep, shrunk only by `release_expired`.
    expired: HashMap<TableId, Arc<Table<G>>>,
}

struct RegistryInner<G: GameSim> {
    maps: RwLock<TableMaps<G>>,
    index: SortedIds,
}

/// The process-wide table collection. Cheap to clone — all clones share
/// the same underlying state.
pub struct TableRegistry<G: GameSim> {
    inner: Arc<RegistryInner<G>>,
}

impl<G: GameSim> Clone for TableRegistry<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GameSim> Default for TableRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GameSim> TableRegistry<G> {
    /// Creates an empty registry. Call
    /// [`start_expiry_scan`](Self::start_expiry_scan) to begin the
    /// background sweep.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                maps: RwLock::new(TableMaps {
                    live: HashMap::new(),
                    expired: HashMap::new(),
                }),
                index: SortedIds::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TableMaps<G>> {
        self.inner.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableMaps<G>> {
        self.inner.maps.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a table, failing if the id is already taken. On success
    /// the table enters both the id map and the sorted index.
    pub fn new_table(
        &self,
        id: TableId,
        title: impl Into<String>,
        host: impl Into<String>,
        bet: u64,
    ) -> Result<Arc<Table<G>>, RegistryError> {
        let mut maps = self.write();
        if maps.live.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }
        let table = Arc::new(Table::new(id, title, host, bet));
        maps.live.insert(id, Arc::clone(&table));
        self.inner.index.add(id);
        info!(table_id = %id, "table created");
        Ok(table)
    }

    /// Deletes a table from the id map and index. Idempotent. Also
    /// drops any expired-snapshot entry, keeping the snapshot a subset
    /// of the live map.
    pub fn del_table(&self, id: TableId) {
        let mut maps = self.write();
        if let Some(table) = maps.live.remove(&id) {
            maps.expired.remove(&id);
            table.halt_countdown();
            self.inner.index.delete(id);
            info!(table_id = %id, "table deleted");
        }
    }

    /// Looks up a table by id.
    pub fn get(&self, id: TableId) -> Option<Arc<Table<G>>> {
        self.read().live.get(&id).cloned()
    }

    /// Seats `user` at table `id`, or adds them as an observer.
    ///
    /// Fails with `NotFound` for unknown ids; seat joins propagate
    /// `RoomFull`. Observer joins always succeed on a known table.
    pub fn join_table(
        &self,
        id: TableId,
        user: Arc<User>,
        as_observer: bool,
    ) -> Result<(), RegistryError> {
        let maps = self.write();
        let table = maps.live.get(&id).ok_or(RegistryError::NotFound(id))?;
        if as_observer {
            table.join_observer(user);
            return Ok(());
        }
        table.join(user)
    }

    /// Number of live tables.
    pub fn len(&self) -> usize {
        self.read().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().live.is_empty()
    }

    /// The current sorted id sequence.
    pub fn sorted_ids(&self) -> Vec<TableId> {
        self.inner.index.get_all()
    }

    /// One pass of the expiry sweep: copies every newly-expired live
    /// table into the expired snapshot. Detection only — nothing is
    /// removed from the live map here.
    pub fn scan_expired(&self) {
        let mut maps = self.write();
        let mut flagged = Vec::new();
        for (&id, table) in &maps.live {
            if !maps.expired.contains_key(&id) && table.expired() {
                flagged.push((id, Arc::clone(table)));
            }
        }
        for (id, table) in flagged {
            debug!(table_id = %id, "table expired");
            maps.expired.insert(id, table);
        }
    }

    /// Spawns the background expiry sweep, one pass every
    /// [`EXPIRY_SCAN_PERIOD`].
    pub fn start_expiry_scan(&self) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            loop {
                registry.scan_expired();
                time::sleep(EXPIRY_SCAN_PERIOD).await;
            }
        })
    }

    /// The current expired snapshot, for the maintenance loop.
    pub fn expired_tables(&self) -> Vec<(TableId, Arc<Table<G>>)> {
        self.read()
            .expired
            .iter()
            .map(|(&id, t)| (id, Arc::clone(t)))
            .collect()
    }

    /// Removes `id` from the live map, the expired snapshot, and the
    /// index — the terminal step after external cleanup has run.
    /// Idempotent; a second call is a no-op.
    pub fn release_expired(&self, id: TableId) {
        let mut maps = self.write();
        let removed = maps.live.remove(&id);
        maps.expired.remove(&id);
        self.inner.index.delete(id);
        if let Some(table) = removed {
            table.halt_countdown();
            info!(table_id = %id, "expired table released");
        }
    }

    /// Paginated listing of table views.
    ///
    /// `page` is 1-based; non-positive `page_size`/`page` fall back to
    /// 9 and 1. With `only_joinable`, tables currently in a game are
    /// filtered out before paging. A page number past the data clamps
    /// to the last page-size-aligned window ending at the final table,
    /// so callers never get an empty page from overshooting.
    pub fn paginate(&self, page_size: i64, page: i64, only_joinable: bool) -> Vec<TableView> {
        let maps = self.read();
        let mut ids = self.inner.index.get_all();
        if only_joinable {
            ids.retain(|id| maps.live.get(id).is_some_and(|t| !t.is_started()));
        }
        if ids.is_empty() {
            return Vec::new();
        }

        let size = if page_size <= 0 {
            DEFAULT_TABLES_PER_PAGE
        } else {
            page_size
        };
        let page = page.max(1);

        let mut start = (page - 1) * size;
        let mut end = page * size - 1;
        let last = ids.len() as i64 - 1;
        if last <= start {
            // Requested page is beyond the data: land on the last
            // size-aligned window that still ends at `last`.
            end = last;
            start = 0;
            while start < last {
                start += size;
            }
            start -= size;
        } else if last <= end {
            end = last;
        }
        let start = start.max(0) as usize;
        let end = end as usize;

        ids[start..=end]
            .iter()
            .filter_map(|id| maps.live.get(id))
            .map(|t| t.view())
            .collect()
    }
}

impl<G: GameSim> fmt::Display for TableRegistry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let maps = self.read();
        writeln!(f, "currently holding {} tables:", maps.live.len())?;
        for (id, table) in &maps.live {
            writeln!(f, "  table {id} -> status {}", table.status())?;
        }
        Ok(())
    }
}
