//! Periodic reaper for expired tables.
//!
//! The registry's sweep only detects stale tables; this loop disposes
//! of them. Keeping disposal out of the sweep means the slow,
//! side-effecting remote calls here never run under the registry's
//! sweep pass, and this loop stays the sole writer that takes a table
//! from "expired" to "gone".

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{info, warn};

use tetrahall_registry::{GameSim, TableRegistry};

use crate::fleet::{Fleet, GameServerStub};
use crate::supervise::spawn_supervised;
use crate::users::UserCache;

/// How often the reaper visits the expired snapshot.
pub const MAINTENANCE_PERIOD: Duration = Duration::from_secs(5);

/// The background reaper: remote-deletes, frees occupants, releases.
pub struct MaintenanceLoop<G: GameSim, F: Fleet, U: UserCache> {
    registry: TableRegistry<G>,
    fleet: Arc<F>,
    users: Arc<U>,
}

impl<G: GameSim, F: Fleet, U: UserCache> Clone for MaintenanceLoop<G, F, U> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            fleet: Arc::clone(&self.fleet),
            users: Arc::clone(&self.users),
        }
    }
}

impl<G: GameSim, F: Fleet, U: UserCache> MaintenanceLoop<G, F, U> {
    pub fn new(registry: TableRegistry<G>, fleet: Arc<F>, users: Arc<U>) -> Self {
        Self {
            registry,
            fleet,
            users,
        }
    }

    /// Spawns the loop, panic-isolated: a crashed iteration is logged
    /// and the loop relaunched.
    pub fn spawn(self) -> JoinHandle<()> {
        spawn_supervised("maintenance", move || {
            let this = self.clone();
            async move { this.run().await }
        })
    }

    async fn run(&self) {
        info!("maintenance loop started");
        loop {
            self.sweep().await;
            time::sleep(MAINTENANCE_PERIOD).await;
        }
    }

    /// One reaper pass over the expired snapshot.
    ///
    /// For each expired table: best-effort remote delete on its game
    /// server, free every occupant in the user cache, then release it
    /// from the registry. A failed remote call is logged and the local
    /// release proceeds — the remote side may already be gone.
    pub async fn sweep(&self) {
        for (table_id, table) in self.registry.expired_tables() {
            // Released by someone else since the snapshot was taken.
            if self.registry.get(table_id).is_none() {
                continue;
            }

            let ip = table.ip().to_string();
            match self.fleet.stub(&ip) {
                Some(stub) => {
                    if let Err(e) = stub.delete_table(table_id).await {
                        warn!(
                            table_id = %table_id,
                            ip = %ip,
                            error = %e,
                            "could not inform game server to delete table"
                        );
                    }
                }
                None => {
                    warn!(table_id = %table_id, ip = %ip, "no stub for game server");
                }
            }

            self.users.set_free(&table.all_user_uids());
            self.registry.release_expired(table_id);
        }
    }
}
