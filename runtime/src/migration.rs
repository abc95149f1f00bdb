//! One-shot migration of the anonymous cart into the durable backend.
//!
//! The flag only advances forward: it is created `NotMigrated` on first
//! anonymous use, set `Migrated` only after a successful transfer, and never
//! reset automatically. A failed transfer leaves it untouched, so the next
//! qualifying sign-in retries while the user keeps working against the
//! ephemeral backend.

use crate::backend::CartBackend;
use crate::device::{DeviceStore, EphemeralBackend};
use basecamp_cart_core::{LineItem, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const FLAG_KEY: &str = "migration";

/// Migration progress for this device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// Transfer has not run (or has only failed)
    NotMigrated,
    /// Transfer is in flight (in-process only, never persisted)
    Migrating,
    /// Transfer completed; terminal
    Migrated,
}

/// Coordinates the anonymous-to-durable cart transfer.
pub struct MigrationCoordinator {
    device: DeviceStore,
    // In-process view; the persisted flag only ever records NotMigrated or
    // Migrated.
    state: Mutex<Option<MigrationState>>,
}

impl MigrationCoordinator {
    /// Creates a coordinator persisting its flag through the device store.
    #[must_use]
    pub fn new(device: DeviceStore) -> Self {
        Self {
            device,
            state: Mutex::new(None),
        }
    }

    /// Current migration state.
    ///
    /// An unreadable flag file is treated as `NotMigrated` so a corrupted
    /// device store can never block the cart.
    pub async fn state(&self) -> MigrationState {
        let mut cached = self.state.lock().await;
        if let Some(state) = *cached {
            return state;
        }
        let state = match self.device.read::<MigrationState>(FLAG_KEY).await {
            Ok(Some(state)) => state,
            Ok(None) => MigrationState::NotMigrated,
            Err(error) => {
                tracing::warn!(%error, "unreadable migration flag, assuming not migrated");
                MigrationState::NotMigrated
            }
        };
        *cached = Some(state);
        state
    }

    /// Runs the transfer if it is still pending and returns the durable
    /// backend's canonical item list.
    ///
    /// Already-migrated devices skip straight to a durable read, so calling
    /// this on every sign-in is safe: repeated logins cannot re-import.
    /// On failure the flag stays `NotMigrated` and the ephemeral cart is
    /// left intact.
    ///
    /// # Errors
    ///
    /// Returns the ephemeral read error or the durable import/read error;
    /// the caller should keep operating against the ephemeral backend.
    pub async fn run(
        &self,
        ephemeral: &EphemeralBackend,
        durable: &dyn CartBackend,
    ) -> Result<Vec<LineItem>> {
        if self.state().await == MigrationState::Migrated {
            return durable.load().await;
        }

        self.set_cached(MigrationState::Migrating).await;
        match self.transfer(ephemeral, durable).await {
            Ok(canonical) => {
                self.complete().await;
                Ok(canonical)
            }
            Err(error) => {
                self.set_cached(MigrationState::NotMigrated).await;
                tracing::warn!(%error, "cart migration failed, staying on ephemeral backend");
                Err(error)
            }
        }
    }

    async fn transfer(
        &self,
        ephemeral: &EphemeralBackend,
        durable: &dyn CartBackend,
    ) -> Result<Vec<LineItem>> {
        let items = ephemeral.load().await?;
        if items.is_empty() {
            tracing::debug!("ephemeral cart empty, adopting durable cart as-is");
            return durable.load().await;
        }

        let canonical = durable.import(&items).await?;
        if let Err(error) = ephemeral.clear().await {
            // The flag below still prevents a re-import; the stale local
            // file is only dead weight.
            tracing::warn!(%error, "failed to clear ephemeral cart after migration");
        }
        tracing::info!(
            migrated = items.len(),
            canonical = canonical.len(),
            "migrated ephemeral cart to durable backend"
        );
        Ok(canonical)
    }

    async fn complete(&self) {
        if let Err(error) = self.device.write(FLAG_KEY, &MigrationState::Migrated).await {
            // In-process state still advances; only a restart before the
            // next successful write could re-run the transfer.
            tracing::warn!(%error, "failed to persist migration flag");
        }
        self.set_cached(MigrationState::Migrated).await;
    }

    async fn set_cached(&self, state: MigrationState) {
        *self.state.lock().await = Some(state);
    }
}
