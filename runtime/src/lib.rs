//! # Basecamp Cart Runtime
//!
//! Imperative shell around [`basecamp_cart_core`]: the persistence backends,
//! the one-shot anonymous-to-authenticated migration, and the [`CartStore`]
//! that coordinates them.
//!
//! ## Architecture
//!
//! - [`CartBackend`]: one async read/write contract, two interchangeable
//!   implementations — the device-local [`EphemeralBackend`] used while
//!   anonymous, and the HTTP [`RemoteBackend`] used once authenticated.
//!   Exactly one backend is active at a time.
//! - [`MigrationCoordinator`]: transfers ephemeral cart contents into the
//!   durable backend exactly once per device, degrading gracefully (the
//!   user stays on the ephemeral backend) when the transfer fails.
//! - [`CartStore`]: validates, conflict-checks, and prices every mutation,
//!   commits it through the active backend, and only then updates its
//!   in-memory snapshot and notifies subscribers. A failed commit leaves
//!   the snapshot untouched.

pub mod backend;
pub mod device;
pub mod migration;
pub mod remote;
pub mod retry;
pub mod store;

pub use backend::{BackendHandle, CartBackend};
pub use device::{DeviceStore, EphemeralBackend};
pub use migration::{MigrationCoordinator, MigrationState};
pub use remote::{CredentialCell, RemoteBackend, RemoteConfig};
pub use retry::{retry_idempotent, RetryPolicy};
pub use store::{CartEvent, CartStore};
