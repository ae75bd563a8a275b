//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod device_link;
pub mod remote_store;
pub mod snapshot_store;

pub use clock::{Clock, SystemClock};
pub use device_link::{LineSink, LineSource};
pub use remote_store::{RemoteStore, StorePaths, Subscription};
pub use snapshot_store::SnapshotStore;
