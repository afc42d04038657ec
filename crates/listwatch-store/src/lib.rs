pub mod blob;
pub mod error;
pub mod snapshot;
pub mod stats;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use error::StoreError;
pub use snapshot::{SnapshotEntry, SnapshotStore};
pub use stats::{StatsState, StatsStore, HOURS_PER_DAY};
