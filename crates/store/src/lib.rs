//! Embedded bucket store built on `redb`.
//! - One named redb table per bucket; keys and values are raw bytes.
//! - Read scopes see a snapshot, write scopes are serialized and atomic.
//! - Full-store snapshots for backups.

pub mod db;
pub mod errors;
pub mod snapshot;

pub use db::{BucketRead, ReadBucket, ReadScope, Store, WriteBucket, WriteScope};
pub use errors::StoreError;
pub use snapshot::SnapshotStats;
