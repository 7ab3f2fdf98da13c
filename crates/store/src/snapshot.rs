use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use redb::{Database, ReadableTable, TableHandle};
use tracing::{debug, warn};

use crate::db::{bucket_table, open_owner_only, Store};
use crate::errors::StoreError;

/// Summary of one snapshot run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    pub buckets: usize,
    pub entries: u64,
    pub bytes: u64,
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

impl Store {
    /// Copy the whole store, as of one read transaction, into a standalone
    /// store file at `target`.
    ///
    /// The copy is built in `<target>.tmp` (truncated first) and renamed over
    /// `target` once committed, so `target` is either the previous snapshot or
    /// the new one. A failed run removes the staging file. Concurrent writers
    /// are not blocked.
    pub fn snapshot_to(&self, target: &Path) -> Result<SnapshotStats, StoreError> {
        let staging = staging_path(target);
        let result = self
            .copy_into(&staging)
            .and_then(|stats| fs::rename(&staging, target).map(|_| stats).map_err(StoreError::from));
        match result {
            Ok(stats) => {
                debug!(target = %target.display(), buckets = stats.buckets, entries = stats.entries, "snapshot written");
                Ok(stats)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&staging) {
                    if rm.kind() != io::ErrorKind::NotFound {
                        warn!(staging = %staging.display(), error = %rm, "failed to remove snapshot staging file");
                    }
                }
                Err(e)
            }
        }
    }

    fn copy_into(&self, staging: &Path) -> Result<SnapshotStats, StoreError> {
        let source = self.database().begin_read()?;
        let mut stats = SnapshotStats::default();
        {
            let backup = Database::builder().create_file(open_owner_only(staging, true)?)?;
            let txn = backup.begin_write()?;
            for handle in source.list_tables()? {
                let name = handle.name().to_string();
                let from = source.open_table(bucket_table(&name)?)?;
                let mut to = txn.open_table(bucket_table(&name)?)?;
                for entry in from.iter()? {
                    let (key, value) = entry?;
                    to.insert(key.value(), value.value())?;
                    stats.entries += 1;
                }
                stats.buckets += 1;
            }
            txn.commit()?;
        }
        stats.bytes = fs::metadata(staging)?.len();
        Ok(stats)
    }
}
