use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use redb::{
    Database, ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, TableError,
    TableHandle, WriteTransaction,
};
use tracing::{debug, warn};

use crate::errors::StoreError;

pub(crate) type Bytes = &'static [u8];

/// Every bucket is a redb table of raw bytes to raw bytes.
///
/// redb panics on an empty table name, so every table definition goes
/// through here.
pub(crate) fn bucket_table(name: &str) -> Result<TableDefinition<'_, Bytes, Bytes>, StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidBucketName(name.to_string()));
    }
    Ok(TableDefinition::new(name))
}

/// Open (or create) a file readable and writable by its owner only.
pub(crate) fn open_owner_only(path: &Path, truncate: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(truncate);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Owned handle to the embedded store.
///
/// Cloning is cheap; all clones share one `redb::Database`. The file is
/// closed when the last clone is dropped.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    path: PathBuf,
}

impl Store {
    /// Open the store at `path`, creating it with mode 0600 if absent.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let path = path.into();
        let file = open_owner_only(&path, false)?;
        let db = Database::builder().create_file(file)?;
        debug!(path = %path.display(), "store opened");
        Ok(Self { db: Arc::new(db), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    /// Run `f` inside a read transaction. `f` sees a consistent snapshot that
    /// concurrent writers do not affect.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&ReadScope) -> Result<T, E>,
        E: From<StoreError>,
    {
        let txn = self.db.begin_read().map_err(StoreError::from)?;
        f(&ReadScope { txn })
    }

    /// Run `f` inside the single write transaction.
    ///
    /// Commits when `f` returns `Ok`; any `Err` aborts the transaction and
    /// discards every change `f` made, bucket creation included.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&WriteScope) -> Result<T, E>,
        E: From<StoreError>,
    {
        let scope = WriteScope {
            txn: self.db.begin_write().map_err(StoreError::from)?,
        };
        match f(&scope) {
            Ok(value) => {
                scope.txn.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = scope.txn.abort() {
                    warn!(error = %abort_err, "write transaction abort failed");
                }
                Err(e)
            }
        }
    }
}

/// Read-only access to bucket contents, shared by read and write scopes.
pub trait BucketRead {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Walk entries in key order and return the first `Some` produced by `f`.
    fn find_map<T, F>(&self, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnMut(&[u8], &[u8]) -> Option<T>;
}

fn table_get<R: ReadableTable<Bytes, Bytes>>(
    table: &R,
    key: &[u8],
) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
}

fn table_find_map<R, T, F>(table: &R, mut f: F) -> Result<Option<T>, StoreError>
where
    R: ReadableTable<Bytes, Bytes>,
    F: FnMut(&[u8], &[u8]) -> Option<T>,
{
    for entry in table.iter()? {
        let (key, value) = entry?;
        if let Some(found) = f(key.value(), value.value()) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

pub struct ReadScope {
    txn: ReadTransaction,
}

impl ReadScope {
    /// Open an existing bucket; `None` when it was never created. An empty
    /// name can never have been created, so it is `None` too.
    pub fn bucket(&self, name: &str) -> Result<Option<ReadBucket>, StoreError> {
        if name.is_empty() {
            return Ok(None);
        }
        match self.txn.open_table(bucket_table(name)?) {
            Ok(table) => Ok(Some(ReadBucket { table })),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn bucket_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .txn
            .list_tables()?
            .map(|handle| handle.name().to_string())
            .collect())
    }
}

pub struct ReadBucket {
    table: ReadOnlyTable<Bytes, Bytes>,
}

impl BucketRead for ReadBucket {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        table_get(&self.table, key)
    }

    fn find_map<T, F>(&self, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnMut(&[u8], &[u8]) -> Option<T>,
    {
        table_find_map(&self.table, f)
    }
}

pub struct WriteScope {
    txn: WriteTransaction,
}

impl WriteScope {
    pub fn bucket_exists(&self, name: &str) -> Result<bool, StoreError> {
        if name.is_empty() {
            return Ok(false);
        }
        Ok(self.txn.list_tables()?.any(|handle| handle.name() == name))
    }

    /// Open a bucket, creating it first if it does not exist yet.
    ///
    /// redb allows a table to be open once per transaction, so the returned
    /// handle must be dropped before the same bucket is opened again.
    pub fn create_bucket(&self, name: &str) -> Result<WriteBucket<'_>, StoreError> {
        let table = self.txn.open_table(bucket_table(name)?)?;
        Ok(WriteBucket { table })
    }

    /// Open an existing bucket without creating it.
    pub fn bucket(&self, name: &str) -> Result<Option<WriteBucket<'_>>, StoreError> {
        if !self.bucket_exists(name)? {
            return Ok(None);
        }
        self.create_bucket(name).map(Some)
    }
}

pub struct WriteBucket<'txn> {
    table: Table<'txn, Bytes, Bytes>,
}

impl WriteBucket<'_> {
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.table.insert(key, value)?;
        Ok(())
    }

    /// Remove `key`; returns whether it was present. Removing an absent key
    /// is not an error.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.table.remove(key)?.is_some())
    }
}

impl BucketRead for WriteBucket<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        table_get(&self.table, key)
    }

    fn find_map<T, F>(&self, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnMut(&[u8], &[u8]) -> Option<T>,
    {
        table_find_map(&self.table, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> Result<(Store, PathBuf), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("store_db_{}.redb", uuid::Uuid::new_v4()));
        let store = Store::open(&path)?;
        Ok((store, path))
    }

    #[derive(Debug)]
    struct Rejected;

    impl From<StoreError> for Rejected {
        fn from(_: StoreError) -> Self {
            Rejected
        }
    }

    #[test]
    fn write_commits_on_ok() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        store.write(|scope| -> Result<(), StoreError> {
            let mut bucket = scope.create_bucket("fruit")?;
            bucket.put(b"apple", b"red")?;
            Ok(())
        })?;

        let value = store.read(|scope| -> Result<_, StoreError> {
            let bucket = scope.bucket("fruit")?.expect("bucket committed");
            bucket.get(b"apple")
        })?;
        assert_eq!(value.as_deref(), Some(&b"red"[..]));

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn write_rolls_back_on_err() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        let result = store.write(|scope| -> Result<(), Rejected> {
            let mut bucket = scope.create_bucket("fruit")?;
            bucket.put(b"apple", b"red")?;
            Err(Rejected)
        });
        assert!(result.is_err());

        // 回滚后 bucket 本身也不应存在
        let exists = store.read(|scope| -> Result<_, StoreError> { Ok(scope.bucket("fruit")?.is_some()) })?;
        assert!(!exists);

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn open_only_does_not_create() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        let found = store.write(|scope| -> Result<_, StoreError> { Ok(scope.bucket("ghost")?.is_some()) })?;
        assert!(!found);
        let names = store.read(|scope| -> Result<_, StoreError> { scope.bucket_names() })?;
        assert!(names.is_empty());

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn empty_bucket_name_rejected() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        let result = store.write(|scope| -> Result<(), StoreError> {
            scope.create_bucket("")?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::InvalidBucketName(_))));

        // 只读打开空名 bucket 视为不存在，不应触发 redb 的断言
        let read_found = store.read(|scope| -> Result<_, StoreError> { Ok(scope.bucket("")?.is_some()) })?;
        assert!(!read_found);
        let (exists, write_found) = store.write(|scope| -> Result<_, StoreError> {
            Ok((scope.bucket_exists("")?, scope.bucket("")?.is_some()))
        })?;
        assert!(!exists);
        assert!(!write_found);

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn delete_absent_key_is_ok() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        let removed = store.write(|scope| -> Result<_, StoreError> {
            let mut bucket = scope.create_bucket("fruit")?;
            bucket.put(b"apple", b"red")?;
            let first = bucket.delete(b"apple")?;
            let second = bucket.delete(b"apple")?;
            Ok((first, second))
        })?;
        assert_eq!(removed, (true, false));

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn find_map_walks_in_key_order() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        store.write(|scope| -> Result<(), StoreError> {
            let mut bucket = scope.create_bucket("letters")?;
            bucket.put(b"c", b"3")?;
            bucket.put(b"a", b"1")?;
            bucket.put(b"b", b"2")?;
            Ok(())
        })?;

        let mut seen = Vec::new();
        let first_over_one = store.read(|scope| -> Result<_, StoreError> {
            let bucket = scope.bucket("letters")?.expect("bucket exists");
            bucket.find_map(|k, v| {
                seen.push(k.to_vec());
                (v > &b"1"[..]).then(|| k.to_vec())
            })
        })?;
        assert_eq!(first_over_one, Some(b"b".to_vec()));
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec()]);

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn reader_keeps_snapshot_during_write() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;

        store.write(|scope| -> Result<(), StoreError> {
            scope.create_bucket("fruit")?.put(b"apple", b"red")?;
            Ok(())
        })?;

        let observed = store.read(|scope| -> Result<_, StoreError> {
            let bucket = scope.bucket("fruit")?.expect("bucket exists");
            store.write(|w| -> Result<(), StoreError> {
                w.create_bucket("fruit")?.put(b"apple", b"green")?;
                Ok(())
            })?;
            bucket.get(b"apple")
        })?;
        assert_eq!(observed.as_deref(), Some(&b"red"[..]));

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() -> Result<(), anyhow::Error> {
        use std::os::unix::fs::PermissionsExt;
        let (store, path) = temp_store()?;

        let mode = std::fs::metadata(&path)?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        drop(store);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
