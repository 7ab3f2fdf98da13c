use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage engine error: {0}")]
    Engine(#[from] redb::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bucket name: {0:?}")]
    InvalidBucketName(String),
}

// redb 的各类错误统一收敛到 redb::Error
macro_rules! engine_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    Self::Engine(e.into())
                }
            }
        )*
    };
}

engine_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
