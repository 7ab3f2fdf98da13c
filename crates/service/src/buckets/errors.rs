use thiserror::Error;

use store::StoreError;

/// Errors of the bucket operations, in the order the request pipeline can
/// raise them.
#[derive(Debug, Error)]
pub enum BucketError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("bucket {0:?} is reserved")]
    ReservedBucket(String),
    #[error("unable to create or open bucket: {0}")]
    BucketUnavailable(String),
    #[error("bucket {0:?} does not exist")]
    BucketMissing(String),
    #[error("invalid request token")]
    InvalidToken,
    #[error("key {0:?} not found")]
    KeyMissing(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl BucketError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            BucketError::InvalidBody(_) => 2001,
            BucketError::ReservedBucket(_) => 2002,
            BucketError::BucketUnavailable(_) => 2003,
            BucketError::BucketMissing(_) => 2004,
            BucketError::InvalidToken => 2005,
            BucketError::KeyMissing(_) => 2006,
            BucketError::DeleteFailed(_) => 2007,
            BucketError::Store(_) => 2200,
            BucketError::Task(_) => 2300,
        }
    }
}
