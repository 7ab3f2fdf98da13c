use store::{BucketRead, Store};
use tracing::{debug, instrument, warn};

use super::domain::{KeyRequest, PutRequest};
use super::errors::BucketError;
use crate::auth::authenticator::{authorize_read, authorize_write};

/// Bucket CRUD behind token checks.
#[derive(Clone)]
pub struct BucketService {
    store: Store,
}

impl BucketService {
    pub fn new(store: Store) -> Self { Self { store } }

    /// Write `key -> value`, creating the bucket if needed.
    ///
    /// A rejected token aborts the transaction: neither the value nor a
    /// freshly created bucket is persisted.
    #[instrument(skip_all, fields(bucket = %req.bucket, key = %req.key))]
    pub async fn put(&self, req: PutRequest) -> Result<(), BucketError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            store.write(|scope| {
                // 先确保 bucket 存在，句柄立即释放，再打开注册表校验 token
                scope
                    .create_bucket(&req.bucket)
                    .map_err(|e| BucketError::BucketUnavailable(e.to_string()))?;
                if !authorize_write(scope, &req.token)? {
                    return Err(BucketError::InvalidToken);
                }
                let mut bucket = scope
                    .create_bucket(&req.bucket)
                    .map_err(|e| BucketError::BucketUnavailable(e.to_string()))?;
                bucket.put(req.key.as_bytes(), req.value.as_bytes())?;
                Ok(())
            })
        })
        .await??;
        debug!("value stored");
        Ok(())
    }

    /// Read `key`. The bucket must exist before the token is checked.
    #[instrument(skip_all, fields(bucket = %req.bucket, key = %req.key))]
    pub async fn get(&self, req: KeyRequest) -> Result<String, BucketError> {
        let store = self.store.clone();
        let value = tokio::task::spawn_blocking(move || {
            store.read(|scope| {
                let bucket = scope
                    .bucket(&req.bucket)?
                    .ok_or_else(|| BucketError::BucketMissing(req.bucket.clone()))?;
                if !authorize_read(scope, &req.token)? {
                    return Err(BucketError::InvalidToken);
                }
                bucket
                    .get(req.key.as_bytes())?
                    .ok_or_else(|| BucketError::KeyMissing(req.key.clone()))
            })
        })
        .await??;
        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    /// Delete `key`. Deleting an absent key succeeds; a failed transaction
    /// is reported as [`BucketError::DeleteFailed`].
    #[instrument(skip_all, fields(bucket = %req.bucket, key = %req.key))]
    pub async fn delete(&self, req: KeyRequest) -> Result<(), BucketError> {
        let store = self.store.clone();
        let removed = tokio::task::spawn_blocking(move || {
            store.write(|scope| {
                if !scope.bucket_exists(&req.bucket)? {
                    return Err(BucketError::BucketMissing(req.bucket.clone()));
                }
                if !authorize_write(scope, &req.token)? {
                    return Err(BucketError::InvalidToken);
                }
                let mut bucket = scope
                    .bucket(&req.bucket)?
                    .ok_or_else(|| BucketError::BucketMissing(req.bucket.clone()))?;
                Ok(bucket.delete(req.key.as_bytes())?)
            })
        })
        .await?
        .map_err(|e| match e {
            BucketError::Store(inner) => {
                warn!(error = %inner, "delete transaction failed");
                BucketError::DeleteFailed(inner.to_string())
            }
            other => other,
        })?;
        debug!(removed, "delete applied");
        Ok(())
    }
}
