use std::fmt;

use serde::Deserialize;

use super::errors::BucketError;
use crate::auth::domain::REGISTRY_BUCKET;

/// Body of `/update`. Missing fields decode as empty strings and are then
/// validated.
#[derive(Clone, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub token: String,
}

/// Body of `/retrieve` and `/remove`.
#[derive(Clone, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub token: String,
}

fn reject_reserved(bucket: &str) -> Result<(), BucketError> {
    if bucket == REGISTRY_BUCKET {
        return Err(BucketError::ReservedBucket(bucket.to_string()));
    }
    Ok(())
}

impl PutRequest {
    pub fn parse(body: &[u8]) -> Result<Self, BucketError> {
        let req: Self = serde_json::from_slice(body).map_err(|e| BucketError::InvalidBody(e.to_string()))?;
        if req.key.is_empty() || req.value.is_empty() {
            return Err(BucketError::InvalidBody("key and value must be non-empty".into()));
        }
        reject_reserved(&req.bucket)?;
        Ok(req)
    }
}

impl KeyRequest {
    pub fn parse(body: &[u8]) -> Result<Self, BucketError> {
        let req: Self = serde_json::from_slice(body).map_err(|e| BucketError::InvalidBody(e.to_string()))?;
        if req.key.is_empty() {
            return Err(BucketError::InvalidBody("key must be non-empty".into()));
        }
        reject_reserved(&req.bucket)?;
        Ok(req)
    }
}

impl fmt::Debug for PutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutRequest")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("value_len", &self.value.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for KeyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRequest")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_requires_key_and_value() {
        assert!(PutRequest::parse(br#"{"key":"k","bucket":"b","value":"v","token":"t"}"#).is_ok());
        for body in [
            &br#"{"bucket":"b","value":"v","token":"t"}"#[..],
            br#"{"key":"k","bucket":"b","value":"","token":"t"}"#,
            br#"{"key":"k","bucket":"b","value":7}"#,
            b"",
        ] {
            assert!(matches!(PutRequest::parse(body), Err(BucketError::InvalidBody(_))));
        }
    }

    #[test]
    fn key_request_requires_key_only() {
        let req = KeyRequest::parse(br#"{"key":"k"}"#).unwrap();
        assert_eq!(req.bucket, "");
        assert_eq!(req.token, "");
        assert!(matches!(KeyRequest::parse(br#"{"key":"","bucket":"b"}"#), Err(BucketError::InvalidBody(_))));
    }

    #[test]
    fn registry_bucket_is_reserved() {
        let put = PutRequest::parse(br#"{"key":"k","bucket":"authed_clients","value":"v","token":"t"}"#);
        assert!(matches!(put, Err(BucketError::ReservedBucket(_))));
        let get = KeyRequest::parse(br#"{"key":"k","bucket":"authed_clients","token":"t"}"#);
        assert!(matches!(get, Err(BucketError::ReservedBucket(_))));
    }

    #[test]
    fn debug_omits_token_and_value() {
        let req = PutRequest::parse(br#"{"key":"k","bucket":"b","value":"secret-value","token":"secret-token"}"#).unwrap();
        let rendered = format!("{req:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(!rendered.contains("secret-token"));
    }
}
