//! Token checks against the registry bucket.
//!
//! Both lookups scan the registry in key order. The registry is small and
//! fixed at startup, so a linear scan is fine.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;
use store::{BucketRead, ReadScope, StoreError, WriteScope};
use tracing::warn;

use super::domain::{Token, REGISTRY_BUCKET};
use super::errors::AuthError;

/// Whether `presented` (base64) equals any registered token.
pub fn verify<B: BucketRead>(registry: &B, presented: &str) -> Result<bool, StoreError> {
    if presented.is_empty() {
        return Ok(false);
    }
    let hit = registry.find_map(|_, token| (BASE64.encode(token) == presented).then_some(()))?;
    Ok(hit.is_some())
}

/// Token of the first registered credential structurally equal to
/// `raw_credential`. Field order and whitespace do not matter.
pub fn find_token_for<B: BucketRead>(registry: &B, raw_credential: &[u8]) -> Result<Option<Token>, AuthError> {
    let presented: Value =
        serde_json::from_slice(raw_credential).map_err(|e| AuthError::InvalidBody(e.to_string()))?;
    let token = registry.find_map(|key, token| {
        let stored: Value = match serde_json::from_slice(key) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "skipping unparseable registry key");
                return None;
            }
        };
        if stored != presented {
            return None;
        }
        let token = Token::from_slice(token);
        if token.is_none() {
            warn!("registry entry holds a malformed token");
        }
        token
    })?;
    Ok(token)
}

/// Verify a token inside a read transaction. A store without a registry
/// bucket authenticates nothing.
pub fn authorize_read(scope: &ReadScope, presented: &str) -> Result<bool, StoreError> {
    match scope.bucket(REGISTRY_BUCKET)? {
        Some(registry) => verify(&registry, presented),
        None => Ok(false),
    }
}

/// Verify a token inside a write transaction. The registry handle is
/// released before returning, so callers may open other buckets afterwards.
pub fn authorize_write(scope: &WriteScope, presented: &str) -> Result<bool, StoreError> {
    match scope.bucket(REGISTRY_BUCKET)? {
        Some(registry) => verify(&registry, presented),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::registry::provision;
    use crate::test_support::{cleanup, credential, provisioned_store, temp_store, token_for};

    #[test]
    fn verify_accepts_any_registered_token() -> Result<(), anyhow::Error> {
        let (store, path) = provisioned_store()?;
        let alice = token_for(&store, "alice", "wonderland")?;
        let bob = token_for(&store, "bob", "builder")?;

        for token in [&alice, &bob] {
            assert!(store.read(|scope| authorize_read(scope, token))?);
            assert!(store.write(|scope| authorize_write(scope, token))?);
        }

        cleanup(store, path);
        Ok(())
    }

    #[test]
    fn verify_rejects_unknown_tokens() -> Result<(), anyhow::Error> {
        let (store, path) = provisioned_store()?;
        let alice = token_for(&store, "alice", "wonderland")?;
        let forged = Token::generate()?.encode();
        let unpadded = alice.trim_end_matches('=').to_string();

        for token in ["", forged.as_str(), unpadded.as_str(), "not base64 at all"] {
            assert!(!store.read(|scope| authorize_read(scope, token))?, "{token:?} accepted");
        }

        cleanup(store, path);
        Ok(())
    }

    #[test]
    fn missing_registry_authenticates_nothing() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;
        let token = Token::generate()?.encode();

        assert!(!store.read(|scope| authorize_read(scope, &token))?);
        assert!(!store.write(|scope| authorize_write(scope, &token))?);

        cleanup(store, path);
        Ok(())
    }

    #[test]
    fn credential_match_ignores_field_order_and_whitespace() -> Result<(), anyhow::Error> {
        let (store, path) = temp_store()?;
        provision(&store, &[credential("a", "b")])?;

        let lookup = |raw: &[u8]| -> Result<Option<Token>, AuthError> {
            store.read(|scope| {
                let registry = scope.bucket(REGISTRY_BUCKET)?.expect("registry provisioned");
                find_token_for(&registry, raw)
            })
        };

        let ordered = lookup(br#"{"username":"a","password":"b"}"#)?;
        let reordered = lookup(br#"{ "password" : "b",
                                      "username" : "a" }"#)?;
        assert!(ordered.is_some());
        assert_eq!(ordered, reordered);

        assert!(lookup(br#"{"username":"a","password":"x"}"#)?.is_none());
        assert!(lookup(br#"{"username":"a","password":"b","extra":1}"#)?.is_none());
        assert!(matches!(lookup(b"{not json"), Err(AuthError::InvalidBody(_))));

        cleanup(store, path);
        Ok(())
    }
}
