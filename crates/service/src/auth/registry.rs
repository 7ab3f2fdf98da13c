//! Credential registry: loads the bootstrap credentials and makes sure each
//! one owns exactly one token in the registry bucket.

use std::path::Path;

use store::{BucketRead, Store};
use tracing::{debug, info};

use super::authenticator;
use super::domain::{Credential, ProvisionReport, Token, REGISTRY_BUCKET};
use super::errors::AuthError;

/// Read the bootstrap file: a JSON array of `{username, password}` objects.
pub fn load_credentials<P: AsRef<Path>>(path: P) -> Result<Vec<Credential>, AuthError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| AuthError::CredentialsFile(format!("cannot read {}: {e}", path.display())))?;
    let credentials: Vec<Credential> = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::CredentialsFile(format!("cannot parse {}: {e}", path.display())))?;
    info!(path = %path.display(), count = credentials.len(), "credentials loaded");
    Ok(credentials)
}

/// Assign a token to every credential that does not have one yet.
///
/// Runs in a single write transaction. Existing tokens are never replaced, so
/// running it again over the same credentials and store is a no-op.
pub fn provision(store: &Store, credentials: &[Credential]) -> Result<ProvisionReport, AuthError> {
    store.write(|scope| {
        let mut registry = scope.create_bucket(REGISTRY_BUCKET)?;
        let mut report = ProvisionReport::default();
        for credential in credentials {
            let key = credential.registry_key()?;
            if registry.get(&key)?.is_some() {
                report.existing += 1;
                continue;
            }
            let token = Token::generate()?;
            registry.put(&key, token.as_bytes())?;
            debug!(username = %credential.username, "token assigned");
            report.created += 1;
        }
        Ok(report)
    })
}

/// Token registered for the raw credential JSON, matched structurally.
pub fn lookup_token(store: &Store, raw_credential: &[u8]) -> Result<Option<Token>, AuthError> {
    store.read(|scope| match scope.bucket(REGISTRY_BUCKET)? {
        Some(registry) => authenticator::find_token_for(&registry, raw_credential),
        None => Ok(None),
    })
}
