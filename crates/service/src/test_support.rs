use std::path::PathBuf;

use store::Store;

use crate::auth::{domain::Credential, registry};

/// A store in a fresh temp file; the path is returned for cleanup.
pub fn temp_store() -> Result<(Store, PathBuf), anyhow::Error> {
    let path = std::env::temp_dir().join(format!("svc_store_{}.redb", uuid::Uuid::new_v4()));
    let store = Store::open(&path)?;
    Ok((store, path))
}

pub fn credential(username: &str, password: &str) -> Credential {
    Credential { username: username.into(), password: password.into() }
}

/// A temp store with `alice:wonderland` and `bob:builder` provisioned.
pub fn provisioned_store() -> Result<(Store, PathBuf), anyhow::Error> {
    let (store, path) = temp_store()?;
    registry::provision(&store, &[credential("alice", "wonderland"), credential("bob", "builder")])?;
    Ok((store, path))
}

/// Base64 token currently stored for a credential.
pub fn token_for(store: &Store, username: &str, password: &str) -> Result<String, anyhow::Error> {
    let raw = serde_json::to_vec(&credential(username, password))?;
    let token = registry::lookup_token(store, &raw)?
        .ok_or_else(|| anyhow::anyhow!("no token for {username}"))?;
    Ok(token.encode())
}

pub fn cleanup(store: Store, path: PathBuf) {
    drop(store);
    let _ = std::fs::remove_file(&path);
}
