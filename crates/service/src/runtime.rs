//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

use std::path::Path;

/// Ensure the store and backup directories exist; warn on a missing credentials file.
pub async fn ensure_env(
    store_path: &Path,
    credentials_path: &Path,
    backup_path: Option<&Path>,
) -> anyhow::Result<()> {
    common::env::ensure_env(store_path, credentials_path, backup_path).await
}
