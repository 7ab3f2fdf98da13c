//! Environment/runtime helpers
//!
//! Sanity checks to ensure the directories holding the store and its backup
//! exist at startup.

use std::path::Path;

use tracing::warn;

async fn ensure_parent(file: &Path) -> anyhow::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display())),
        _ => Ok(()),
    }
}

/// Ensure parent directories exist for the store file and, when backups are
/// enabled, for the backup file; warn when the credentials file is missing.
pub async fn ensure_env(
    store_path: &Path,
    credentials_path: &Path,
    backup_path: Option<&Path>,
) -> anyhow::Result<()> {
    ensure_parent(store_path).await?;
    if let Some(backup) = backup_path {
        ensure_parent(backup).await?;
    }
    if tokio::fs::metadata(credentials_path).await.is_err() {
        warn!(credentials_path = %credentials_path.display(), "credentials file not found; startup will fail");
    }
    Ok(())
}
