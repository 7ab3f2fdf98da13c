//! Periodic full-store snapshots.
//!
//! A single tokio task ticks on a fixed period and copies the store to the
//! backup path on the blocking pool. Failures are logged and counted; the
//! next tick runs regardless.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use common::observability;
use store::{SnapshotStats, Store};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, warn};

use crate::errors::ServiceError;

pub const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub path: PathBuf,
    pub interval: Duration,
}

impl BackupSettings {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), interval: DEFAULT_BACKUP_INTERVAL }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Snapshot the store to `path` once.
pub async fn backup_once(store: &Store, path: &Path) -> Result<SnapshotStats, ServiceError> {
    if path.as_os_str().is_empty() {
        return Err(ServiceError::Validation("backup path is empty".into()));
    }
    let store = store.clone();
    let target = path.to_path_buf();
    let stats = tokio::task::spawn_blocking(move || store.snapshot_to(&target)).await??;
    Ok(stats)
}

async fn tick(store: &Store, path: &Path) {
    let started = Instant::now();
    let result = backup_once(store, path).await;
    let elapsed = started.elapsed();
    observability::record_backup(result.is_ok(), elapsed.as_secs_f64());
    match result {
        Ok(stats) => info!(
            event = "backup",
            path = %path.display(),
            buckets = stats.buckets,
            entries = stats.entries,
            bytes = stats.bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            "store backed up"
        ),
        Err(e) => error!(event = "backup_failed", path = %path.display(), code = e.code(), error = %e, "backup failed"),
    }
}

/// Handle to the running backup task.
pub struct BackupScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackupScheduler {
    /// Start the task; returns `None` (backups disabled) when the path is empty.
    ///
    /// The first snapshot is taken one interval after start.
    pub fn spawn(store: Store, settings: BackupSettings) -> Option<Self> {
        if settings.path.as_os_str().is_empty() {
            info!(event = "backup_disabled", "no backup path configured");
            return None;
        }
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + settings.interval;
            let mut ticker = tokio::time::interval_at(start, settings.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                event = "backup_scheduled",
                path = %settings.path.display(),
                interval_secs = settings.interval.as_secs(),
                "backup scheduler started"
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick(&store, &settings.path).await,
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!(event = "backup_stopped", "backup scheduler stopped");
        });
        Some(Self { shutdown, handle })
    }

    /// Cancel the timer and wait for an in-flight snapshot to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "backup task ended abnormally");
        }
    }
}
