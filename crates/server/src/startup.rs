use std::path::PathBuf;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, AppState};
use service::{
    auth::registry,
    backup::{BackupScheduler, BackupSettings},
    runtime,
};
use store::Store;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Everything `run` needs after startup checks have passed.
pub struct Bootstrapped {
    pub router: Router,
    pub store: Store,
    pub scheduler: Option<BackupScheduler>,
}

/// Open the store, provision credentials, start backups and build the router.
///
/// Any failure here is fatal: the server never listens with a half-provisioned
/// registry.
pub async fn bootstrap(cfg: &AppConfig) -> anyhow::Result<Bootstrapped> {
    let store_path = PathBuf::from(&cfg.store.path);
    let credentials_path = PathBuf::from(&cfg.store.credentials_path);
    let backup_path = cfg.backup.path();

    runtime::ensure_env(&store_path, &credentials_path, backup_path.as_deref()).await?;

    let store = {
        let path = store_path.clone();
        tokio::task::spawn_blocking(move || Store::open(path)).await??
    };
    info!(path = %store_path.display(), "store opened");

    let credentials = registry::load_credentials(&credentials_path)?;
    let state = AppState::new(store.clone());
    state.auth.provision(credentials).await?;

    let scheduler = match backup_path {
        Some(path) => BackupScheduler::spawn(
            store.clone(),
            BackupSettings::new(path).with_interval(cfg.backup.interval()),
        ),
        None => {
            info!("backups disabled");
            None
        }
    };

    let router = routes::build_router(state, build_cors());
    Ok(Bootstrapped { router, store, scheduler })
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// Public entry: load config, bootstrap and serve until a shutdown signal.
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load()?;
    let Bootstrapped { router, store, scheduler } = bootstrap(&cfg).await?;

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "starting kv gateway");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 先停止备份任务，等待进行中的快照完成，再关闭存储
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    drop(store);
    info!("server stopped");
    Ok(())
}
