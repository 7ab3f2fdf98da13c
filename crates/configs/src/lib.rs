use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path(), credentials_path: default_credentials_path() }
    }
}

/// Periodic snapshot settings; an empty `path` disables backups.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_backup_interval")]
    pub interval_secs: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self { path: String::new(), interval_secs: default_backup_interval() }
    }
}

fn default_store_path() -> String { "data/store.redb".into() }
fn default_credentials_path() -> String { "data/credentials.json".into() }
fn default_backup_interval() -> u64 { 120 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn env_or(name: &str, fallback: String) -> String {
    std::env::var(name).unwrap_or(fallback)
}

impl AppConfig {
    /// Build a config purely from environment variables, with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        let server = ServerConfig {
            host: env_or("SERVER_HOST", defaults.server.host),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(defaults.server.port),
            worker_threads: std::env::var("TOKIO_WORKER_THREADS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .or(defaults.server.worker_threads),
        };
        let store = StoreConfig {
            path: env_or("STORE_PATH", defaults.store.path),
            credentials_path: env_or("CREDENTIALS_PATH", defaults.store.credentials_path),
        };
        let backup = BackupConfig {
            path: env_or("BACKUP_PATH", defaults.backup.path),
            interval_secs: std::env::var("BACKUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.backup.interval_secs),
        };
        Self { server, store, backup }
    }

    /// Load `config.toml` (or `CONFIG_PATH`); fall back to environment
    /// variables only when the file does not exist. A file that exists but
    /// fails to parse is an error.
    pub fn load() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => Self::from_env(),
                _ => return Err(e),
            },
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        self.backup.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(anyhow!("store.path is empty; set it in config.toml or STORE_PATH"));
        }
        if self.credentials_path.trim().is_empty() {
            return Err(anyhow!("store.credentials_path is empty; set it in config.toml or CREDENTIALS_PATH"));
        }
        Ok(())
    }
}

impl BackupConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled() && self.interval_secs == 0 {
            return Err(anyhow!("backup.interval_secs must be >= 1"));
        }
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        !self.path.trim().is_empty()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.enabled().then(|| PathBuf::from(self.path.trim()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_take_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.store.path, "data/store.redb");
        assert_eq!(cfg.store.credentials_path, "data/credentials.json");
        assert!(!cfg.backup.enabled());
        assert_eq!(cfg.backup.interval(), Duration::from_secs(120));
    }

    #[test]
    fn parses_full_file() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            worker_threads = 0

            [store]
            path = "/var/lib/kv/store.redb"
            credentials_path = "/etc/kv/credentials.json"

            [backup]
            path = "/var/backups/kv.redb"
            interval_secs = 30
        "#;
        let mut cfg: AppConfig = toml::from_str(raw).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.backup.path(), Some(PathBuf::from("/var/backups/kv.redb")));
        assert_eq!(cfg.backup.interval(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_zero_port_and_zero_interval() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.backup.path = "backup.redb".into();
        cfg.backup.interval_secs = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn zero_interval_is_fine_when_backups_disabled() {
        let mut cfg = AppConfig::default();
        cfg.backup.interval_secs = 0;
        assert!(cfg.normalize_and_validate().is_ok());
    }
}
