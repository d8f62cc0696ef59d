use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Enable the background sweep that expires stale pending reservations
    #[serde(default = "default_expiry_enabled")]
    pub expiry_enabled: bool,
    /// Minutes a PENDING reservation holds its slot before it is expired (default: 30)
    #[serde(default = "default_pending_hold_minutes")]
    pub pending_hold_minutes: i64,
    /// Interval between expiry sweeps in seconds (default: 300)
    #[serde(default = "default_expiry_sweep_interval")]
    pub expiry_sweep_interval: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            expiry_enabled: default_expiry_enabled(),
            pending_hold_minutes: default_pending_hold_minutes(),
            expiry_sweep_interval: default_expiry_sweep_interval(),
        }
    }
}

fn default_expiry_enabled() -> bool {
    true
}

fn default_pending_hold_minutes() -> i64 {
    30
}

fn default_expiry_sweep_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            booking: BookingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = Config::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.booking.pending_hold_minutes, 30);
        assert!(config.booking.expiry_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            api_port = 9090

            [booking]
            pending_hold_minutes = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.booking.pending_hold_minutes, 10);
        assert_eq!(config.booking.expiry_sweep_interval, 300);
    }
}
