//! Client configuration
//!
//! Handles:
//! - Timer server location
//! - Liveness / reconnect timings
//! - Watchdog expiry policy and notifications
//!
//! Read from `$MOB_TIMER_CONFIG`, else `<config dir>/mob-timer/config.toml`.
//! A missing file means defaults. `MOB_TIMER_SERVER` overrides `server_url`.

use crate::client::ClientOptions;
use crate::reconnect::ExpiryPolicy;
use crate::ui::NotificationPermission;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "MOB_TIMER_CONFIG";
pub const SERVER_ENV: &str = "MOB_TIMER_SERVER";
pub const APP_DIR: &str = "mob-timer";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not find a config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config {path}: {field} must be at least 1")]
    Invalid { path: PathBuf, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub liveness_timeout_secs: u64,
    pub reconnect_cooldown_secs: u64,
    pub retry_secs: u64,
    /// Reconnect by itself when the watchdog expires instead of waiting for the user.
    pub auto_reconnect: bool,
    pub notifications: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            liveness_timeout_secs: 10,
            reconnect_cooldown_secs: 5,
            retry_secs: 3,
            auto_reconnect: false,
            notifications: true,
        }
    }
}

impl ClientConfig {
    /// Loads from the environment-selected or default location.
    pub async fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => Self::config_file_path()?,
        };
        let mut config = Self::load_from(&path).await?;

        if let Ok(server) = std::env::var(SERVER_ENV) {
            if !server.trim().is_empty() {
                config.server_url = server.trim().to_string();
            }
        }
        Ok(config)
    }

    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(field) = config.zero_duration() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                field,
            });
        }
        Ok(config)
    }

    /// First duration field set to 0. A zero liveness timeout or cooldown
    /// would make reconnects fire back to back.
    fn zero_duration(&self) -> Option<&'static str> {
        [
            ("liveness_timeout_secs", self.liveness_timeout_secs),
            ("reconnect_cooldown_secs", self.reconnect_cooldown_secs),
            ("retry_secs", self.retry_secs),
        ]
        .into_iter()
        .find(|(_, secs)| *secs == 0)
        .map(|(field, _)| field)
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(APP_DIR);
        path.push("config.toml");
        Ok(path)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            liveness_timeout: Duration::from_secs(self.liveness_timeout_secs),
            reconnect_cooldown: Duration::from_secs(self.reconnect_cooldown_secs),
            expiry_policy: if self.auto_reconnect {
                ExpiryPolicy::AutoReconnect
            } else {
                ExpiryPolicy::SurfaceOnly
            },
            notification_permission: if self.notifications {
                NotificationPermission::Granted
            } else {
                NotificationPermission::Denied
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        let options = config.client_options();
        assert_eq!(options.liveness_timeout, Duration::from_secs(10));
        assert_eq!(options.reconnect_cooldown, Duration::from_secs(5));
        assert_eq!(options.expiry_policy, ExpiryPolicy::SurfaceOnly);
        assert_eq!(options.notification_permission, NotificationPermission::Granted);
    }

    #[test]
    fn test_config_file_path() {
        if let Ok(path) = ClientConfig::config_file_path() {
            assert!(path.to_string_lossy().contains(APP_DIR));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("nope.toml")).await.unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = \"http://timer.lan:9000\"\nauto_reconnect = true\n").unwrap();

        let config = ClientConfig::load_from(&path).await.unwrap();
        assert_eq!(config.server_url, "http://timer.lan:9000");
        assert_eq!(config.liveness_timeout_secs, 10);
        assert_eq!(config.client_options().expiry_policy, ExpiryPolicy::AutoReconnect);
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "liveness_timeout_secs = \"ten\"").unwrap();

        assert!(matches!(ClientConfig::load_from(&path).await, Err(ConfigError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_zero_durations_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "liveness_timeout_secs = 0\nreconnect_cooldown_secs = 0\nauto_reconnect = true\n",
        )
        .unwrap();

        match ClientConfig::load_from(&path).await {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "liveness_timeout_secs"),
            other => panic!("expected invalid config, got {:?}", other),
        }

        std::fs::write(&path, "retry_secs = 0\n").unwrap();
        assert!(matches!(
            ClientConfig::load_from(&path).await,
            Err(ConfigError::Invalid { field: "retry_secs", .. })
        ));
    }
}
