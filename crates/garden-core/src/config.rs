use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::GardenError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub feed: FeedConfig,
    pub bangumi: BangumiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BangumiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Also write a daily log file under `<working_dir>/data/logs`.
    pub file: bool,
}

impl AppConfig {
    /// Load config: user file (if exists) replaces the built-in defaults.
    pub fn load() -> Result<Self, GardenError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| GardenError::Config(e.to_string()))
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, GardenError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GardenError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| GardenError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory that holds `data/app.yml`: the configured one, else the
    /// platform data directory.
    pub fn working_dir(&self) -> PathBuf {
        self.general.working_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("me", "him188", "animation-garden")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.feed.request_timeout_secs, 30);
        assert!(config.feed.url.starts_with("https://"));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.file);
        assert!(config.general.working_dir.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.general.working_dir = Some(dir.path().to_path_buf());
        config.logging.level = "debug".into();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.working_dir(), dir.path());
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, GardenError::Config(_)));
    }
}
