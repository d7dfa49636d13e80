use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::client::DEFAULT_API_URL;

const APP_DIR: &str = "ask-tui";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine {0} directory")]
    NoDirectory(&'static str),

    #[error("failed to access config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config directory; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Service URL: the override (flag or `ASK_API_URL`), then the file, then the default.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        [cli_override, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    pub fn resolve_log_file(&self, cli_override: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = cli_override.or(self.log_file.as_deref()) {
            return Ok(path.to_path_buf());
        }
        let data_dir = dirs::data_local_dir().ok_or(ConfigError::NoDirectory("data"))?;
        Ok(data_dir.join(APP_DIR).join("ask.log"))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_DIR).join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("http://10.0.0.2:9000".to_string()),
            log_file: None,
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("log_file"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_api_url_precedence() {
        let empty = Config::new();
        assert_eq!(empty.resolve_api_url(None), DEFAULT_API_URL);

        let from_file = Config {
            api_url: Some("http://file".to_string()),
            log_file: None,
        };
        assert_eq!(from_file.resolve_api_url(None), "http://file");
        assert_eq!(from_file.resolve_api_url(Some("http://cli")), "http://cli");
        assert_eq!(from_file.resolve_api_url(Some("  ")), "http://file");
    }

    #[test]
    fn test_log_file_override_wins() {
        let config = Config {
            api_url: None,
            log_file: Some(PathBuf::from("/tmp/from-config.log")),
        };
        let cli = PathBuf::from("/tmp/from-cli.log");
        assert_eq!(config.resolve_log_file(Some(&cli)).unwrap(), cli);
        assert_eq!(
            config.resolve_log_file(None).unwrap(),
            PathBuf::from("/tmp/from-config.log")
        );
    }
}
