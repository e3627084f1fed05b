//! Application configuration.

use crate::api::error::RenderError;
use crate::consts::{http, polling, render};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, path::Path};

/// Get the path to the config file. A `veed.config` in the working directory
/// wins over `~/.veed/config.json`.
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let local_config_path = std::env::current_dir()?.join("veed.config");
    if local_config_path.exists() {
        return Ok(local_config_path);
    }

    let home_path = home::home_dir().ok_or(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Home directory not found",
    ))?;
    Ok(home_path.join(".veed").join("config.json"))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bearer token for the render API. Empty when not set.
    #[serde(default)]
    pub api_key: String,

    /// Overrides the environment's base URL when non-empty.
    #[serde(default)]
    pub api_url: String,

    /// Source image to upload.
    #[serde(default)]
    pub image: String,

    /// Caption rendered over the image.
    #[serde(default)]
    pub text: String,

    /// Where the rendered video is written.
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_quality")]
    pub quality: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
}

fn default_output() -> String {
    "output_video.mp4".to_string()
}

fn default_quality() -> String {
    render::QUALITY.to_string()
}

fn default_poll_interval() -> u64 {
    polling::DEFAULT_INTERVAL_SECS
}

fn default_max_wait() -> u64 {
    polling::DEFAULT_MAX_WAIT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            api_url: String::new(),
            image: String::new(),
            text: String::new(),
            output: default_output(),
            quality: default_quality(),
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file at the given path.
    ///
    /// # Errors
    /// Returns an `std::io::Error` if reading from file fails or JSON is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let buf = fs::read(path)?;
        let config: Config = serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, RenderError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        Config::load_from_file(path)
            .map_err(|e| RenderError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Saves the configuration to a JSON file at the given path.
    ///
    /// Directories will be created if they don't exist. This method overwrites existing files.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    /// API key from the command line or environment if given, else from the file.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String, RenderError> {
        explicit
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| Some(self.api_key.trim()).filter(|k| !k.is_empty()))
            .map(str::to_string)
            .ok_or(RenderError::MissingCredential)
    }
}

/// Connection settings handed to the API client at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Applies to API calls; artifact downloads are bounded by `read_timeout` instead.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(http::REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(http::CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(http::READ_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn get_config() -> Config {
        Config {
            api_key: "key_abc".to_string(),
            image: "test.png".to_string(),
            text: "make her dance".to_string(),
            ..Config::default()
        }
    }

    #[test]
    // Loading a saved configuration file should return the same configuration.
    fn test_load_recovers_saved_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = get_config();
        config.save(&path).unwrap();

        let loaded_config = Config::load_from_file(&path).unwrap();
        assert_eq!(config, loaded_config);
    }

    #[test]
    // Saving a configuration should create directories if they don't exist.
    fn test_save_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent_dir").join("config.json");
        let result = get_config().save(&path);

        assert!(result.is_ok(), "Failed to save config");
        assert!(path.parent().unwrap().exists(), "Parent directory does not exist");
    }

    #[test]
    // Loading an invalid JSON file should return an error.
    fn test_load_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid_config.json");

        let mut file = File::create(&path).unwrap();
        writeln!(file, "invalid json").unwrap();

        assert!(Config::load_from_file(&path).is_err());
        assert!(matches!(Config::load_or_default(&path), Err(RenderError::Config(_))));
    }

    #[test]
    // Missing fields fall back to defaults and unknown fields are ignored.
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{ "api_key": "k", "max_wait_secs": 30, "extra_field": 1 }}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.max_wait_secs, 30);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.quality, "1080p");
        assert_eq!(config.output, "output_video.mp4");
        assert!(config.image.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_api_key_precedence() {
        let config = get_config();
        assert_eq!(config.resolve_api_key(Some("from_flag")).unwrap(), "from_flag");
        assert_eq!(config.resolve_api_key(Some("  ")).unwrap(), "key_abc");
        assert_eq!(config.resolve_api_key(None).unwrap(), "key_abc");

        let empty = Config::default();
        assert!(matches!(empty.resolve_api_key(None), Err(RenderError::MissingCredential)));
    }
}
