//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the CLI argument (must exist)
//! 2. Default location, used only if present:
//!    - **Linux/macOS:** `~/.apikit-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.apikit-mcp\config.json`
//!
//! Without a file, built-in defaults apply. Command line flags and the
//! `EOLINK_API_KEY`, `EOLINK_BASE_URL`, `TRANSPORT` and `PORT` environment
//! variables are applied on top via [`Config::apply_overrides`].

mod settings;

pub use settings::{
    Config, LoggingConfig, Overrides, ServerConfig, TransportMode, UpstreamConfig,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.apikit-mcp/`
/// - **Windows:** `%USERPROFILE%\.apikit-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".apikit-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, the default location is tried and defaults are used
/// when no file exists there. The result is not validated here, because
/// overrides may still change it.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given file cannot be found
/// - The file cannot be read
/// - The JSON is malformed or has unknown fields
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => {
                tracing::debug!("No configuration file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{ "upstream": {{ "api_key": "abc" }}, "server": {{ "port": 4100 }} }}"#
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.upstream.api_key, "abc");
        assert_eq!(config.server.port, 4100);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
