//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Upstream Eolink service settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// MCP server and transport settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values taken from the command line or environment, applied over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Upstream credential (`EOLINK_API_KEY`).
    pub api_key: Option<String>,
    /// Upstream base URL (`EOLINK_BASE_URL`).
    pub base_url: Option<String>,
    /// Transport mode (`TRANSPORT`).
    pub transport: Option<TransportMode>,
    /// HTTP listen port (`PORT`).
    pub port: Option<u16>,
}

impl Config {
    /// Applies command line / environment overrides.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(api_key) = overrides.api_key {
            self.upstream.api_key = api_key;
        }
        if let Some(base_url) = overrides.base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(transport) = overrides.transport {
            self.server.transport = transport;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("upstream.base_url", &self.upstream.base_url)?;

        if let Some(ref test_base_url) = self.upstream.test_base_url {
            validate_http_url("upstream.test_base_url", test_base_url)?;
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "upstream.timeout_secs must be greater than zero".to_string(),
            });
        }

        if self.upstream.credential_header.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "upstream.credential_header cannot be empty".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::ValidationError {
        message: format!("{field} is not a valid URL: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError {
            message: format!("{field} must use http or https, got '{}'", url.scheme()),
        });
    }
    Ok(())
}

/// Upstream Eolink service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the Eolink OpenAPI.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static credential sent with every request. Empty means unset.
    #[serde(default)]
    pub api_key: String,

    /// Name of the header carrying the credential.
    #[serde(default = "default_credential_header")]
    pub credential_header: String,

    /// Per-request deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base URL for relative API paths in `test_api`.
    #[serde(default)]
    pub test_base_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            credential_header: default_credential_header(),
            timeout_secs: default_timeout_secs(),
            test_base_url: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.eolink.com".to_string()
}

fn default_credential_header() -> String {
    "project_id".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// HTTP with Server-Sent Events.
    #[default]
    Http,
    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport mode.
    #[serde(default)]
    pub transport: TransportMode,

    /// Listen address for the HTTP transport.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port for the HTTP transport.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::default(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
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
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream.base_url, "https://api.eolink.com");
        assert_eq!(config.upstream.credential_header, "project_id");
        assert_eq!(config.server.transport, TransportMode::Http);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "upstream": {
                "base_url": "https://eolink.internal",
                "api_key": "secret",
                "credential_header": "Eo-Secret-Key",
                "timeout_secs": 5,
                "test_base_url": "http://localhost:8080"
            },
            "server": {
                "transport": "stdio",
                "host": "0.0.0.0",
                "port": 8123
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream.api_key, "secret");
        assert_eq!(config.upstream.credential_header, "Eo-Secret-Key");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(
            config.upstream.test_base_url.as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(config.server.transport, TransportMode::Stdio);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        config.apply_overrides(Overrides {
            api_key: Some("k".to_string()),
            base_url: Some("http://localhost:1".to_string()),
            transport: Some(TransportMode::Stdio),
            port: Some(9000),
        });
        assert_eq!(config.upstream.api_key, "k");
        assert_eq!(config.upstream.base_url, "http://localhost:1");
        assert_eq!(config.server.transport, TransportMode::Stdio);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn empty_overrides_keep_values() {
        let mut config = Config::default();
        config.apply_overrides(Overrides::default());
        assert_eq!(config.upstream.base_url, "https://api.eolink.com");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn reject_non_http_base_url() {
        let json = r#"{ "upstream": { "base_url": "ftp://eolink.com" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_timeout() {
        let json = r#"{ "upstream": { "timeout_secs": 0 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_log_level() {
        let json = r#"{ "logging": { "level": "loud" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_transport() {
        let json = r#"{ "server": { "transport": "websocket" } }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
