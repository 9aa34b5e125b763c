//! Error types for apikit-mcp.
//!
//! # Security Note
//!
//! Error messages never include the upstream credential. Configuration
//! errors name the offending field, not its value.

use std::path::PathBuf;

use thiserror::Error;

use crate::eolink::TestApiError;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised by tool and resource handlers.
///
/// Each variant maps to a distinct JSON-RPC error code in the server.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not match the declared shape. Raised before any I/O.
    #[error("Invalid parameters for {tool}: {message}")]
    InvalidParams {
        /// Tool or resource being called.
        tool: String,
        /// Which field or shape was wrong.
        message: String,
    },

    /// The addressed API or project does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable description.
        message: String,
    },

    /// The upstream call failed without a usable response.
    #[error("{message}")]
    Upstream {
        /// Human-readable description.
        message: String,
    },
}

impl ToolError {
    /// Creates an invalid-parameters error.
    #[must_use]
    pub fn invalid_params(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<TestApiError> for ToolError {
    fn from(error: TestApiError) -> Self {
        match error {
            TestApiError::NotFound { .. } => Self::NotFound {
                message: error.to_string(),
            },
            TestApiError::Build(_) | TestApiError::Transport(_) => Self::Upstream {
                message: error.to_string(),
            },
        }
    }
}
