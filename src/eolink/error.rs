//! Error types for upstream (Eolink) operations.
//!
//! Read operations never surface these to callers: they are carried inside
//! [`Fetched::Degraded`](super::Fetched::Degraded) for logging. Only
//! [`TestApiError`] propagates out of the client.

use std::fmt::Write;

use thiserror::Error;

/// Errors raised while assembling an outbound request.
#[derive(Debug, Error)]
pub enum RequestBuildError {
    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}'")]
    InvalidHeader {
        /// Header name as supplied.
        name: String,
    },

    /// The target URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A relative API path was given but no test base URL is configured.
    #[error("API path '{path}' is relative and no test base URL is configured")]
    MissingBaseUrl {
        /// The expanded, relative path.
        path: String,
    },
}

/// Errors from read calls against the upstream catalog service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// No response was received.
    #[error("Upstream request failed")]
    Transport(#[source] reqwest::Error),

    /// The upstream answered with a non-success status.
    #[error("Upstream responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response body was not the expected `{ "data": ... }` envelope.
    #[error("Failed to decode upstream response")]
    Decode(#[source] reqwest::Error),

    /// The request could not be assembled.
    #[error(transparent)]
    Build(#[from] RequestBuildError),
}

/// Errors from `test_api`, which propagate to the caller.
#[derive(Debug, Error)]
pub enum TestApiError {
    /// The API descriptor does not resolve in the given project.
    #[error("API {api_id} not found in project {project_id}")]
    NotFound {
        /// Project identifier.
        project_id: String,
        /// API identifier.
        api_id: String,
    },

    /// The request could not be assembled from the descriptor.
    #[error(transparent)]
    Build(#[from] RequestBuildError),

    /// The request was sent but no response arrived.
    #[error("API test request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Renders an error followed by each of its causes, separated by `": "`.
///
/// Transport failures from the HTTP client only name the URL at the top
/// level; the reason (refused, timed out, DNS) sits further down the chain.
#[must_use]
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("Upstream listing failed")]
    struct Wrapped(#[source] RequestBuildError);

    #[test]
    fn error_chain_includes_causes() {
        let error = Wrapped(RequestBuildError::InvalidHeader {
            name: "bad name".to_string(),
        });
        assert_eq!(
            error_chain(&error),
            "Upstream listing failed: Invalid header 'bad name'"
        );
        assert_eq!(
            error_chain(&UpstreamError::Status { status: 502 }),
            "Upstream responded with status 502"
        );
    }

    #[test]
    fn not_found_names_both_ids() {
        let error = TestApiError::NotFound {
            project_id: "p1".to_string(),
            api_id: "a9".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("p1"));
        assert!(msg.contains("a9"));
    }

    #[test]
    fn build_error_is_transparent() {
        let error: TestApiError = RequestBuildError::MissingBaseUrl {
            path: "/users/1".to_string(),
        }
        .into();
        assert!(error.to_string().contains("/users/1"));
    }

    #[test]
    fn status_error_display() {
        let error = UpstreamError::Status { status: 503 };
        assert!(error.to_string().contains("503"));
    }
}
