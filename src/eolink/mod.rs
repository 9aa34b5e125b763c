//! Upstream access to the Eolink API-management service.
//!
//! # Failure policy
//!
//! Read operations degrade: any transport, status or decode failure is
//! logged and turned into an empty or absent value, wrapped in
//! [`Fetched::Degraded`] so callers can still tell the two apart.
//! `test_api` is the exception and propagates [`TestApiError`].

pub mod client;
pub mod error;
pub mod models;
pub mod request;

pub use client::EolinkClient;
pub use error::{error_chain, RequestBuildError, TestApiError, UpstreamError};
pub use models::{Api, ApiTestRequest, ApiTestResponse, HttpMethod, Project};

use async_trait::async_trait;

/// Result of a read operation.
#[derive(Debug)]
pub enum Fetched<T> {
    /// The upstream answered.
    Fresh(T),
    /// The call failed; `value` is the empty or absent default.
    Degraded {
        /// Fallback value.
        value: T,
        /// What went wrong.
        error: UpstreamError,
    },
}

impl<T> Fetched<T> {
    /// Returns `true` if the value is a fallback.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns the value, fresh or fallback.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Folds a fallible read into a [`Fetched`], logging any failure.
    pub fn from_result(result: Result<T, UpstreamError>, operation: &str) -> Self {
        match result {
            Ok(value) => Self::Fresh(value),
            Err(error) => {
                tracing::error!(
                    operation,
                    error = %error_chain(&error),
                    "Upstream read failed, returning empty result"
                );
                Self::Degraded {
                    value: T::default(),
                    error,
                }
            }
        }
    }
}

/// Operations offered by the upstream catalog service.
///
/// Implemented by [`EolinkClient`]; the catalog cache and tool handler only
/// depend on this trait.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Lists all projects.
    async fn list_projects(&self) -> Fetched<Vec<Project>>;

    /// Fetches one project. `None` when it does not exist.
    async fn get_project(&self, project_id: &str) -> Fetched<Option<Project>>;

    /// Lists the APIs of a project.
    async fn list_apis(&self, project_id: &str) -> Fetched<Vec<Api>>;

    /// Fetches one API descriptor. `None` when it does not exist.
    async fn get_api(&self, project_id: &str, api_id: &str) -> Fetched<Option<Api>>;

    /// Free-text search across all APIs.
    async fn search_apis(&self, query: &str) -> Fetched<Vec<Api>>;

    /// Sends a live request to an API described in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API does not resolve, the request cannot be
    /// built, or no response arrives. Non-success responses are not errors.
    async fn test_api(&self, request: &ApiTestRequest) -> Result<ApiTestResponse, TestApiError>;
}
