//! Tool and resource handlers.
//!
//! [`ToolHandler`] validates arguments, routes each tool to the catalog
//! cache or the upstream client, and shapes results as MCP text content.
//! It is transport-agnostic: the stdio loop and every SSE session share one
//! handler through an `Arc`.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::catalog::CatalogCache;
use crate::eolink::{ApiTestRequest, Upstream};
use crate::error::ToolError;
use crate::mcp::docs::render_api_documentation;
use crate::mcp::tools::{parse_args, ApiArgs, ProjectArgs, SearchArgs, ToolCallResult};

/// URI scheme of the API documentation resource.
pub const API_DOCS_SCHEME: &str = "api-docs://";

/// URI template advertised for the API documentation resource.
pub const API_DOCS_TEMPLATE: &str = "api-docs://{projectId}/{apiId}";

/// Dispatches tool calls and resource reads.
pub struct ToolHandler {
    cache: CatalogCache,
    upstream: Arc<dyn Upstream>,
}

impl ToolHandler {
    /// Creates a handler with a fresh cache over `upstream`.
    #[must_use]
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            cache: CatalogCache::new(Arc::clone(&upstream)),
            upstream,
        }
    }

    /// Preloads the project list; `false` if Eolink could not be reached.
    pub async fn warm_up(&self) -> bool {
        self.cache.warm_up().await
    }

    /// Runs the named tool.
    ///
    /// An unknown tool name yields an error result rather than an `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParams`] before any upstream call when the
    /// arguments are malformed, and [`ToolError::NotFound`] or
    /// [`ToolError::Upstream`] when `test_api` cannot produce a response.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolCallResult, ToolError> {
        debug!(tool = name, "Calling tool");

        match name {
            "list_projects" => {
                let projects = self.cache.projects().await;
                Ok(keyed("projects", &projects))
            }
            "get_project" => {
                let args: ProjectArgs = parse_args(name, arguments)?;
                let project = self.upstream.get_project(&args.project_id).await.into_inner();
                Ok(keyed("project", &project))
            }
            "list_apis" => {
                let args: ProjectArgs = parse_args(name, arguments)?;
                let apis = self.cache.apis(&args.project_id).await;
                Ok(keyed("apis", &apis))
            }
            "get_api" => {
                let args: ApiArgs = parse_args(name, arguments)?;
                let api = self
                    .upstream
                    .get_api(&args.project_id, &args.api_id)
                    .await
                    .into_inner();
                Ok(keyed("api", &api))
            }
            "search_apis" => {
                let args: SearchArgs = parse_args(name, arguments)?;
                let apis = self.upstream.search_apis(&args.query).await.into_inner();
                Ok(keyed("apis", &apis))
            }
            "test_api" => {
                let request: ApiTestRequest = parse_args(name, arguments)?;
                let response = self.upstream.test_api(&request).await?;
                info!(
                    project_id = %request.project_id,
                    api_id = %request.api_id,
                    status = response.status_code,
                    "API test completed"
                );
                Ok(keyed("response", &response))
            }
            "clear_cache" => {
                self.cache.clear().await;
                Ok(keyed("cleared", &true))
            }
            _ => Ok(ToolCallResult::error(format!("Unknown tool: {name}"))),
        }
    }

    /// Reads a resource by URI, returning the `resources/read` result.
    ///
    /// An API that does not exist yields an empty `contents` list.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidParams`] for a URI that is not of the form
    /// `api-docs://{projectId}/{apiId}`.
    pub async fn read_resource(&self, uri: &str) -> Result<Value, ToolError> {
        let (project_id, api_id) = parse_api_docs_uri(uri)?;

        let Some(api) = self.upstream.get_api(&project_id, &api_id).await.into_inner() else {
            debug!(uri, "API not found, returning empty resource");
            return Ok(json!({ "contents": [] }));
        };

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": "text/markdown",
                "text": render_api_documentation(&api),
            }]
        }))
    }

    /// Returns the `resources/templates/list` result.
    #[must_use]
    pub fn resource_templates() -> Value {
        json!({
            "resourceTemplates": [{
                "uriTemplate": API_DOCS_TEMPLATE,
                "name": "api-docs",
                "description": "Markdown documentation for one API: path, method, \
                                headers, parameters, request body and responses",
                "mimeType": "text/markdown",
            }]
        })
    }
}

/// Wraps `value` as `{ key: value }`, pretty-printed into one text block.
fn keyed<T: Serialize>(key: &str, value: &T) -> ToolCallResult {
    let text = serde_json::to_string_pretty(&json!({ key: value })).unwrap_or_default();
    ToolCallResult::text(text)
}

/// Splits `api-docs://{projectId}/{apiId}` into its percent-decoded ids.
///
/// # Errors
///
/// Returns [`ToolError::InvalidParams`] unless the URI has the scheme and
/// exactly two non-empty segments.
pub fn parse_api_docs_uri(uri: &str) -> Result<(String, String), ToolError> {
    let malformed = || {
        ToolError::invalid_params(
            "resources/read",
            format!("expected {API_DOCS_TEMPLATE}, got {uri}"),
        )
    };

    let rest = uri.strip_prefix(API_DOCS_SCHEME).ok_or_else(malformed)?;
    let mut segments = rest.split('/');

    let (Some(project), Some(api), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(malformed());
    };
    if project.is_empty() || api.is_empty() {
        return Err(malformed());
    }

    let decode = |segment: &str| {
        percent_decode_str(segment)
            .decode_utf8()
            .map(|s| s.into_owned())
            .map_err(|_| malformed())
    };

    Ok((decode(project)?, decode(api)?))
}
