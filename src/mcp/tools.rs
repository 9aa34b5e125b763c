//! Tool definitions and typed tool arguments.
//!
//! Every tool declares a JSON Schema for `tools/list` and a matching argument
//! struct. Arguments are deserialised before any upstream call, so a missing
//! or mistyped field never reaches the catalog.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Arguments of `get_project` and `list_apis`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectArgs {
    /// Project identifier.
    pub project_id: String,
}

/// Arguments of `get_api`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArgs {
    /// Project identifier.
    pub project_id: String,
    /// API identifier.
    pub api_id: String,
}

/// Arguments of `search_apis`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    /// Free-text query, passed through to the upstream search.
    pub query: String,
}

/// Deserialises tool arguments, treating absent or `null` as `{}`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidParams`] naming the offending field.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };

    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_params(tool, e.to_string()))
}

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn string_map_property(description: &str) -> Value {
    json!({
        "type": "object",
        "additionalProperties": { "type": "string" },
        "description": description
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Returns the list of available tools.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list_projects".to_string(),
            description: Some(
                "List all Eolink projects visible to the configured API key. \
                 The list is cached after the first non-empty load."
                    .to_string(),
            ),
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "get_project".to_string(),
            description: Some(
                "Fetch a single project by id. Returns null when the project does not exist."
                    .to_string(),
            ),
            input_schema: object_schema(
                json!({ "projectId": string_property("Project ID") }),
                &["projectId"],
            ),
        },
        ToolDefinition {
            name: "list_apis".to_string(),
            description: Some(
                "List the API descriptors of a project. Each project's list is \
                 fetched once and then served from cache."
                    .to_string(),
            ),
            input_schema: object_schema(
                json!({ "projectId": string_property("Project ID") }),
                &["projectId"],
            ),
        },
        ToolDefinition {
            name: "get_api".to_string(),
            description: Some(
                "Fetch the full descriptor of one API, including headers, parameters, \
                 request body and declared responses."
                    .to_string(),
            ),
            input_schema: object_schema(
                json!({
                    "projectId": string_property("Project ID"),
                    "apiId": string_property("API ID")
                }),
                &["projectId", "apiId"],
            ),
        },
        ToolDefinition {
            name: "search_apis".to_string(),
            description: Some("Search APIs across all projects by free text.".to_string()),
            input_schema: object_schema(
                json!({ "query": string_property("Search query") }),
                &["query"],
            ),
        },
        ToolDefinition {
            name: "test_api".to_string(),
            description: Some(
                "Send a live HTTP request to an API using its declared method and path. \
                 Path parameters fill {placeholders}; caller headers override the defaults. \
                 Returns status code, headers, body and response time in milliseconds."
                    .to_string(),
            ),
            input_schema: object_schema(
                json!({
                    "projectId": string_property("Project ID"),
                    "apiId": string_property("API ID"),
                    "headers": string_map_property("Request headers"),
                    "queryParams": string_map_property("Query parameters"),
                    "pathParams": string_map_property("Path parameters"),
                    "body": { "description": "Request body" }
                }),
                &["projectId", "apiId"],
            ),
        },
        ToolDefinition {
            name: "clear_cache".to_string(),
            description: Some(
                "Forget cached projects and API lists so the next calls refetch from Eolink."
                    .to_string(),
            ),
            input_schema: object_schema(json!({}), &[]),
        },
    ]
}
