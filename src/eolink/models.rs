//! Catalog data model as served by the Eolink OpenAPI.
//!
//! Field names are camelCase on the wire. Timestamps are kept as opaque
//! strings and never reparsed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An Eolink API project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: String,
}

/// HTTP methods an API descriptor may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[serde(alias = "get")]
    Get,
    /// POST
    #[serde(alias = "post")]
    Post,
    /// PUT
    #[serde(alias = "put")]
    Put,
    /// DELETE
    #[serde(alias = "delete")]
    Delete,
    /// PATCH
    #[serde(alias = "patch")]
    Patch,
    /// HEAD
    #[serde(alias = "head")]
    Head,
    /// OPTIONS
    #[serde(alias = "options")]
    Options,
}

impl HttpMethod {
    /// Returns the canonical upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Converts to the HTTP client's method type.
    #[must_use]
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared request or response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Example or fixed value.
    #[serde(default)]
    pub value: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the header must be sent.
    #[serde(default)]
    pub required: bool,
}

/// Primitive type of a declared parameter.
///
/// Names outside the common set (`integer`, `file`, ...) are kept verbatim in
/// [`ParamType::Other`] so one unusual record never spoils a whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    /// String value.
    String,
    /// Numeric value.
    Number,
    /// Boolean value.
    Boolean,
    /// Array value.
    Array,
    /// Object value.
    Object,
    /// Any other type name.
    Other(String),
}

impl ParamType {
    /// Returns the type name as sent by the upstream.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ParamType {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::Other(name),
        }
    }
}

impl From<ParamType> for String {
    fn from(kind: ParamType) -> Self {
        match kind {
            ParamType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Where a declared parameter is carried.
///
/// Unknown locations are kept verbatim in [`ParamLocation::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamLocation {
    /// Query string.
    Query,
    /// Path placeholder.
    Path,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Any other location name.
    Other(String),
}

impl ParamLocation {
    /// Returns the location name as sent by the upstream.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ParamLocation {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "query" => Self::Query,
            "path" => Self::Path,
            "header" => Self::Header,
            "cookie" => Self::Cookie,
            _ => Self::Other(name),
        }
    }
}

impl From<ParamLocation> for String {
    fn from(location: ParamLocation) -> Self {
        match location {
            ParamLocation::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Primitive type.
    #[serde(rename = "type")]
    pub kind: ParamType,
    /// Location.
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A declared request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// MIME type, e.g. `application/json`.
    pub content_type: String,
    /// JSON schema, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// Example payload, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Whether a body must be sent.
    #[serde(default)]
    pub required: bool,
}

/// A declared response for one status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// JSON schema, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// Example payload, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// An API endpoint descriptor belonging to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    /// Identifier, unique within the owning project.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning project identifier.
    #[serde(default)]
    pub project_id: String,
    /// Path template, may contain `{param}` placeholders.
    pub path: String,
    /// Declared HTTP method.
    pub method: HttpMethod,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared request headers, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Vec<Header>>,
    /// Declared parameters, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_params: Option<Vec<Parameter>>,
    /// Declared request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Declared responses, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<ApiResponse>>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: String,
}

/// Caller input for `test_api`.
///
/// Doubles as the typed argument struct of the `test_api` tool, so serde
/// deserialisation is the parameter validation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTestRequest {
    /// Project identifier.
    pub project_id: String,
    /// API identifier.
    pub api_id: String,
    /// Headers applied over the defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Query string parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    /// Values substituted into `{param}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_params: Option<BTreeMap<String, String>>,
    /// Request body, opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Outcome of `test_api`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTestResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body: JSON when it parses, otherwise a string.
    pub body: Value,
    /// Elapsed time in milliseconds. Zero for non-success responses.
    pub response_time: u64,
}
