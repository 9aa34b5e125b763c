//! apikit-mcp: MCP server for the Eolink API-management platform
//!
//! This library lets AI assistants browse Eolink projects and API
//! descriptors, read rendered API documentation and fire live test requests.
//!
//! # Architecture
//!
//! - **Upstream client**: typed, fail-soft reads against the Eolink OpenAPI
//!   and a fail-loud `test_api` that issues the described request
//! - **Catalog cache**: memoizes the project list and per-project API lists
//! - **MCP surface**: seven tools and one `api-docs://` resource template,
//!   served over stdio or HTTP + SSE
//!
//! # Modules
//!
//! - [`catalog`]: In-memory project and API cache
//! - [`config`]: Configuration loading and validation
//! - [`eolink`]: Upstream data model and HTTP client
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol implementation

pub mod catalog;
pub mod config;
pub mod eolink;
pub mod error;
pub mod mcp;

#[cfg(test)]
mod test_support;
