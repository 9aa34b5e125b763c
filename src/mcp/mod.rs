//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the Eolink catalog as MCP tools and resources. The
//! server speaks JSON-RPC 2.0 over either stdio or HTTP + Server-Sent Events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐   │
//! │  │  Transport  │───▶│   Server    │───▶│   ToolHandler   │   │
//! │  │ (stdio/SSE) │    │ (lifecycle) │    │ (tools + docs)  │   │
//! │  └─────────────┘    └─────────────┘    └─────────────────┘   │
//! │                                           │          │       │
//! │                                           ▼          ▼       │
//! │                                   ┌────────────┐ ┌────────┐  │
//! │                                   │CatalogCache│▶│Upstream│  │
//! │                                   └────────────┘ └────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod docs;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod sse;
pub mod tools;
pub mod transport;

pub use handler::ToolHandler;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
