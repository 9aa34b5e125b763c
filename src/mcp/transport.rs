//! stdio transport for MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::mcp::protocol::Outgoing;

/// A stdio-based MCP transport.
///
/// Handles reading JSON-RPC messages from stdin and writing responses to stdout.
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Handle for stdout.
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }

    /// Reads the next message line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        Ok(Some(strip_line_ending(line)))
    }

    /// Writes a response or error to stdout, newline-terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message(&mut self, message: &Outgoing) -> io::Result<()> {
        let json = message
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // MCP: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a trailing `\n` or `\r\n`.
fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse, RequestId};

    #[test]
    fn strips_crlf_and_lf() {
        assert_eq!(strip_line_ending("{}\r\n".to_string()), "{}");
        assert_eq!(strip_line_ending("{}\n".to_string()), "{}");
        assert_eq!(strip_line_ending("{}".to_string()), "{}");
    }

    #[test]
    fn serialise_pretty_text_without_newlines() {
        // Tool results carry pretty-printed JSON; it must be escaped on the wire.
        let text = serde_json::to_string_pretty(&serde_json::json!({"projects": []})).unwrap();
        assert!(text.contains('\n'));

        let response = Outgoing::Response(JsonRpcResponse::success(
            RequestId::Number(1),
            serde_json::json!({"content": [{"type": "text", "text": text}]}),
        ));
        let json = response.to_json().unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }

    #[test]
    fn serialise_error_no_newlines() {
        let error = Outgoing::Error(JsonRpcError::method_not_found(
            RequestId::Number(1),
            "test/method",
        ));

        let json = error.to_json().unwrap();
        assert!(!json.contains('\n'));
    }
}
