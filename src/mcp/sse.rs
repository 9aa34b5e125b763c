//! HTTP + Server-Sent Events transport.
//!
//! - `GET /sse` opens a session. The first event is `endpoint`, whose data
//!   is the URL to POST messages to; every response follows as a `message`
//!   event.
//! - `POST /messages?sessionId=<id>` feeds one JSON-RPC message to that
//!   session and answers `202 Accepted`. The response travels on the stream.
//! - A session lives exactly as long as its event stream.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::sse::Event;
use warp::{Filter, Rejection, Reply};

use crate::mcp::handler::ToolHandler;
use crate::mcp::server::McpServer;

/// Largest accepted POST body.
const MAX_MESSAGE_BYTES: u64 = 4 * 1024 * 1024;

/// Plain-text answer for `GET /`.
pub const BANNER: &str = "apikit-mcp server is running. Connect an MCP client to /sse.";

#[derive(Clone)]
struct Session {
    server: Arc<tokio::sync::Mutex<McpServer>>,
    sender: mpsc::UnboundedSender<String>,
}

type Sessions = Arc<Mutex<HashMap<String, Session>>>;

/// Shared state of the HTTP transport.
#[derive(Clone)]
pub struct SseState {
    handler: Arc<ToolHandler>,
    sessions: Sessions,
}

impl SseState {
    /// Creates transport state with no open sessions.
    #[must_use]
    pub fn new(handler: Arc<ToolHandler>) -> Self {
        Self {
            handler,
            sessions: Arc::default(),
        }
    }

    /// Returns the number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// Registers a new session and returns its event stream.
    ///
    /// Dropping the stream closes the session.
    fn open_session(&self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        let session_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::unbounded_channel();

        let session = Session {
            server: Arc::new(tokio::sync::Mutex::new(McpServer::new(Arc::clone(
                &self.handler,
            )))),
            sender,
        };
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), session);
        info!(session_id = %session_id, "SSE session opened");

        let endpoint = Event::default()
            .event("endpoint")
            .data(format!("/messages?sessionId={session_id}"));

        let guard = SessionGuard {
            sessions: Arc::clone(&self.sessions),
            session_id,
        };

        let messages = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
            let message = receiver.recv().await?;
            let event = Event::default().event("message").data(message);
            Some((Ok(event), (receiver, guard)))
        });

        stream::once(async move { Ok(endpoint) }).chain(messages)
    }
}

/// Removes its session when the event stream is dropped.
struct SessionGuard {
    sessions: Sessions,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
        info!(session_id = %self.session_id, "SSE session closed");
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    session_id: Option<String>,
}

fn with_state(state: SseState) -> impl Filter<Extract = (SseState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Builds the HTTP routes.
pub fn routes(state: SseState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let banner = warp::path::end().and(warp::get()).map(|| BANNER);

    let sse = warp::path("sse")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: SseState| warp::sse::reply(warp::sse::keep_alive().stream(state.open_session())));

    let messages = warp::path("messages")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<MessageQuery>())
        .and(warp::body::content_length_limit(MAX_MESSAGE_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_post);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(["GET", "POST", "OPTIONS"])
        .allow_headers(["content-type"]);

    banner.or(sse).or(messages).with(cors)
}

async fn handle_post(
    query: MessageQuery,
    body: Bytes,
    state: SseState,
) -> Result<warp::reply::Response, Infallible> {
    let Some(session) = query.session_id.as_deref().and_then(|id| state.session(id)) else {
        warn!(session_id = ?query.session_id, "POST for unknown SSE session");
        let reply = warp::reply::json(&json!({ "error": "No active SSE connection" }));
        return Ok(warp::reply::with_status(reply, StatusCode::BAD_REQUEST).into_response());
    };

    let line = String::from_utf8_lossy(&body);
    let outgoing = session.server.lock().await.handle_line(&line).await;

    if let Some(outgoing) = outgoing {
        match outgoing.to_json() {
            Ok(json) => {
                if session.sender.send(json).is_err() {
                    debug!("SSE stream closed before the response was delivered");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialise response"),
        }
    }

    Ok(warp::reply::with_status("Accepted", StatusCode::ACCEPTED).into_response())
}

/// Serves the HTTP transport until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn serve(handler: Arc<ToolHandler>, addr: SocketAddr) -> std::io::Result<()> {
    let state = SseState::new(handler);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, initiating graceful shutdown");
    };

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(std::io::Error::other)?;

    info!(address = %bound, "HTTP transport listening; clients connect to /sse");
    server.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eolink::Upstream;
    use crate::test_support::MockUpstream;

    fn session_id_of(endpoint_event: &str) -> String {
        endpoint_event
            .split("sessionId=")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .map(str::to_string)
            .unwrap()
    }

    fn state() -> SseState {
        let upstream: Arc<dyn Upstream> = Arc::new(MockUpstream::default());
        SseState::new(Arc::new(ToolHandler::new(upstream)))
    }

    #[tokio::test]
    async fn banner_on_root() {
        let response = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), BANNER.as_bytes());
    }

    #[tokio::test]
    async fn post_without_session_is_bad_request() {
        let response = warp::test::request()
            .method("POST")
            .path("/messages")
            .body(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "No active SSE connection");
    }

    #[tokio::test]
    async fn post_with_unknown_session_is_bad_request() {
        let response = warp::test::request()
            .method("POST")
            .path("/messages?sessionId=does-not-exist")
            .body("{}")
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn session_delivers_responses_on_stream() {
        let state = state();
        let mut events = Box::pin(state.open_session());

        let endpoint = events.next().await.unwrap().unwrap().to_string();
        assert!(endpoint.contains("endpoint"));
        let session_id = session_id_of(&endpoint);
        assert_eq!(state.session_count(), 1);

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/messages?sessionId={session_id}"))
            .body(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#)
            .reply(&routes(state.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let message = events.next().await.unwrap().unwrap().to_string();
        assert!(message.contains(r#""id":7"#), "{message}");
        assert!(message.contains(r#""result":{}"#), "{message}");
    }

    #[tokio::test]
    async fn dropping_stream_closes_session() {
        let state = state();
        let mut events = Box::pin(state.open_session());
        events.next().await;
        assert_eq!(state.session_count(), 1);

        drop(events);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn notifications_are_accepted_without_stream_output() {
        let state = state();
        let mut events = Box::pin(state.open_session());
        let endpoint = events.next().await.unwrap().unwrap().to_string();
        let session_id = session_id_of(&endpoint);

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/messages?sessionId={session_id}"))
            .body(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .reply(&routes(state.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), events.next()).await;
        assert!(pending.is_err(), "no event expected for a notification");
    }
}
