//! HTTP client for the Eolink OpenAPI.
//!
//! Stateless apart from its configuration, which is fixed at construction.
//! Every request carries the static credential header and is bounded by the
//! configured timeout.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::{error_chain, RequestBuildError, TestApiError, UpstreamError};
use super::models::{Api, ApiTestRequest, ApiTestResponse, Project};
use super::request::{to_header_map, PreparedRequest};
use super::{Fetched, Upstream};
use crate::config::UpstreamConfig;

/// The `{ "data": ... }` envelope around every upstream payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Client for the upstream catalog service.
#[derive(Debug, Clone)]
pub struct EolinkClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    credential_header: String,
    test_base_url: Option<Url>,
}

impl EolinkClient {
    /// Creates a client from the upstream configuration.
    ///
    /// An empty API key is logged as a warning; requests are still sent and
    /// will be rejected upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = parse_url(&config.base_url)?;
        let test_base_url = config
            .test_base_url
            .as_deref()
            .map(parse_url)
            .transpose()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Client)?;

        if config.api_key.is_empty() {
            warn!("EOLINK_API_KEY not set. Upstream requests will fail authentication");
        }

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            credential_header: config.credential_header.clone(),
            test_base_url,
        })
    }

    /// Headers attached to every request, in order.
    #[must_use]
    pub fn default_headers(&self) -> Vec<(String, String)> {
        vec![
            (self.credential_header.clone(), self.api_key.clone()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RequestBuildError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issues a GET and unwraps the `data` envelope.
    async fn get_data<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, UpstreamError> {
        debug!(url = %url, "Upstream GET");

        let headers = to_header_map(&self.default_headers())?;
        let response = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<T> = response.json().await.map_err(UpstreamError::Decode)?;
        Ok(envelope.data)
    }

    /// Fetches a list, decoding each record on its own.
    ///
    /// Records that do not fit the model are logged and skipped; the rest of
    /// the list is kept.
    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, UpstreamError> {
        let records: Vec<Value> = self.get_data(url).await?.unwrap_or_default();
        Ok(decode_records(records))
    }
}

fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let id = record.get("id").and_then(Value::as_str).map(str::to_owned);
            serde_json::from_value(record)
                .map_err(|e| {
                    warn!(index, id = ?id, error = %e, "Skipping malformed upstream record");
                })
                .ok()
        })
        .collect()
}

fn parse_url(value: &str) -> Result<Url, UpstreamError> {
    Url::parse(value).map_err(|e| {
        RequestBuildError::InvalidUrl {
            url: value.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Flattens response headers; repeated names are joined with `", "`.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// Decodes a response body: JSON when it parses, otherwise text.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Upstream for EolinkClient {
    async fn list_projects(&self) -> Fetched<Vec<Project>> {
        let result = match self.endpoint(&["projects"]) {
            Ok(url) => self.get_list(url).await,
            Err(e) => Err(e),
        };
        Fetched::from_result(result, "list_projects")
    }

    async fn get_project(&self, project_id: &str) -> Fetched<Option<Project>> {
        let result = match self.endpoint(&["projects", project_id]) {
            Ok(url) => self.get_data(url).await,
            Err(e) => Err(e),
        };
        Fetched::from_result(result, "get_project")
    }

    async fn list_apis(&self, project_id: &str) -> Fetched<Vec<Api>> {
        let result = match self.endpoint(&["v3", "api-management", "apis"]) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("project_id", project_id);
                self.get_list(url).await
            }
            Err(e) => Err(e),
        };
        Fetched::from_result(result, "list_apis")
    }

    async fn get_api(&self, project_id: &str, api_id: &str) -> Fetched<Option<Api>> {
        let result = match self.endpoint(&["projects", project_id, "apis", api_id]) {
            Ok(url) => self.get_data(url).await,
            Err(e) => Err(e),
        };
        Fetched::from_result(result, "get_api")
    }

    async fn search_apis(&self, query: &str) -> Fetched<Vec<Api>> {
        let result = match self.endpoint(&["search", "apis"]) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("q", query);
                self.get_list(url).await
            }
            Err(e) => Err(e),
        };
        Fetched::from_result(result, "search_apis")
    }

    async fn test_api(&self, request: &ApiTestRequest) -> Result<ApiTestResponse, TestApiError> {
        let api = self
            .get_api(&request.project_id, &request.api_id)
            .await
            .into_inner()
            .ok_or_else(|| TestApiError::NotFound {
                project_id: request.project_id.clone(),
                api_id: request.api_id.clone(),
            })?;

        let prepared = PreparedRequest::build(
            &api,
            request,
            &self.default_headers(),
            self.test_base_url.as_ref(),
        )?;
        debug!(method = %prepared.method, url = %prepared.url, "Sending API test request");
        let builder = prepared.into_builder(&self.http)?;

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::error!(api_id = %request.api_id, error = %error_chain(&e), "API test request failed");
            TestApiError::Transport(e)
        })?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let bytes = response.bytes().await.map_err(TestApiError::Transport)?;
        let elapsed = started.elapsed();
        let body = decode_body(&bytes);

        // Error responses report zero elapsed time.
        let response_time = if status.is_success() {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        } else {
            warn!(
                api_id = %request.api_id,
                status = status.as_u16(),
                "API test returned an error response"
            );
            0
        };

        Ok(ApiTestResponse {
            status_code: status.as_u16(),
            headers,
            body,
            response_time,
        })
    }
}
