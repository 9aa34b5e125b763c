//! Dynamic request construction for `test_api`.
//!
//! Turns an [`Api`] descriptor plus caller-supplied parameters into a
//! concrete request: placeholders substituted, headers merged, URL resolved.
//! Everything here is pure so it can be tested without a network.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use super::error::RequestBuildError;
use super::models::{Api, ApiTestRequest, HttpMethod};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn placeholder_regex() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([^{}/]+)\}").ok())
        .as_ref()
}

/// Substitutes `{key}` placeholders with percent-encoded values.
///
/// Every occurrence of each key is replaced. Placeholders without a matching
/// entry are left intact.
#[must_use]
pub fn expand_path(template: &str, path_params: Option<&BTreeMap<String, String>>) -> String {
    let Some(params) = path_params else {
        return template.to_string();
    };

    params.iter().fold(template.to_string(), |path, (key, value)| {
        let encoded = utf8_percent_encode(value, URI_COMPONENT).to_string();
        path.replace(&format!("{{{key}}}"), &encoded)
    })
}

/// Returns the names of `{param}` placeholders still present in `path`.
#[must_use]
pub fn unresolved_placeholders(path: &str) -> Vec<String> {
    placeholder_regex()
        .into_iter()
        .flat_map(|re| re.captures_iter(path))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Merges caller headers over the defaults.
///
/// Defaults keep their order. A caller header replaces any default with the
/// same name, compared case-insensitively, and is appended after them.
#[must_use]
pub fn merge_headers(
    defaults: &[(String, String)],
    overrides: Option<&BTreeMap<String, String>>,
) -> Vec<(String, String)> {
    let overrides = overrides.map(|o| o.iter().collect::<Vec<_>>()).unwrap_or_default();

    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(name, _)| {
            !overrides
                .iter()
                .any(|(key, _)| key.eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect();

    merged.extend(
        overrides
            .into_iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    merged
}

/// Converts header pairs into a client header map.
///
/// # Errors
///
/// Returns [`RequestBuildError::InvalidHeader`] if a name or value is not
/// valid HTTP.
pub fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap, RequestBuildError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || RequestBuildError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Resolves an expanded API path to an absolute URL.
///
/// Absolute `http(s)://` paths are used as-is; anything else is appended to
/// `base`.
///
/// # Errors
///
/// Returns an error if the result does not parse or no base is available
/// for a relative path.
pub fn resolve_url(path: &str, base: Option<&Url>) -> Result<Url, RequestBuildError> {
    let parse = |candidate: &str| {
        Url::parse(candidate).map_err(|e| RequestBuildError::InvalidUrl {
            url: candidate.to_string(),
            reason: e.to_string(),
        })
    };

    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return parse(path);
    }

    let base = base.ok_or_else(|| RequestBuildError::MissingBaseUrl {
        path: path.to_string(),
    })?;
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    parse(&joined)
}

/// A fully assembled `test_api` request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Declared method of the API.
    pub method: HttpMethod,
    /// Resolved target URL.
    pub url: Url,
    /// Merged headers, defaults first.
    pub headers: Vec<(String, String)>,
    /// Query string parameters.
    pub query: BTreeMap<String, String>,
    /// Opaque body.
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Builds the request for `api` from the caller's parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved.
    pub fn build(
        api: &Api,
        request: &ApiTestRequest,
        default_headers: &[(String, String)],
        base: Option<&Url>,
    ) -> Result<Self, RequestBuildError> {
        let path = expand_path(&api.path, request.path_params.as_ref());

        let unresolved = unresolved_placeholders(&path);
        if !unresolved.is_empty() {
            tracing::warn!(
                api_id = %api.id,
                placeholders = ?unresolved,
                "Path placeholders left unresolved"
            );
        }

        Ok(Self {
            method: api.method,
            url: resolve_url(&path, base)?,
            headers: merge_headers(default_headers, request.headers.as_ref()),
            query: request.query_params.clone().unwrap_or_default(),
            body: request.body.clone().filter(|b| !b.is_null()),
        })
    }

    /// Looks up the effective value of a header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Converts into a client request builder.
    ///
    /// String bodies are sent verbatim; other values are sent as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is not valid HTTP.
    pub fn into_builder(
        self,
        client: &reqwest::Client,
    ) -> Result<reqwest::RequestBuilder, RequestBuildError> {
        let headers = to_header_map(&self.headers)?;
        let mut builder = client
            .request(self.method.to_reqwest(), self.url)
            .headers(headers);

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match self.body {
            Some(Value::String(text)) => builder.body(text),
            Some(body) => builder.json(&body),
            None => builder,
        };

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn api(path: &str) -> Api {
        serde_json::from_value(serde_json::json!({
            "id": "a1",
            "name": "Get user",
            "projectId": "p1",
            "path": path,
            "method": "POST"
        }))
        .unwrap()
    }

    #[test]
    fn expand_simple_placeholder() {
        let p = params(&[("id", "42")]);
        assert_eq!(expand_path("/users/{id}", Some(&p)), "/users/42");
    }

    #[test]
    fn expand_encodes_reserved_characters() {
        let p = params(&[("id", "a b")]);
        assert_eq!(expand_path("/users/{id}", Some(&p)), "/users/a%20b");

        let p = params(&[("id", "x/y?z")]);
        assert_eq!(expand_path("/users/{id}", Some(&p)), "/users/x%2Fy%3Fz");

        let p = params(&[("id", "it's-(ok)~")]);
        assert_eq!(expand_path("/users/{id}", Some(&p)), "/users/it's-(ok)~");
    }

    #[test]
    fn expand_leaves_unmatched_placeholders() {
        let p = params(&[("id", "42")]);
        let path = expand_path("/users/{id}/posts/{postId}", Some(&p));
        assert_eq!(path, "/users/42/posts/{postId}");
        assert_eq!(unresolved_placeholders(&path), vec!["postId".to_string()]);
    }

    #[test]
    fn expand_without_params_is_identity() {
        assert_eq!(expand_path("/users/{id}", None), "/users/{id}");
    }

    #[test]
    fn caller_header_overrides_default() {
        let defaults = vec![
            ("project_id".to_string(), "X".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        let overrides = params(&[("project_id", "Y")]);

        let merged = merge_headers(&defaults, Some(&overrides));
        let values: Vec<_> = merged
            .iter()
            .filter(|(k, _)| k == "project_id")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(values, vec!["Y"]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn header_override_is_case_insensitive() {
        let defaults = vec![("Content-Type".to_string(), "application/json".to_string())];
        let overrides = params(&[("content-type", "text/plain")]);

        let merged = merge_headers(&defaults, Some(&overrides));
        assert_eq!(
            merged,
            vec![("content-type".to_string(), "text/plain".to_string())]
        );
    }

    #[test]
    fn reject_invalid_header_value() {
        let headers = vec![("X-Bad".to_string(), "line\nbreak".to_string())];
        assert!(matches!(
            to_header_map(&headers),
            Err(RequestBuildError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn resolve_relative_against_base() {
        let base = Url::parse("http://localhost:8080/v1/").unwrap();
        let url = resolve_url("/users/a%20b", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/users/a%20b");
    }

    #[test]
    fn resolve_absolute_ignores_base() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = resolve_url("https://example.com/ping", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/ping");
    }

    #[test]
    fn resolve_relative_without_base_fails() {
        assert!(matches!(
            resolve_url("/users/42", None),
            Err(RequestBuildError::MissingBaseUrl { .. })
        ));
    }

    #[test]
    fn prepared_request_merges_everything() {
        let base = Url::parse("http://localhost:9000").unwrap();
        let request = ApiTestRequest {
            project_id: "p1".to_string(),
            api_id: "a1".to_string(),
            headers: Some(params(&[("project_id", "Y")])),
            query_params: Some(params(&[("verbose", "true")])),
            path_params: Some(params(&[("id", "42")])),
            body: Some(serde_json::json!({"name": "n"})),
        };
        let defaults = vec![("project_id".to_string(), "X".to_string())];

        let prepared =
            PreparedRequest::build(&api("/users/{id}"), &request, &defaults, Some(&base)).unwrap();

        assert_eq!(prepared.method, HttpMethod::Post);
        assert_eq!(prepared.url.as_str(), "http://localhost:9000/users/42");
        assert_eq!(prepared.header("PROJECT_ID"), Some("Y"));
        assert_eq!(prepared.query.get("verbose").map(String::as_str), Some("true"));
        assert!(prepared.body.is_some());
    }

    #[test]
    fn null_body_is_dropped() {
        let base = Url::parse("http://localhost:9000").unwrap();
        let request = ApiTestRequest {
            body: Some(Value::Null),
            ..ApiTestRequest::default()
        };
        let prepared = PreparedRequest::build(&api("/ping"), &request, &[], Some(&base)).unwrap();
        assert!(prepared.body.is_none());
    }
}
