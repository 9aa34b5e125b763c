//! Markdown rendering for the `api-docs://` resource.

use std::fmt::Write as _;

use serde_json::Value;

use crate::eolink::models::{Api, ApiResponse, Header, Parameter, RequestBody};

/// Renders an API descriptor as a Markdown document.
///
/// Sections for optional fields are omitted when the field is absent or
/// empty. Schemas and examples are embedded as pretty-printed JSON.
#[must_use]
pub fn render_api_documentation(api: &Api) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "# {}\n", api.name);
    let _ = writeln!(doc, "**Path:** {}", api.path);
    let _ = writeln!(doc, "**Method:** {}", api.method);

    if let Some(description) = api.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(doc, "\n## Description\n{description}");
    }

    if let Some(headers) = non_empty(api.request_headers.as_deref()) {
        doc.push_str("\n## Request Headers\n");
        for header in headers {
            render_header(&mut doc, header);
        }
    }

    if let Some(params) = non_empty(api.request_params.as_deref()) {
        doc.push_str("\n## Parameters\n");
        for param in params {
            render_parameter(&mut doc, param);
        }
    }

    if let Some(body) = &api.request_body {
        render_request_body(&mut doc, body);
    }

    if let Some(responses) = non_empty(api.responses.as_deref()) {
        doc.push_str("\n## Responses\n");
        for response in responses {
            render_response(&mut doc, response);
        }
    }

    doc
}

fn non_empty<T>(items: Option<&[T]>) -> Option<&[T]> {
    items.filter(|items| !items.is_empty())
}

const fn requirement(required: bool) -> &'static str {
    if required {
        "(Required)"
    } else {
        "(Optional)"
    }
}

fn render_header(doc: &mut String, header: &Header) {
    let _ = writeln!(
        doc,
        "- **{}** {}: {}",
        header.name,
        requirement(header.required),
        header.description.as_deref().unwrap_or_default()
    );
}

fn render_parameter(doc: &mut String, param: &Parameter) {
    let _ = writeln!(
        doc,
        "- **{}** ({}) {}: {}",
        param.name,
        param.location.as_str(),
        requirement(param.required),
        param.description.as_deref().unwrap_or_default()
    );
}

fn render_request_body(doc: &mut String, body: &RequestBody) {
    doc.push_str("\n## Request Body\n");
    let _ = writeln!(doc, "Content Type: {}", body.content_type);
    render_json(doc, "Schema", body.schema.as_ref());
    render_json(doc, "Example", body.example.as_ref());
}

fn render_response(doc: &mut String, response: &ApiResponse) {
    let _ = writeln!(doc, "### Status Code: {}", response.status_code);
    if let Some(description) = response.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(doc, "{description}");
    }
    if let Some(content_type) = response.content_type.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(doc, "Content Type: {content_type}");
    }
    render_json(doc, "Schema", response.schema.as_ref());
    render_json(doc, "Example", response.example.as_ref());
}

fn render_json(doc: &mut String, label: &str, value: Option<&Value>) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return;
    };
    let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
    let _ = writeln!(doc, "{label}: {pretty}");
}
