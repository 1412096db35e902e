/*!
protocol.rs - JSON-RPC request construction and response rendering.

Request (one line, newline appended by the transport):
  {"jsonrpc":"2.0","id":<int>,"method":"tools/list"|"tools/call","params":{...}}

Response (read in full after the child exits):
  {"jsonrpc":"2.0","id":<int>,"result":{"content":[{"type":"text","text":"..."}]}}
*/

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SynthError, SynthResult};

pub const JSONRPC_VERSION: &str = "2.0";

/// Upper bound (exclusive) for request identifiers.
const REQUEST_ID_RANGE: u32 = 10_000;

/* ---- Request ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "tools/list")]
    ListTools,
    #[serde(rename = "tools/call")]
    CallTool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: u32,
    pub method: Method,
    pub params: RequestParams,
}

impl Request {
    /// Catalogue discovery: no operation name, no arguments.
    pub fn list_tools() -> Self {
        Self::build(Method::ListTools, RequestParams::default())
    }

    /// Invoke `name` with an already marshaled argument map.
    pub fn call_tool(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self::build(
            Method::CallTool,
            RequestParams {
                name: Some(name.into()),
                arguments: Some(arguments),
            },
        )
    }

    fn build(method: Method, params: RequestParams) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: OsRng.gen_range(0..REQUEST_ID_RANGE),
            method,
            params,
        }
    }

    /// Single-line wire form (without the trailing newline).
    pub fn to_line(&self) -> SynthResult<String> {
        serde_json::to_string(self).map_err(SynthError::Encode)
    }
}

/* ---- Response ---- */

#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<CallResult>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl ResponseEnvelope {
    fn content(&self) -> &[ContentItem] {
        self.result.as_ref().map(|r| r.content.as_slice()).unwrap_or(&[])
    }
}

/// Format a raw response body for printing.
///
/// The whole output is built before anything is printed, so a failure part
/// way through never leaves partial output on stdout.
pub fn render(response_text: &str, pretty: bool) -> SynthResult<String> {
    if !pretty {
        return Ok(response_text.to_string());
    }

    let envelope: ResponseEnvelope = serde_json::from_str(response_text)
        .map_err(|e| SynthError::Render(format!("response is not a JSON-RPC envelope: {e}")))?;

    tracing::debug!(id = ?envelope.id, "decoded response envelope");
    let content = envelope.content();
    if content.is_empty() {
        if let Some(err) = &envelope.error {
            tracing::warn!(code = err.code, message = %err.message, "server returned an error");
        }
        // nothing structured to pretty-print
        return Ok(response_text.to_string());
    }

    let mut blocks = Vec::with_capacity(content.len());
    for (idx, item) in content.iter().enumerate() {
        if item.kind != "text" {
            tracing::debug!(index = idx, kind = %item.kind, "skipping non-text content item");
            continue;
        }
        blocks.push(pretty_text(item.text.as_deref().unwrap_or_default(), idx)?);
    }

    if blocks.is_empty() {
        return Ok(response_text.to_string());
    }
    let mut out = blocks.join("\n");
    out.push('\n');
    Ok(out)
}

fn pretty_text(text: &str, idx: usize) -> SynthResult<String> {
    let encode = |e: serde_json::Error| SynthError::Render(e.to_string());

    if let Ok(object) = serde_json::from_str::<Map<String, Value>>(text) {
        return serde_json::to_string_pretty(&object).map_err(encode);
    }
    if let Ok(rows) = serde_json::from_str::<Vec<Map<String, Value>>>(text) {
        return serde_json::to_string_pretty(&rows).map_err(encode);
    }
    Err(SynthError::Render(format!(
        "content item {idx} is neither a JSON object nor an array of objects"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(texts: &[&str]) -> String {
        let content: Vec<Value> = texts
            .iter()
            .map(|t| json!({"type": "text", "text": t}))
            .collect();
        json!({"jsonrpc": "2.0", "id": 7, "result": {"content": content}}).to_string()
    }

    #[test]
    fn list_request_has_no_name_or_arguments() {
        let req = Request::list_tools();
        let v: Value = serde_json::from_str(&req.to_line().unwrap()).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["method"], "tools/list");
        assert_eq!(v["params"], json!({}));
        assert!(v["id"].as_u64().unwrap() < REQUEST_ID_RANGE as u64);
    }

    #[test]
    fn call_request_round_trips_arguments() {
        let args = json!({"owner": "golang", "issue_number": 1, "labels": ["bug"], "force": false})
            .as_object()
            .cloned()
            .unwrap();
        let line = Request::call_tool("get_issue", args.clone())
            .to_line()
            .unwrap();
        assert!(!line.contains('\n'));
        let back: Request = serde_json::from_str(&line).unwrap();
        assert_eq!(back.method, Method::CallTool);
        assert_eq!(back.params.name.as_deref(), Some("get_issue"));
        assert_eq!(back.params.arguments, Some(args));
    }

    #[test]
    fn verbatim_when_not_pretty() {
        let raw = "not even json";
        assert_eq!(render(raw, false).unwrap(), raw);
    }

    #[test]
    fn renders_single_object() {
        let out = render(&envelope(&[r#"{"a":1}"#]), true).unwrap();
        assert_eq!(out, format!("{}\n", serde_json::to_string_pretty(&json!({"a": 1})).unwrap()));
    }

    #[test]
    fn renders_array_of_objects() {
        let out = render(&envelope(&[r#"[{"a":1},{"a":2}]"#]), true).unwrap();
        let expected = serde_json::to_string_pretty(&json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(out, format!("{expected}\n"));
    }

    #[test]
    fn malformed_text_is_render_error() {
        let err = render(&envelope(&["{not json"]), true).unwrap_err();
        assert!(matches!(err, SynthError::Render(_)));
    }

    #[test]
    fn array_of_scalars_is_render_error() {
        let err = render(&envelope(&["[1,2,3]"]), true).unwrap_err();
        assert!(matches!(err, SynthError::Render(_)));
    }

    #[test]
    fn empty_content_falls_back_to_raw() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"nope"}}"#;
        assert_eq!(render(raw, true).unwrap(), raw);
    }

    #[test]
    fn multiple_items_and_non_text_items() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"content": [
                {"type": "text", "text": "{\"a\":1}"},
                {"type": "image", "data": "AAAA"},
                {"type": "text", "text": "{\"b\":2}"}
            ]}
        })
        .to_string();
        let out = render(&raw, true).unwrap();
        assert!(out.contains("\"a\": 1"));
        assert!(out.contains("\"b\": 2"));
        assert!(!out.contains("AAAA"));
    }

    #[test]
    fn undecodable_envelope_is_render_error() {
        assert!(matches!(render("<html>", true), Err(SynthError::Render(_))));
    }
}
