/*!
catalogue.rs - operation catalogue model and discovery.

Accepted shapes (after the optional JSON-RPC `result` wrapper is removed):
  {"tools":      [{"name", "description", "inputSchema": {...}}]}
  {"operations": [{"name", "description", "schema":      {...}}]}

Parameters keep their raw JSON-Schema fields; `Parameter::kind` narrows them
to the closed set of kinds the synthesizer knows how to turn into flags.
A property in a shape this client does not understand is kept without a kind
instead of failing the whole catalogue.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::protocol::Request;
use super::transport::Transport;
use crate::error::{SynthError, SynthResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    #[serde(alias = "operations")]
    pub tools: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(
        rename = "inputSchema",
        alias = "input_schema",
        alias = "schema",
        default
    )]
    pub schema: ParameterSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub required: Vec<String>,
    /// Carried for display only; enforcement is the server's business.
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Value>,
}

/// One property of an input schema.
///
/// Decoding never fails: fields of an unexpected JSON shape are dropped, so an
/// odd property costs its own flag and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Parameter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ItemSchema>>,
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let allowed = match map.remove("enum") {
            Some(Value::Array(values)) => values,
            _ => Vec::new(),
        };
        Self {
            type_tag: map.remove("type"),
            description: map
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            allowed,
            minimum: map.get("minimum").and_then(Value::as_f64),
            maximum: map.get("maximum").and_then(Value::as_f64),
            items: map
                .get("items")
                .and_then(ItemSchema::from_value)
                .map(Box::new),
        }
    }
}

/// Element descriptor of an array parameter. Only the single-schema form of
/// `items` is understood; tuple and boolean forms leave it unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ItemSchema {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let properties = map
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, p)| (name.clone(), Parameter::from(p.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            type_tag: map.get("type").cloned(),
            properties,
            required: string_list(map.get("required")),
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parameter kinds with a flag representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    Text { allowed: Vec<String> },
    Number { minimum: Option<f64>, maximum: Option<f64> },
    Integer { minimum: Option<f64>, maximum: Option<f64> },
    Boolean,
    StringList,
    ObjectList { fields: Vec<String>, required: Vec<String> },
}

impl ParameterKind {
    pub fn label(&self) -> &'static str {
        match self {
            ParameterKind::Text { .. } => "string",
            ParameterKind::Number { .. } => "number",
            ParameterKind::Integer { .. } => "integer",
            ParameterKind::Boolean => "boolean",
            ParameterKind::StringList => "string[]",
            ParameterKind::ObjectList { .. } => "object[]",
        }
    }
}

/// Resolve a JSON-Schema `type`, picking the first non-null entry of a union.
fn type_name(tag: Option<&Value>) -> Option<&str> {
    match tag? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(options) => options
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

impl Parameter {
    /// `None` for kinds this client does not understand yet.
    pub fn kind(&self) -> Option<ParameterKind> {
        let kind = match type_name(self.type_tag.as_ref())? {
            "string" => ParameterKind::Text {
                allowed: self
                    .allowed
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            },
            "number" => ParameterKind::Number {
                minimum: self.minimum,
                maximum: self.maximum,
            },
            "integer" => ParameterKind::Integer {
                minimum: self.minimum,
                maximum: self.maximum,
            },
            "boolean" => ParameterKind::Boolean,
            "array" => {
                let items = self.items.as_deref()?;
                match type_name(items.type_tag.as_ref())? {
                    "string" => ParameterKind::StringList,
                    "object" => ParameterKind::ObjectList {
                        fields: items.properties.keys().cloned().collect(),
                        required: items.required.clone(),
                    },
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(kind)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

impl ParameterSchema {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Unknown parameters are tolerated unless `additionalProperties` is `false`.
    pub fn tolerates_unknown(&self) -> bool {
        !matches!(self.additional_properties, Some(Value::Bool(false)))
    }
}

impl Operation {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

impl Catalogue {
    /// Decode a `tools/list` response body.
    pub fn from_response(text: &str) -> SynthResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SynthError::SchemaDecode(format!("response is not JSON: {e}")))?;

        if let Some(err) = value.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(SynthError::SchemaDecode(format!(
                "server returned an error: {message}"
            )));
        }

        let body = match value {
            Value::Object(mut map) if map.contains_key("result") => {
                map.remove("result").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(body).map_err(|e| SynthError::SchemaDecode(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/* ---- Fetch ---- */

/// Send `tools/list` and return the response body untouched.
pub fn fetch_raw(transport: &dyn Transport, command: &str) -> SynthResult<String> {
    let request = Request::list_tools().to_line()?;
    transport.execute(command, &request)
}

/// Send `tools/list` and decode the catalogue.
pub fn fetch_catalogue(transport: &dyn Transport, command: &str) -> SynthResult<Catalogue> {
    let raw = fetch_raw(transport, command)?;
    let catalogue = Catalogue::from_response(&raw)?;
    debug!(operations = catalogue.len(), "catalogue decoded");
    Ok(catalogue)
}
