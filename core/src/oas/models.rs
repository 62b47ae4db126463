#![deny(missing_docs)]

//! # Contract Models
//!
//! Typed records decoded from the document tree. Every extractor query converts
//! raw nodes into these shapes in one place, instead of probing `Value`s ad hoc.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Where a parameter is carried in the HTTP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// HTTP header.
    Header,
    /// URL query string.
    Query,
    /// Templated path segment.
    Path,
    /// Form field (`application/x-www-form-urlencoded` or multipart).
    FormData,
    /// The request payload.
    Body,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterLocation::Header => "header",
            ParameterLocation::Query => "query",
            ParameterLocation::Path => "path",
            ParameterLocation::FormData => "formData",
            ParameterLocation::Body => "body",
        };
        f.write_str(s)
    }
}

/// A parameter as declared at path or operation level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShimParameter {
    /// Name of the parameter.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Primitive type for non-body parameters (e.g. string, integer).
    #[serde(rename = "type", default)]
    pub schema_type: Option<String>,
    /// A brief description of the parameter.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Body schema (`in: body` only).
    #[serde(default)]
    pub schema: Option<Value>,
}

/// A response as declared under `responses/{status}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShimResponse {
    /// A short description of the response.
    #[serde(default)]
    pub description: Option<String>,
    /// Body schema, absent for bodyless responses.
    #[serde(default)]
    pub schema: Option<Value>,
    /// Declared headers keyed by name.
    #[serde(default)]
    pub headers: IndexMap<String, ShimHeader>,
}

/// A response header declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShimHeader {
    /// Primitive type of the header value.
    #[serde(rename = "type", default)]
    pub schema_type: Option<String>,
    /// A brief description of the header.
    #[serde(default)]
    pub description: Option<String>,
}

/// One header or query field the exchange is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    /// Lower-cased field name.
    pub name: String,
    /// Where the field is carried.
    pub location: ParameterLocation,
    /// Declared primitive type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Declared description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the field must be present.
    pub required: bool,
}

/// Field descriptors keyed by lower-cased name, plus the ordered required names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    /// Descriptors in first-declaration order.
    pub fields: IndexMap<String, Descriptor>,
    /// Names that must be present; omitted from serialized output when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ParameterSet {
    /// Builds the set from descriptors in declaration order.
    ///
    /// A later descriptor with the same name replaces the earlier one entirely,
    /// including its required flag, while keeping the first position.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = Descriptor>) -> Self {
        let mut fields = IndexMap::new();
        for descriptor in descriptors {
            fields.insert(descriptor.name.clone(), descriptor);
        }
        let required = fields
            .values()
            .filter(|d| d.required)
            .map(|d| d.name.clone())
            .collect();
        Self { fields, required }
    }

    /// True when no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Synthesizes the JSON Schema the received field map is validated against.
    ///
    /// Received header and query values are raw strings, so only presence is
    /// enforced; the declared type is carried as documentation.
    pub fn to_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, d)| {
                let mut property = Map::new();
                if let Some(description) = &d.description {
                    property.insert("description".into(), Value::String(description.clone()));
                }
                (name.clone(), Value::Object(property))
            })
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        schema
    }
}

/// A declared request or response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyDefinition {
    /// Parameter name (request bodies only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether a body must be sent.
    pub required: bool,
    /// The JSON Schema of the payload.
    pub schema: Value,
}

/// Which side of the exchange a media type list applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// `consumes`.
    Request,
    /// `produces`.
    Response,
}

impl MediaKind {
    /// The document key holding the list.
    pub fn segment(self) -> &'static str {
        match self {
            MediaKind::Request => "consumes",
            MediaKind::Response => "produces",
        }
    }
}
