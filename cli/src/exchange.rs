#![deny(missing_docs)]

//! # Recorded Exchanges
//!
//! On-disk format of a captured request/response pair (JSON or YAML):
//!
//! ```yaml
//! request:
//!   method: POST
//!   uri: /api/pets
//!   headers: { Content-Type: application/json }
//!   body: { id: 1, name: doggo }
//! response:
//!   status: 200
//!   headers: { Content-Type: application/json }
//!   body: { id: 1, name: doggo }
//! ```
//!
//! A string `body` is sent verbatim; any other value is sent as compact JSON.

use crate::error::{CliError, CliResult};
use contract_assert_core::{Body, HeaderMap, Request, Response};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A request and, optionally, the response it received.
#[derive(Debug, Clone, Deserialize)]
pub struct Exchange {
    /// The recorded request.
    pub request: RecordedRequest,
    /// The recorded response, if any.
    #[serde(default)]
    pub response: Option<RecordedResponse>,
}

/// A recorded request.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request target.
    pub uri: String,
    /// Sent headers.
    #[serde(default)]
    pub headers: HeaderMap,
    /// Sent payload.
    #[serde(default)]
    pub body: Option<Value>,
}

/// A recorded response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedResponse {
    /// Status code.
    pub status: u16,
    /// Sent headers.
    #[serde(default)]
    pub headers: HeaderMap,
    /// Sent payload.
    #[serde(default)]
    pub body: Option<Value>,
}

impl Exchange {
    /// Reads an exchange file; `.json` uses the JSON parser, anything else YAML.
    pub fn from_path(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                CliError::General(format!("Failed to parse {:?}: {}", path, e))
            }),
            _ => serde_yaml::from_str(&content).map_err(|e| {
                CliError::General(format!("Failed to parse {:?}: {}", path, e))
            }),
        }
    }

    /// The request as handed to the assertion engine.
    pub fn to_request(&self) -> Request {
        Request {
            method: self.request.method.clone(),
            uri: self.request.uri.clone(),
            headers: self.request.headers.clone(),
            body: self.request.body.as_ref().map(to_body),
        }
    }

    /// The response as handed to the assertion engine.
    pub fn to_response(&self) -> Option<Response> {
        self.response.as_ref().map(|res| Response {
            method: self.request.method.clone(),
            uri: self.request.uri.clone(),
            status: res.status,
            headers: res.headers.clone(),
            body: res.body.as_ref().map(to_body),
        })
    }
}

fn to_body(value: &Value) -> Body {
    match value {
        Value::String(text) => Body::from_bytes(text.as_bytes()),
        other => Body::from_bytes(other.to_string()),
    }
}
