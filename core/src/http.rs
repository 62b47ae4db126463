#![deny(missing_docs)]

//! # HTTP Exchange Model
//!
//! Framework-neutral request and response records handed to the assertion
//! engine. Adapters convert their native types into these and back.

use crate::error::{AssertError, AssertResult};
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Cursor, Read};
use url::Url;

/// Case-insensitive, multi-valued header map that keeps arrival order.
///
/// Names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderMap {
    entries: IndexMap<String, Vec<String>>,
}

impl HeaderMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `name`.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_lowercase(), vec![value.into()]);
    }

    /// Adds a value to `name`, keeping earlier ones.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(name.as_ref().to_lowercase())
            .or_default()
            .push(value.into());
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of `name`.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates `(name, values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no header is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A JSON object mapping each name to its values joined by `", "`.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.join(", "))))
                .collect::<Map<_, _>>(),
        )
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for HeaderMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, OneOrMany>::deserialize(deserializer)?;
        let mut map = HeaderMap::new();
        for (name, values) in raw {
            match values {
                OneOrMany::One(value) => map.append(&name, value),
                OneOrMany::Many(values) => {
                    for value in values {
                        map.append(&name, value);
                    }
                }
            }
        }
        Ok(map)
    }
}

enum BodyInner {
    Buffered(Cursor<Vec<u8>>),
    Stream(Box<dyn Read + Send>),
}

/// A message payload: a single-consumption stream, or an in-memory buffer.
pub struct Body {
    inner: BodyInner,
}

impl Body {
    /// A replayable body over `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: BodyInner::Buffered(Cursor::new(bytes.into())),
        }
    }

    /// A body that can be read once.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            inner: BodyInner::Stream(Box::new(reader)),
        }
    }

    /// The full buffer, when the body is held in memory.
    pub fn buffered(&self) -> Option<&[u8]> {
        match &self.inner {
            BodyInner::Buffered(cursor) => Some(cursor.get_ref().as_slice()),
            BodyInner::Stream(_) => None,
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            BodyInner::Buffered(cursor) => cursor.read(buf),
            BodyInner::Stream(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            BodyInner::Buffered(cursor) => f
                .debug_struct("Body")
                .field("buffered", &cursor.get_ref().len())
                .finish(),
            BodyInner::Stream(_) => f.debug_struct("Body").field("stream", &true).finish(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::from_bytes(bytes)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::from_bytes(text.as_bytes())
    }
}

/// An inbound request.
#[derive(Debug)]
pub struct Request {
    /// HTTP method, any case.
    pub method: String,
    /// Request target: origin-form (`/api/pets?limit=1`) or absolute URI.
    pub uri: String,
    /// Received headers.
    pub headers: HeaderMap,
    /// Payload; `None` when the request carries no body.
    pub body: Option<Body>,
}

impl Request {
    /// A bodyless request without headers.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adds a header value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the payload.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The `Content-Type` header, or `""`.
    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }
}

/// An outbound response, with the method and target of the request it answers.
#[derive(Debug)]
pub struct Response {
    /// Method of the originating request.
    pub method: String,
    /// Target of the originating request.
    pub uri: String,
    /// Status code.
    pub status: u16,
    /// Sent headers.
    pub headers: HeaderMap,
    /// Payload; `None` when the response carries no body.
    pub body: Option<Body>,
}

impl Response {
    /// A bodyless response to `method uri`.
    pub fn new(method: impl Into<String>, uri: impl Into<String>, status: u16) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adds a header value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the payload.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The `Content-Type` header, or `""`.
    pub fn content_type(&self) -> &str {
        self.headers.get("content-type").unwrap_or("")
    }
}

/// A request target split into path and decoded query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Percent-encoded path.
    pub path: String,
    /// Query values grouped by name, in arrival order.
    pub query: IndexMap<String, Vec<String>>,
}

impl RequestTarget {
    /// Parses an origin-form or absolute request target.
    pub fn parse(uri: &str) -> AssertResult<Self> {
        let invalid = |reason: String| AssertError::InvalidUri {
            uri: uri.to_string(),
            reason,
        };
        let base = Url::parse("http://localhost/").map_err(|e| invalid(e.to_string()))?;
        let url = Url::options()
            .base_url(Some(&base))
            .parse(uri)
            .map_err(|e| invalid(e.to_string()))?;

        let mut query: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, value) in url.query_pairs() {
            query
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        Ok(Self {
            path: url.path().to_string(),
            query,
        })
    }
}
