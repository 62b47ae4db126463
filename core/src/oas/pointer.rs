#![deny(missing_docs)]

//! # Node Resolution
//!
//! Addresses sub-trees of the [`Specification`] with JSON Pointer semantics.
//! Segments are joined behind a leading empty segment, so `["paths", "~1pets"]`
//! becomes `/paths/~1pets`; `~1` decodes to `/` and `~0` to `~`.

use crate::error::{AssertError, AssertResult};
use crate::oas::document::Specification;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Read-only navigation over a [`Specification`].
#[derive(Debug, Clone, Copy)]
pub struct NodeResolver<'a> {
    spec: &'a Specification,
}

impl<'a> NodeResolver<'a> {
    /// Wraps a loaded specification.
    pub fn new(spec: &'a Specification) -> Self {
        Self { spec }
    }

    /// Returns the raw node at `segments`, without any type coercion.
    ///
    /// Segments must already be pointer-escaped.
    pub fn resolve(&self, segments: &[&str]) -> AssertResult<&'a Value> {
        let pointer = to_pointer(segments);
        self.spec
            .root()
            .pointer(&pointer)
            .ok_or(AssertError::NodeNotFound { pointer })
    }

    /// Like [`resolve`](Self::resolve), mapping `NodeNotFound` to `None`.
    pub fn find(&self, segments: &[&str]) -> Option<&'a Value> {
        self.resolve(segments).ok()
    }

    /// Resolves a node and converts it into a typed contract record.
    ///
    /// A shape mismatch means the document disagrees with the extractor and is
    /// reported as `MalformedNode` rather than silently skipped.
    pub fn decode<T: DeserializeOwned>(&self, segments: &[&str]) -> AssertResult<Option<T>> {
        let Some(node) = self.find(segments) else {
            return Ok(None);
        };
        T::deserialize(node)
            .map(Some)
            .map_err(|e| AssertError::MalformedNode {
                pointer: to_pointer(segments),
                reason: e.to_string(),
            })
    }
}

fn to_pointer(segments: &[&str]) -> String {
    std::iter::once("")
        .chain(segments.iter().copied())
        .collect::<Vec<_>>()
        .join("/")
}
