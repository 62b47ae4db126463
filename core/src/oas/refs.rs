#![deny(missing_docs)]

//! # Reference Expansion
//!
//! Inlines local `$ref` targets (`#/definitions/...`, `#/parameters/...`,
//! `#/responses/...`) so the loaded document is a plain tree.
//!
//! A reference that would re-enter a target already being expanded is left in
//! place; recursive models keep one `$ref` per cycle, resolved against the
//! document's `definitions` at validation time. External documents are never
//! fetched: a reference without a local fragment is a load error.

use crate::error::{AssertError, AssertResult};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Returns a copy of `root` with every local `$ref` replaced by its target.
pub(crate) fn expand_refs(root: &Value) -> AssertResult<Value> {
    let mut stack = Vec::new();
    expand_node(root, root, &mut stack)
}

fn expand_node(node: &Value, root: &Value, stack: &mut Vec<String>) -> AssertResult<Value> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                return expand_reference(reference, root, stack);
            }
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), expand_node(value, root, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| expand_node(item, root, stack))
            .collect::<AssertResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn expand_reference(reference: &str, root: &Value, stack: &mut Vec<String>) -> AssertResult<Value> {
    let fragment = reference.strip_prefix('#').ok_or_else(|| {
        AssertError::Load(format!("external reference is not supported: {}", reference))
    })?;

    if stack.iter().any(|seen| seen == reference) {
        tracing::trace!(reference, depth = stack.len(), "keeping recursive reference");
        let mut kept = Map::new();
        kept.insert("$ref".into(), Value::String(reference.to_string()));
        return Ok(Value::Object(kept));
    }

    let target = lookup(root, fragment)
        .ok_or_else(|| AssertError::Load(format!("unresolved reference: {}", reference)))?;

    stack.push(reference.to_string());
    let expanded = expand_node(target, root, stack);
    stack.pop();
    expanded
}

fn lookup<'a>(root: &'a Value, fragment: &str) -> Option<&'a Value> {
    if fragment.is_empty() {
        return Some(root);
    }
    let pointer = fragment.strip_prefix('/')?;
    pointer
        .split('/')
        .map(decode_pointer_segment)
        .try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// True when `node` still holds a `$ref` anywhere below it.
pub(crate) fn contains_ref(node: &Value) -> bool {
    match node {
        Value::Object(map) => map.contains_key("$ref") || map.values().any(contains_ref),
        Value::Array(items) => items.iter().any(contains_ref),
        _ => false,
    }
}

/// Decodes a JSON Pointer segment taken from a `$ref` (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Escapes a single key for use as one JSON Pointer segment.
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
