#![deny(missing_docs)]

//! # Contract Extraction
//!
//! Turns a (path, method[, status]) triple into the rules an exchange is checked
//! against. All queries share two primitives: [`PathMatcher`] to find the declared
//! path, and [`NodeResolver`] to read nodes below it.
//!
//! Rules are rebuilt on every call; the extractor holds nothing but the immutable
//! document and its compiled path templates.

use crate::error::{AssertError, AssertResult};
use crate::oas::contract::Contract;
use crate::oas::document::Specification;
use crate::oas::matcher::{PathMatch, PathMatcher};
use crate::oas::models::{
    BodyDefinition, Descriptor, MediaKind, ParameterLocation, ParameterSet, ShimParameter,
    ShimResponse,
};
use crate::oas::pointer::NodeResolver;
use crate::oas::refs::contains_ref;
use std::sync::Arc;

/// Typed queries over a loaded [`Specification`].
#[derive(Debug, Clone)]
pub struct ContractExtractor {
    spec: Arc<Specification>,
    matcher: Arc<PathMatcher>,
}

/// A resolved response entry, with the status key it was found under.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResponse {
    /// `"200"`, `"404"`, ... or `"default"`.
    pub status_key: String,
    /// The decoded response.
    pub response: ShimResponse,
}

impl ContractExtractor {
    /// Compiles the path templates of `spec`.
    pub fn new(spec: impl Into<Arc<Specification>>) -> Self {
        let spec = spec.into();
        let matcher = Arc::new(PathMatcher::new(&spec));
        Self { spec, matcher }
    }

    /// The underlying document.
    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    /// Matches `path` against the declared templates.
    pub fn find_path(&self, path: &str) -> AssertResult<PathMatch> {
        self.matcher.resolve_match(path)
    }

    /// Makes `schema` self-contained: a schema still holding recursive `$ref`s
    /// gets the document's `definitions` attached so `#/definitions/...` resolves
    /// against the schema itself.
    pub fn bundle_schema(&self, mut schema: serde_json::Value) -> serde_json::Value {
        if !contains_ref(&schema) {
            return schema;
        }
        if let (Some(map), Some(definitions)) = (schema.as_object_mut(), self.spec.definitions()) {
            map.entry("definitions")
                .or_insert_with(|| definitions.clone());
        }
        schema
    }

    /// Reads a raw node of the document.
    pub fn find_node(&self, segments: &[&str]) -> AssertResult<&serde_json::Value> {
        self.resolver().resolve(segments)
    }

    fn resolver(&self) -> NodeResolver<'_> {
        NodeResolver::new(&self.spec)
    }

    /// Operation-level media types, falling back to the document-level list.
    pub fn media_types(&self, path: &str, method: &str, kind: MediaKind) -> AssertResult<Vec<String>> {
        let key = self.matcher.resolve(path)?;
        let method = method.to_lowercase();
        let resolver = self.resolver();

        let types = resolver
            .decode::<Vec<String>>(&["paths", &key, &method, kind.segment()])?
            .unwrap_or_default();
        if !types.is_empty() {
            return Ok(types);
        }

        Ok(resolver
            .decode::<Vec<String>>(&[kind.segment()])?
            .unwrap_or_default())
    }

    /// Path-level parameters followed by operation-level parameters.
    ///
    /// Entries are appended, not merged: a name declared at both levels appears
    /// twice, the operation-level one last.
    pub fn request_parameters(&self, path: &str, method: &str) -> AssertResult<Vec<ShimParameter>> {
        let key = self.matcher.resolve(path)?;
        let method = method.to_lowercase();
        let resolver = self.resolver();

        let mut params = resolver
            .decode::<Vec<ShimParameter>>(&["paths", &key, "parameters"])?
            .unwrap_or_default();
        params.extend(
            resolver
                .decode::<Vec<ShimParameter>>(&["paths", &key, &method, "parameters"])?
                .unwrap_or_default(),
        );

        tracing::trace!(path, method = %method, count = params.len(), "request parameters collected");
        Ok(params)
    }

    fn parameter_set(
        &self,
        path: &str,
        method: &str,
        location: ParameterLocation,
    ) -> AssertResult<ParameterSet> {
        let params = self.request_parameters(path, method)?;
        Ok(ParameterSet::from_descriptors(
            params
                .into_iter()
                .filter(|p| p.location == location)
                .map(|p| Descriptor {
                    name: p.name.to_lowercase(),
                    location: p.location,
                    schema_type: p.schema_type,
                    description: p.description,
                    required: p.required,
                }),
        ))
    }

    /// The response declared for `status`, or the `default` response.
    pub fn response_for(&self, path: &str, method: &str, status: u16) -> AssertResult<ResolvedResponse> {
        let key = self.matcher.resolve(path)?;
        let method = method.to_lowercase();
        let resolver = self.resolver();

        for status_key in [status.to_string(), "default".to_string()] {
            if let Some(response) =
                resolver.decode::<ShimResponse>(&["paths", &key, &method, "responses", &status_key])?
            {
                return Ok(ResolvedResponse {
                    status_key,
                    response,
                });
            }
        }

        Err(AssertError::ResponseNotFound {
            path: path.to_string(),
            method,
            status,
        })
    }
}

impl Contract for ContractExtractor {
    fn request_media_types(&self, path: &str, method: &str) -> AssertResult<Vec<String>> {
        self.media_types(path, method, MediaKind::Request)
    }

    fn response_media_types(&self, path: &str, method: &str) -> AssertResult<Vec<String>> {
        self.media_types(path, method, MediaKind::Response)
    }

    fn request_headers(&self, path: &str, method: &str) -> AssertResult<ParameterSet> {
        self.parameter_set(path, method, ParameterLocation::Header)
    }

    /// Every declared response header is required; the format has no optional form.
    fn response_headers(&self, path: &str, method: &str, status: u16) -> AssertResult<ParameterSet> {
        let resolved = self.response_for(path, method, status)?;
        Ok(ParameterSet::from_descriptors(
            resolved
                .response
                .headers
                .into_iter()
                .map(|(name, header)| Descriptor {
                    name: name.to_lowercase(),
                    location: ParameterLocation::Header,
                    schema_type: header.schema_type,
                    description: header.description,
                    required: true,
                }),
        ))
    }

    fn request_query(&self, path: &str, method: &str) -> AssertResult<ParameterSet> {
        self.parameter_set(path, method, ParameterLocation::Query)
    }

    fn request_body(&self, path: &str, method: &str) -> AssertResult<BodyDefinition> {
        let params = self.request_parameters(path, method)?;
        params
            .into_iter()
            .find(|p| p.location == ParameterLocation::Body)
            .map(|p| BodyDefinition {
                name: Some(p.name),
                required: p.required,
                schema: self.bundle_schema(p.schema.unwrap_or_else(|| serde_json::json!({}))),
            })
            .ok_or_else(|| AssertError::BodyNotFound {
                path: path.to_string(),
                method: method.to_lowercase(),
            })
    }

    fn response_body(&self, path: &str, method: &str, status: u16) -> AssertResult<BodyDefinition> {
        let resolved = self.response_for(path, method, status)?;
        resolved
            .response
            .schema
            .map(|schema| BodyDefinition {
                name: None,
                required: true,
                schema: self.bundle_schema(schema),
            })
            .ok_or_else(|| AssertError::BodyNotFound {
                path: path.to_string(),
                method: method.to_lowercase(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn extractor() -> ContractExtractor {
        let spec = Specification::from_value(json!({
            "swagger": "2.0",
            "basePath": "/api",
            "consumes": ["application/json"],
            "produces": ["application/json"],
            "paths": {
                "/items/{id}": {
                    "parameters": [
                        { "name": "X-Trace", "in": "header", "type": "string", "required": true },
                        { "name": "id", "in": "path", "type": "integer", "required": true }
                    ],
                    "get": {
                        "produces": ["application/xml", "application/json"],
                        "parameters": [
                            { "name": "X-Trace", "in": "header", "type": "string" },
                            { "name": "Fields", "in": "query", "type": "string", "required": true }
                        ],
                        "responses": {
                            "200": {
                                "description": "ok",
                                "headers": { "ETag": { "type": "string" } },
                                "schema": { "type": "object" }
                            },
                            "default": { "description": "error" }
                        }
                    },
                    "put": {
                        "parameters": [
                            { "name": "item", "in": "body", "required": true, "schema": { "type": "object" } }
                        ],
                        "responses": { "204": { "description": "done" } }
                    }
                }
            }
        }))
        .unwrap();
        ContractExtractor::new(spec)
    }

    #[test]
    fn test_media_types_fallback() {
        let ex = extractor();
        assert_eq!(
            ex.response_media_types("/api/items/1", "GET").unwrap(),
            vec!["application/xml", "application/json"]
        );
        assert_eq!(
            ex.request_media_types("/api/items/1", "GET").unwrap(),
            vec!["application/json"]
        );
        // Undeclared method on a declared path still gets the global list.
        assert_eq!(
            ex.request_media_types("/api/items/1", "DELETE").unwrap(),
            vec!["application/json"]
        );
    }

    #[test]
    fn test_request_parameters_appends_method_level_last() {
        let params = extractor().request_parameters("/api/items/1", "get").unwrap();
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["X-Trace", "id", "X-Trace", "Fields"]);
    }

    #[test]
    fn test_request_headers_method_level_overrides() {
        let headers = extractor().request_headers("/api/items/1", "GET").unwrap();
        assert_eq!(headers.fields.keys().collect::<Vec<_>>(), vec!["x-trace"]);
        assert!(headers.required.is_empty());

        let headers = extractor().request_headers("/api/items/1", "PUT").unwrap();
        assert_eq!(headers.required, vec!["x-trace"]);
    }

    #[test]
    fn test_request_query_lowercases_names() {
        let query = extractor().request_query("/api/items/1", "GET").unwrap();
        assert_eq!(query.required, vec!["fields"]);
        assert_eq!(
            query.fields["fields"].location,
            ParameterLocation::Query
        );
    }

    #[test]
    fn test_response_for_default_fallback() {
        let ex = extractor();
        assert_eq!(ex.response_for("/api/items/1", "GET", 200).unwrap().status_key, "200");
        assert_eq!(
            ex.response_for("/api/items/1", "GET", 500).unwrap().status_key,
            "default"
        );
        let err = ex.response_for("/api/items/1", "PUT", 500).unwrap_err();
        assert!(matches!(err, AssertError::ResponseNotFound { status: 500, .. }));
    }

    #[test]
    fn test_recursive_body_schema_carries_definitions() {
        let spec = Specification::from_value(json!({
            "swagger": "2.0",
            "definitions": {
                "Category": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/definitions/Category" } }
                    }
                },
                "Flat": { "type": "string" }
            },
            "paths": {
                "/categories": {
                    "post": {
                        "parameters": [
                            { "name": "c", "in": "body", "schema": { "$ref": "#/definitions/Category" } }
                        ],
                        "responses": { "200": { "description": "ok", "schema": { "$ref": "#/definitions/Flat" } } }
                    }
                }
            }
        }))
        .unwrap();
        let ex = ContractExtractor::new(spec);

        let body = ex.request_body("/categories", "POST").unwrap();
        assert_eq!(
            body.schema.pointer("/properties/children/items"),
            Some(&json!({ "$ref": "#/definitions/Category" }))
        );
        assert!(body.schema.pointer("/definitions/Category").is_some());

        let flat = ex.response_body("/categories", "POST", 200).unwrap();
        assert_eq!(flat.schema, json!({ "type": "string" }));
    }

    #[test]
    fn test_response_headers_all_required() {
        let headers = extractor().response_headers("/api/items/1", "GET", 200).unwrap();
        assert_eq!(headers.required, vec!["etag"]);
        let none = extractor().response_headers("/api/items/1", "GET", 404).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_bodies() {
        let ex = extractor();
        let body = ex.request_body("/api/items/1", "PUT").unwrap();
        assert_eq!(body.name.as_deref(), Some("item"));
        assert!(body.required);

        assert!(matches!(
            ex.request_body("/api/items/1", "GET").unwrap_err(),
            AssertError::BodyNotFound { .. }
        ));
        assert_eq!(
            ex.response_body("/api/items/1", "GET", 200).unwrap().schema,
            json!({ "type": "object" })
        );
        assert!(matches!(
            ex.response_body("/api/items/1", "PUT", 204).unwrap_err(),
            AssertError::BodyNotFound { .. }
        ));
    }

    #[test]
    fn test_unknown_path_is_no_match_everywhere() {
        let ex = extractor();
        let no_match = |e: AssertError| matches!(e, AssertError::NoMatch { .. });
        assert!(no_match(ex.request_media_types("/some", "GET").unwrap_err()));
        assert!(no_match(ex.response_media_types("/some", "GET").unwrap_err()));
        assert!(no_match(ex.request_headers("/some", "GET").unwrap_err()));
        assert!(no_match(ex.response_headers("/some", "GET", 200).unwrap_err()));
        assert!(no_match(ex.request_query("/some", "GET").unwrap_err()));
        assert!(no_match(ex.request_body("/some", "GET").unwrap_err()));
        assert!(no_match(ex.response_body("/some", "GET", 200).unwrap_err()));
    }

    #[test]
    fn test_malformed_parameters_are_reported() {
        let spec = Specification::from_value(json!({
            "swagger": "2.0",
            "paths": { "/x": { "parameters": { "not": "a list" } } }
        }))
        .unwrap();
        let err = ContractExtractor::new(spec)
            .request_parameters("/x", "get")
            .unwrap_err();
        assert!(matches!(err, AssertError::MalformedNode { .. }));
    }
}
