#![deny(missing_docs)]

//! # Assertions
//!
//! The public façade: checks whole requests and responses, or single parts of
//! them, against a [`Contract`].
//!
//! `assert_request` runs, in order and stopping at the first failure:
//! headers, media type (only when a body is present), query, body.
//! `assert_response` runs headers, media type (only when a body is present), body.
//! An empty payload is treated as no body.
//!
//! Both take the message by `&mut` because the body is read through a
//! [`ScopedCapture`]: once the call returns, successful or not, the message holds
//! a replayable in-memory body with exactly the bytes originally sent.

use crate::capture::ScopedCapture;
use crate::error::{AssertError, AssertResult, AssertionFailure};
use crate::http::{HeaderMap, Request, RequestTarget, Response};
use crate::oas::contract::Contract;
use crate::oas::document::Specification;
use crate::oas::extractor::ContractExtractor;
use crate::oas::models::BodyDefinition;
use crate::validator::{Input, SchemaValidator, Subject};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::io::Read;
use std::sync::Arc;

/// Checks HTTP exchanges against a contract.
///
/// Holds no per-call state; a single instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct Assertions<C = ContractExtractor> {
    contract: C,
    validator: SchemaValidator,
}

impl Assertions<ContractExtractor> {
    /// Builds the engine over a loaded document.
    pub fn from_specification(spec: impl Into<Arc<Specification>>) -> Self {
        Self::new(ContractExtractor::new(spec))
    }
}

impl<C: Contract> Assertions<C> {
    /// Builds the engine over any contract source.
    pub fn new(contract: C) -> Self {
        Self {
            contract,
            validator: SchemaValidator,
        }
    }

    /// The contract the engine reads from.
    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Asserts that `media_type` is one of the request media types of the operation.
    pub fn request_media_type(&self, media_type: &str, path: &str, method: &str) -> AssertResult<()> {
        let allowed = self.contract.request_media_types(path, method)?;
        check_media_type(media_type, allowed)
    }

    /// Asserts that `media_type` is one of the response media types of the operation.
    pub fn response_media_type(&self, media_type: &str, path: &str, method: &str) -> AssertResult<()> {
        let allowed = self.contract.response_media_types(path, method)?;
        check_media_type(media_type, allowed)
    }

    /// Asserts that every required request header is present.
    pub fn request_headers(&self, headers: &HeaderMap, path: &str, method: &str) -> AssertResult<()> {
        let declared = self.contract.request_headers(path, method)?;
        self.validator.check(
            Subject::RequestHeader,
            &declared.to_schema(),
            Input::Value(&headers.to_value()),
        )
    }

    /// Asserts that every declared response header is present.
    pub fn response_headers(
        &self,
        headers: &HeaderMap,
        path: &str,
        method: &str,
        status: u16,
    ) -> AssertResult<()> {
        let declared = self.contract.response_headers(path, method, status)?;
        self.validator.check(
            Subject::ResponseHeader,
            &declared.to_schema(),
            Input::Value(&headers.to_value()),
        )
    }

    /// Asserts that every required query parameter is present.
    ///
    /// Names are compared lower-cased, like the declared names.
    pub fn request_query(
        &self,
        query: &IndexMap<String, Vec<String>>,
        path: &str,
        method: &str,
    ) -> AssertResult<()> {
        let declared = self.contract.request_query(path, method)?;
        self.validator.check(
            Subject::RequestQuery,
            &declared.to_schema(),
            Input::Value(&query_value(query)),
        )
    }

    /// Reads `body` to the end and validates it against the declared request body.
    ///
    /// Fails with `BodyNotFound` when the operation declares none.
    pub fn request_body<R: Read>(&self, body: R, path: &str, method: &str) -> AssertResult<()> {
        let definition = self.contract.request_body(path, method)?;
        self.read_and_check(Subject::RequestBody, &definition, body)
    }

    /// Reads `body` to the end and validates it against the declared response body.
    ///
    /// Fails with `BodyNotFound` when the response declares no schema.
    pub fn response_body<R: Read>(
        &self,
        body: R,
        path: &str,
        method: &str,
        status: u16,
    ) -> AssertResult<()> {
        let definition = self.contract.response_body(path, method, status)?;
        self.read_and_check(Subject::ResponseBody, &definition, body)
    }

    /// Asserts a whole request, restoring its body afterwards.
    pub fn assert_request(&self, req: &mut Request) -> AssertResult<()> {
        let target = RequestTarget::parse(&req.uri)?;
        let path = target.path.as_str();
        let method = req.method.as_str();
        tracing::debug!(path, method, "asserting request");

        let mut capture = ScopedCapture::new(&mut req.body);

        self.request_headers(&req.headers, path, method)?;

        if has_payload(Subject::RequestBody, &mut capture)? {
            let content_type = req.headers.get("content-type").unwrap_or("");
            self.request_media_type(content_type, path, method)?;
        }

        self.request_query(&target.query, path, method)?;

        match self.contract.request_body(path, method) {
            Ok(definition) => self.check_captured(Subject::RequestBody, &definition, &mut capture),
            Err(AssertError::BodyNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Asserts a whole response, restoring its body afterwards.
    pub fn assert_response(&self, res: &mut Response) -> AssertResult<()> {
        let target = RequestTarget::parse(&res.uri)?;
        let path = target.path.as_str();
        let method = res.method.as_str();
        let status = res.status;
        tracing::debug!(path, method, status, "asserting response");

        let mut capture = ScopedCapture::new(&mut res.body);

        self.response_headers(&res.headers, path, method, status)?;

        if has_payload(Subject::ResponseBody, &mut capture)? {
            let content_type = res.headers.get("content-type").unwrap_or("");
            self.response_media_type(content_type, path, method)?;
        }

        match self.contract.response_body(path, method, status) {
            Ok(definition) => self.check_captured(Subject::ResponseBody, &definition, &mut capture),
            Err(AssertError::BodyNotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn read_and_check<R: Read>(
        &self,
        subject: Subject,
        definition: &BodyDefinition,
        mut body: R,
    ) -> AssertResult<()> {
        let mut data = Vec::new();
        body.read_to_end(&mut data)
            .map_err(|e| AssertError::ValidationUnavailable {
                subject,
                cause: Box::new(e),
            })?;
        self.validator
            .check(subject, &definition.schema, Input::Bytes(&data))
    }

    fn check_captured(
        &self,
        subject: Subject,
        definition: &BodyDefinition,
        capture: &mut ScopedCapture<'_>,
    ) -> AssertResult<()> {
        let data = read_captured(subject, capture)?;
        if data.is_empty() {
            if !definition.required {
                return Ok(());
            }
            return Err(AssertionFailure {
                subject,
                value: String::new(),
                violations: vec!["body is required".into()],
            }
            .into());
        }

        self.validator
            .check(subject, &definition.schema, Input::Bytes(data))
    }
}

/// Zero-length payloads count as no body at all.
fn has_payload(subject: Subject, capture: &mut ScopedCapture<'_>) -> AssertResult<bool> {
    if !capture.is_present() {
        return Ok(false);
    }
    Ok(!read_captured(subject, capture)?.is_empty())
}

fn read_captured<'c>(subject: Subject, capture: &'c mut ScopedCapture<'_>) -> AssertResult<&'c [u8]> {
    capture
        .read_all()
        .map_err(|e| AssertError::ValidationUnavailable {
            subject,
            cause: Box::new(e),
        })
}

fn check_media_type(media_type: &str, allowed: Vec<String>) -> AssertResult<()> {
    if allowed.is_empty() {
        return Ok(());
    }

    let received = essence(media_type);
    let accepted = allowed.iter().any(|candidate| {
        let candidate = essence(candidate);
        match candidate.split_once('/') {
            Some(("*", "*")) => true,
            Some((kind, "*")) => received.split_once('/').is_some_and(|(k, _)| k == kind),
            _ => candidate == received,
        }
    });

    if accepted {
        Ok(())
    } else {
        Err(AssertError::MediaTypeNotAllowed {
            media_type: media_type.to_string(),
            allowed,
        })
    }
}

/// `type/subtype`, lower-cased, without parameters.
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn query_value(query: &IndexMap<String, Vec<String>>) -> Value {
    let mut map = Map::new();
    for (name, values) in query {
        let entry = map
            .entry(name.to_lowercase())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.extend(values.iter().cloned().map(Value::String));
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::{Descriptor, ParameterLocation, ParameterSet};
    use serde_json::json;

    /// A contract that answers every query the same way.
    struct FixedContract {
        media_types: Vec<String>,
        required_header: Option<&'static str>,
        body: Option<BodyDefinition>,
    }

    impl FixedContract {
        fn headers(&self) -> ParameterSet {
            ParameterSet::from_descriptors(self.required_header.map(|name| Descriptor {
                name: name.into(),
                location: ParameterLocation::Header,
                schema_type: Some("string".into()),
                description: None,
                required: true,
            }))
        }

        fn body(&self) -> AssertResult<BodyDefinition> {
            self.body.clone().ok_or_else(|| AssertError::BodyNotFound {
                path: "/x".into(),
                method: "post".into(),
            })
        }
    }

    impl Contract for FixedContract {
        fn request_media_types(&self, _: &str, _: &str) -> AssertResult<Vec<String>> {
            Ok(self.media_types.clone())
        }
        fn response_media_types(&self, _: &str, _: &str) -> AssertResult<Vec<String>> {
            Ok(self.media_types.clone())
        }
        fn request_headers(&self, _: &str, _: &str) -> AssertResult<ParameterSet> {
            Ok(self.headers())
        }
        fn response_headers(&self, _: &str, _: &str, _: u16) -> AssertResult<ParameterSet> {
            Ok(self.headers())
        }
        fn request_query(&self, _: &str, _: &str) -> AssertResult<ParameterSet> {
            Ok(ParameterSet::default())
        }
        fn request_body(&self, _: &str, _: &str) -> AssertResult<BodyDefinition> {
            self.body()
        }
        fn response_body(&self, _: &str, _: &str, _: u16) -> AssertResult<BodyDefinition> {
            self.body()
        }
    }

    fn object_body(required: bool) -> Option<BodyDefinition> {
        Some(BodyDefinition {
            name: Some("payload".into()),
            required,
            schema: json!({ "type": "object", "required": ["id"] }),
        })
    }

    fn engine(body: Option<BodyDefinition>) -> Assertions<FixedContract> {
        Assertions::new(FixedContract {
            media_types: vec!["application/json".into()],
            required_header: None,
            body,
        })
    }

    #[test]
    fn test_media_type_essence_and_wildcards() {
        let allowed = || vec!["application/json".to_string(), "image/*".to_string()];
        assert!(check_media_type("application/json; charset=utf-8", allowed()).is_ok());
        assert!(check_media_type("Application/JSON", allowed()).is_ok());
        assert!(check_media_type("image/png", allowed()).is_ok());
        assert!(check_media_type("text/html", allowed()).is_err());
        assert!(check_media_type("text/html", vec!["*/*".into()]).is_ok());
        assert!(check_media_type("", Vec::new()).is_ok());
    }

    #[test]
    fn test_query_value_groups_lowercased_names() {
        let mut query = IndexMap::new();
        query.insert("Limit".to_string(), vec!["1".to_string()]);
        query.insert("limit".to_string(), vec!["2".to_string()]);
        assert_eq!(query_value(&query), json!({ "limit": ["1", "2"] }));
    }

    #[test]
    fn test_bodyless_request_skips_media_type() {
        let mut req = Request::new("POST", "/x").with_header("Content-Type", "text/html");
        assert!(engine(object_body(false)).assert_request(&mut req).is_ok());
        assert!(req.body.is_none());
    }

    #[test]
    fn test_missing_required_body() {
        let mut req = Request::new("POST", "/x");
        let err = engine(object_body(true)).assert_request(&mut req).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed asserting that '' is a valid request body (body is required)"
        );
    }

    #[test]
    fn test_empty_body_is_treated_as_absent() {
        let mut optional = Request::new("POST", "/x").with_body("");
        assert!(engine(object_body(false)).assert_request(&mut optional).is_ok());
        assert_eq!(optional.body.as_ref().unwrap().buffered(), Some(&b""[..]));

        let mut required = Request::new("POST", "/x").with_body(crate::http::Body::from_reader(
            std::io::Cursor::new(Vec::new()),
        ));
        let err = engine(object_body(true)).assert_request(&mut required).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed asserting that '' is a valid request body (body is required)"
        );
    }

    #[test]
    fn test_empty_response_body_skips_media_type() {
        let mut res = Response::new("GET", "/x", 200)
            .with_header("Content-Type", "text/html")
            .with_body("");
        assert!(engine(object_body(false)).assert_response(&mut res).is_ok());
    }

    #[test]
    fn test_undeclared_body_is_not_asserted() {
        let mut req = Request::new("POST", "/x")
            .with_header("Content-Type", "application/json")
            .with_body("not even json");
        assert!(engine(None).assert_request(&mut req).is_ok());
        assert_eq!(req.body.as_ref().unwrap().buffered(), Some(&b"not even json"[..]));
    }

    #[test]
    fn test_header_failure_still_restores_body() {
        let mut engine = engine(object_body(true));
        engine.contract.required_header = Some("x-token");

        let mut req = Request::new("POST", "/x")
            .with_header("Content-Type", "application/json")
            .with_body(crate::http::Body::from_reader(std::io::Cursor::new(
                b"{\"id\":1}".to_vec(),
            )));
        let err = engine.assert_request(&mut req).unwrap_err();
        assert!(matches!(err, AssertError::Failure(_)));
        assert_eq!(req.body.as_ref().unwrap().buffered(), Some(&b"{\"id\":1}"[..]));
    }

    #[test]
    fn test_lower_level_body_reports_body_not_found() {
        let err = engine(None)
            .request_body(&b"{}"[..], "/x", "POST")
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[test]
    fn test_response_body_violation() {
        let mut res = Response::new("GET", "/x", 200)
            .with_header("Content-Type", "application/json")
            .with_body("[]");
        let err = engine(object_body(true)).assert_response(&mut res).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed asserting that '[]' is a valid response body ("));
        assert_eq!(res.body.as_ref().unwrap().buffered(), Some(&b"[]"[..]));
    }
}
