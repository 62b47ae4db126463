#![deny(missing_docs)]

//! # Contract Document
//!
//! Loads a Swagger 2.0 document (JSON or YAML) into an immutable, dereferenced
//! [`Specification`] tree. Only recursive references survive expansion.

use crate::error::{AssertError, AssertResult};
use crate::oas::refs::expand_refs;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use url::Url;

/// The loaded contract.
///
/// Never mutated after construction; every query reads the same tree, so a single
/// instance can be shared between threads behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    root: Value,
}

impl Specification {
    /// Builds a specification from an already-parsed document tree.
    ///
    /// Verifies the `swagger` version field and inlines local `$ref`s.
    pub fn from_value(raw: Value) -> AssertResult<Self> {
        validate_root(&raw)?;
        let root = expand_refs(&raw)?;
        let paths = root
            .get("paths")
            .and_then(Value::as_object)
            .map_or(0, |p| p.len());
        tracing::debug!(paths, "contract document loaded");
        Ok(Self { root })
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> AssertResult<Self> {
        let raw: Value = serde_json::from_str(content)
            .map_err(|e| AssertError::Load(format!("Failed to parse JSON document: {}", e)))?;
        Self::from_value(raw)
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(content: &str) -> AssertResult<Self> {
        let raw: Value = serde_yaml::from_str(content)
            .map_err(|e| AssertError::Load(format!("Failed to parse YAML document: {}", e)))?;
        Self::from_value(raw)
    }

    /// Reads a whole document from a stream. JSON is a subset of YAML, so the
    /// YAML parser accepts both.
    pub fn from_reader<R: Read>(mut reader: R) -> AssertResult<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_yaml_str(&content)
    }

    /// Loads a document from disk, choosing the parser from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> AssertResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AssertError::Load(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Loads a document from a URI or a local path.
    ///
    /// `http://` and `https://` documents are fetched (requires the `client`
    /// feature), `file://` URIs are read from disk, and anything else is taken as
    /// a filesystem path.
    pub fn from_uri(uri: &str) -> AssertResult<Self> {
        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::from_remote(&url),
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| AssertError::Load(format!("Invalid file URI: {}", uri)))?;
                Self::from_path(path)
            }
            _ => Self::from_path(uri),
        }
    }

    #[cfg(feature = "client")]
    fn from_remote(url: &Url) -> AssertResult<Self> {
        tracing::debug!(%url, "fetching contract document");
        let content = ureq::get(url.as_str())
            .call()
            .and_then(|mut res| res.body_mut().read_to_string())
            .map_err(|e| AssertError::Load(format!("Failed to fetch {}: {}", url, e)))?;

        if url.path().ends_with(".json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    #[cfg(not(feature = "client"))]
    fn from_remote(url: &Url) -> AssertResult<Self> {
        Err(AssertError::Load(format!(
            "Cannot fetch {}: built without the `client` feature",
            url
        )))
    }

    /// The whole expanded tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The expanded `definitions` object, when declared.
    pub fn definitions(&self) -> Option<&Value> {
        self.root.get("definitions").filter(|d| d.is_object())
    }

    /// The `basePath` prefix, with a lone or trailing `/` removed.
    pub fn base_path(&self) -> &str {
        self.root
            .get("basePath")
            .and_then(Value::as_str)
            .map(|p| p.trim_end_matches('/'))
            .unwrap_or("")
    }

    /// Declared path templates, in document order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|paths| paths.keys())
            .filter(|key| !key.starts_with("x-"))
            .map(String::as_str)
    }
}

fn validate_root(raw: &Value) -> AssertResult<()> {
    if !raw.is_object() {
        return Err(AssertError::Load("document root must be an object".into()));
    }

    match raw.get("swagger").and_then(Value::as_str) {
        Some(version) if version.starts_with("2.") => Ok(()),
        Some(version) => Err(AssertError::Load(format!(
            "Unsupported Swagger version: {}. Only 2.0 is supported.",
            version
        ))),
        None => Err(AssertError::Load(
            "Invalid document: missing 'swagger' version field.".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"
swagger: "2.0"
basePath: /api/
paths:
  /pets:
    get: {}
  x-internal: {}
  /food:
    get: {}
"#;

    #[test]
    fn test_from_yaml_keeps_declaration_order() {
        let spec = Specification::from_yaml_str(DOC).unwrap();
        assert_eq!(spec.paths().collect::<Vec<_>>(), vec!["/pets", "/food"]);
        assert_eq!(spec.base_path(), "/api");
    }

    #[test]
    fn test_missing_base_path_is_empty() {
        let spec = Specification::from_json_str(r#"{"swagger":"2.0","paths":{}}"#).unwrap();
        assert_eq!(spec.base_path(), "");
        assert_eq!(spec.paths().count(), 0);
    }

    #[test]
    fn test_rejects_openapi_3() {
        let err = Specification::from_json_str(r#"{"openapi":"3.0.0","paths":{}}"#).unwrap_err();
        assert!(err.to_string().contains("missing 'swagger'"));

        let err = Specification::from_json_str(r#"{"swagger":"1.2"}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported Swagger version"));
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = Specification::from_json_str("{").unwrap_err();
        assert!(matches!(err, AssertError::Load(_)));
    }

    #[test]
    fn test_from_path_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("docs.json");
        std::fs::write(&json_path, r#"{"swagger":"2.0","paths":{"/a":{}}}"#).unwrap();
        assert_eq!(
            Specification::from_path(&json_path).unwrap().paths().count(),
            1
        );

        let yaml_path = dir.path().join("docs.yaml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        assert_eq!(
            Specification::from_path(&yaml_path).unwrap().paths().count(),
            2
        );
    }

    #[test]
    fn test_from_uri_local_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.yaml");
        std::fs::write(&path, DOC).unwrap();

        let plain = Specification::from_uri(path.to_str().unwrap()).unwrap();
        assert_eq!(plain.paths().count(), 2);

        let file_uri = Url::from_file_path(&path).unwrap();
        let from_file = Specification::from_uri(file_uri.as_str()).unwrap();
        assert_eq!(from_file, plain);
    }

    #[test]
    fn test_from_uri_missing_local_document() {
        let err = Specification::from_uri("file:///nonexistent/docs.json").unwrap_err();
        assert!(matches!(err, AssertError::Load(_)));
        assert!(Specification::from_uri("missing/docs.json").is_err());
    }

    #[test]
    fn test_recursive_definitions_load() {
        let spec = Specification::from_json_str(
            r##"{"swagger":"2.0","paths":{},"definitions":{"Category":{"properties":
                {"children":{"type":"array","items":{"$ref":"#/definitions/Category"}}}}}}"##,
        )
        .unwrap();
        assert!(spec.definitions().unwrap().get("Category").is_some());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Specification::from_path("/nonexistent/docs.json").unwrap_err();
        assert!(matches!(err, AssertError::Load(_)));
    }
}
