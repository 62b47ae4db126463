#![deny(missing_docs)]

//! # Path Matching
//!
//! Resolves a literal request URI to the templated path key declared in the
//! document (e.g. `/api/pets/1` -> `/pets/{id}`).
//!
//! Each declared path is prefixed with the document `basePath` and compiled, once,
//! from an RFC 6570 template into an anchored regular expression. Supported
//! expressions are the simple form `{var}` (one path segment) and the reserved
//! form `{+var}` (may span segments).

use crate::error::{AssertError, AssertResult};
use crate::oas::document::Specification;
use crate::oas::refs::escape_pointer_segment;
use indexmap::IndexMap;
use regex::Regex;

/// A successful match of a literal URI against a declared path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// The path key exactly as declared under `paths`.
    pub template: String,
    /// The same key escaped for use as one JSON Pointer segment.
    pub key: String,
    /// Template variables captured from the URI, in template order.
    pub params: IndexMap<String, String>,
}

#[derive(Debug)]
struct CompiledPath {
    template: String,
    pattern: Result<CompiledTemplate, String>,
}

#[derive(Debug)]
struct CompiledTemplate {
    regex: Regex,
    vars: Vec<String>,
}

/// Matches literal URIs against the declared paths, in declaration order.
#[derive(Debug)]
pub struct PathMatcher {
    paths: Vec<CompiledPath>,
}

impl PathMatcher {
    /// Compiles every declared path of `spec`.
    ///
    /// A template that fails to compile is kept as a failed candidate: it never
    /// matches, and its error is attached to `NoMatch` when nothing else matches.
    pub fn new(spec: &Specification) -> Self {
        let base = spec.base_path();
        let paths = spec
            .paths()
            .map(|template| CompiledPath {
                template: template.to_string(),
                pattern: compile_template(&format!("{}{}", base, template)),
            })
            .collect();
        Self { paths }
    }

    /// Returns the pointer-escaped key of the first declared path matching `uri`.
    pub fn resolve(&self, uri: &str) -> AssertResult<String> {
        self.resolve_match(uri).map(|m| m.key)
    }

    /// Returns the first declared path matching `uri`, with its captured variables.
    pub fn resolve_match(&self, uri: &str) -> AssertResult<PathMatch> {
        let path = strip_query(uri);
        let mut template_error = None;

        for candidate in &self.paths {
            let compiled = match &candidate.pattern {
                Ok(compiled) => compiled,
                Err(e) => {
                    tracing::trace!(template = %candidate.template, error = %e, "skipping broken template");
                    template_error.get_or_insert_with(|| e.clone());
                    continue;
                }
            };

            if let Some(captures) = compiled.regex.captures(path) {
                let params = compiled
                    .vars
                    .iter()
                    .zip(captures.iter().skip(1))
                    .map(|(name, value)| {
                        (
                            name.clone(),
                            value.map(|m| m.as_str().to_string()).unwrap_or_default(),
                        )
                    })
                    .collect();
                tracing::debug!(uri, template = %candidate.template, "resource uri matched");
                return Ok(PathMatch {
                    template: candidate.template.clone(),
                    key: escape_pointer_segment(&candidate.template),
                    params,
                });
            }
        }

        Err(AssertError::NoMatch {
            uri: uri.to_string(),
            cause: template_error,
        })
    }
}

fn strip_query(uri: &str) -> &str {
    uri.split(['?', '#']).next().unwrap_or(uri)
}

fn compile_template(template: &str) -> Result<CompiledTemplate, String> {
    let mut pattern = String::from("^");
    let mut vars = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let open = rest.find('{');
        let close = rest.find('}');

        match (open, close) {
            (None, None) => {
                pattern.push_str(&regex::escape(rest));
                break;
            }
            (Some(o), Some(c)) if o < c => {
                pattern.push_str(&regex::escape(&rest[..o]));
                let expression = &rest[o + 1..c];
                if expression.contains('{') {
                    return Err(format!("unbalanced '{{' in {}", template));
                }
                let (name, class) = match expression.strip_prefix('+') {
                    Some(name) => (name, "[^?#]*"),
                    None => (expression, "[^/?#]+"),
                };
                validate_var_name(name, template)?;
                vars.push(name.to_string());
                pattern.push('(');
                pattern.push_str(class);
                pattern.push(')');
                rest = &rest[c + 1..];
            }
            (Some(_), None) => return Err(format!("unbalanced '{{' in {}", template)),
            _ => return Err(format!("unbalanced '}}' in {}", template)),
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).map_err(|e| e.to_string())?;
    Ok(CompiledTemplate { regex, vars })
}

fn validate_var_name(name: &str, template: &str) -> Result<(), String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '%' | '-'));
    if valid {
        Ok(())
    } else {
        Err(format!("invalid template variable '{}' in {}", name, template))
    }
}
