#![deny(missing_docs)]

//! # Schema Validation
//!
//! Runs a contract schema fragment over a received value and normalizes the
//! outcome. Structured values (header and query maps) and raw payloads converge
//! on the same validator, so every subject reports violations the same way.

use crate::error::{AssertError, AssertResult, AssertionFailure};
use serde_json::Value;
use std::fmt;

/// What part of the exchange is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Request headers.
    RequestHeader,
    /// Response headers.
    ResponseHeader,
    /// Request query string.
    RequestQuery,
    /// Request payload.
    RequestBody,
    /// Response payload.
    ResponseBody,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Subject::RequestHeader => "request header",
            Subject::ResponseHeader => "response header",
            Subject::RequestQuery => "request query",
            Subject::RequestBody => "request body",
            Subject::ResponseBody => "response body",
        };
        f.write_str(s)
    }
}

/// The value handed to the validator.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// An in-memory structure (header or query map).
    Value(&'a Value),
    /// A raw JSON payload, parsed before validation.
    Bytes(&'a [u8]),
}

impl Input<'_> {
    /// The text shown in failure messages: bodies verbatim, structures compact-serialized.
    pub fn display(&self) -> String {
        match self {
            Input::Value(value) => value.to_string(),
            Input::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Violations found by one validator run, in validator order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// One description per failed constraint.
    pub violations: Vec<String>,
}

impl Outcome {
    /// True when no constraint failed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Validates values against schema fragments of the contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates `input` against `schema`.
    ///
    /// Fails with `ValidationUnavailable` when the schema does not compile or the
    /// payload is not JSON; violations are returned, not raised.
    pub fn validate(&self, subject: Subject, schema: &Value, input: Input<'_>) -> AssertResult<Outcome> {
        let parsed;
        let instance = match input {
            Input::Value(value) => value,
            Input::Bytes(bytes) => {
                parsed = serde_json::from_slice::<Value>(bytes).map_err(|e| {
                    AssertError::ValidationUnavailable {
                        subject,
                        cause: Box::new(e),
                    }
                })?;
                &parsed
            }
        };

        let validator = jsonschema::draft4::new(schema).map_err(|e| {
            AssertError::ValidationUnavailable {
                subject,
                cause: e.to_string().into(),
            }
        })?;

        let violations = validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        Ok(Outcome { violations })
    }

    /// Validates and turns violations into an `AssertionFailure`.
    pub fn check(&self, subject: Subject, schema: &Value, input: Input<'_>) -> AssertResult<()> {
        let outcome = self.validate(subject, schema, input)?;
        if outcome.is_valid() {
            return Ok(());
        }

        tracing::debug!(%subject, violations = outcome.violations.len(), "schema violations found");
        Err(AssertionFailure {
            subject,
            value: input.display(),
            violations: outcome.violations,
        }
        .into())
    }
}
