#![deny(missing_docs)]

//! # Error Handling
//!
//! Provides the unified `AssertError` enum used across the workspace.
//!
//! Every variant carries the structured context of the failed lookup or check
//! (path, method, status, subject) so callers can branch on the kind of failure
//! instead of matching on message text. The rendered messages are complete
//! sentences, suitable for direct display (e.g. as the body of a 400 response).

use crate::validator::Subject;
use derive_more::{Display, From};

/// Boxed cause attached to errors raised by third-party parsers and validators.
pub type Cause = Box<dyn std::error::Error + Send + Sync>;

/// The Global Error Enum.
#[derive(Debug, Display, From)]
pub enum AssertError {
    /// No declared path template matches the literal request URI.
    #[display("resource uri does not match: {uri}{}", cause_suffix(cause))]
    NoMatch {
        /// The literal URI that was looked up.
        uri: String,
        /// Template compilation failure observed during the scan, if any.
        cause: Option<String>,
    },

    /// The JSON pointer does not address any node of the document.
    #[display("node does not exist: {pointer}")]
    NodeNotFound {
        /// The pointer that was followed.
        pointer: String,
    },

    /// Neither the explicit status code nor `default` is declared.
    #[display("response does not exist: {method} {path} {status}")]
    ResponseNotFound {
        /// Matched path template.
        path: String,
        /// Lower-cased HTTP method.
        method: String,
        /// Requested status code.
        status: u16,
    },

    /// The operation or response declares no body schema.
    #[display("body does not exist: {method} {path}")]
    BodyNotFound {
        /// Matched path template.
        path: String,
        /// Lower-cased HTTP method.
        method: String,
    },

    /// A node exists but does not have the shape the extractor expects.
    #[display("malformed contract node at {pointer}: {reason}")]
    MalformedNode {
        /// The pointer of the offending node.
        pointer: String,
        /// Deserialization failure.
        reason: String,
    },

    /// The validator could not run at all (unparsable input or schema).
    #[display("unable to validate {subject}: {cause}")]
    ValidationUnavailable {
        /// What was being validated.
        subject: Subject,
        /// The underlying failure.
        cause: Cause,
    },

    /// The validator ran and reported violations.
    #[from]
    #[display("{_0}")]
    Failure(AssertionFailure),

    /// The received media type is not one of the declared ones.
    #[display(
        "failed asserting that '{media_type}' is an allowed media type ({})",
        allowed.join(", ")
    )]
    MediaTypeNotAllowed {
        /// The received Content-Type value.
        media_type: String,
        /// The declared media types.
        allowed: Vec<String>,
    },

    /// The request URI could not be parsed.
    #[display("invalid request uri '{uri}': {reason}")]
    InvalidUri {
        /// The raw URI.
        uri: String,
        /// Parser failure.
        reason: String,
    },

    /// The contract document could not be loaded or expanded.
    #[display("unable to load the document: {_0}")]
    Load(String),

    /// Wrapper for standard IO errors.
    #[from]
    #[display("IO Error: {_0}")]
    Io(std::io::Error),
}

fn cause_suffix(cause: &Option<String>) -> String {
    cause
        .as_ref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl std::error::Error for AssertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssertError::ValidationUnavailable { cause, .. } => Some(cause.as_ref()),
            AssertError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Coarse classification of [`AssertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path, method, status or body has no contract entry.
    Resolution,
    /// The validator could not run.
    Unavailable,
    /// The validator ran and the exchange violates the contract.
    Assertion,
    /// The contract document or the caller's input is unusable.
    Input,
}

impl AssertError {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssertError::NoMatch { .. }
            | AssertError::NodeNotFound { .. }
            | AssertError::ResponseNotFound { .. }
            | AssertError::BodyNotFound { .. } => ErrorKind::Resolution,
            AssertError::ValidationUnavailable { .. } => ErrorKind::Unavailable,
            AssertError::Failure(_) | AssertError::MediaTypeNotAllowed { .. } => {
                ErrorKind::Assertion
            }
            AssertError::MalformedNode { .. }
            | AssertError::InvalidUri { .. }
            | AssertError::Load(_)
            | AssertError::Io(_) => ErrorKind::Input,
        }
    }

    /// True when the contract has no entry for the requested lookup.
    pub fn is_resolution(&self) -> bool {
        self.kind() == ErrorKind::Resolution
    }
}

/// A validator run that found one or more violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    /// What was validated.
    pub subject: Subject,
    /// The offending value as received (bodies) or serialized (headers, query).
    pub value: String,
    /// One description per failed constraint, in validator order.
    pub violations: Vec<String>,
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed asserting that '{}' is a valid {} ({})",
            self.value,
            self.subject,
            self.violations.join(", ")
        )
    }
}

/// Helper type alias for Result using AssertError.
pub type AssertResult<T> = Result<T, AssertError>;
