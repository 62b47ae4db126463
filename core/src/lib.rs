#![deny(missing_docs)]

//! # Contract Assert Core
//!
//! Validates concrete HTTP requests and responses against a Swagger 2.0 contract.
//!
//! ```no_run
//! use contract_assert_core::{Assertions, Request, Specification};
//!
//! let spec = Specification::from_path("docs.json")?;
//! let assertions = Assertions::from_specification(spec);
//!
//! let mut req = Request::new("GET", "/api/pets?limit=10");
//! assertions.assert_request(&mut req)?;
//! # Ok::<(), contract_assert_core::AssertError>(())
//! ```

/// Shared error types.
pub mod error;

/// Contract loading, navigation and rule extraction.
pub mod oas;

/// JSON Schema validation of received values.
pub mod validator;

/// Framework-neutral request and response records.
pub mod http;

/// Non-destructive body reading.
pub mod capture;

/// The assertion engine.
pub mod assertions;

pub use assertions::Assertions;
pub use capture::ScopedCapture;
pub use error::{AssertError, AssertResult, AssertionFailure, ErrorKind};
pub use http::{Body, HeaderMap, Request, RequestTarget, Response};
pub use oas::{
    BodyDefinition, Contract, ContractExtractor, Descriptor, MediaKind, NodeResolver,
    ParameterLocation, ParameterSet, PathMatch, PathMatcher, Specification,
};
pub use validator::{Input, Outcome, SchemaValidator, Subject};
