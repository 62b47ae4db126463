#![deny(missing_docs)]

//! # Contract Trait
//!
//! The queries the assertion engine needs from a contract source.

use crate::error::AssertResult;
use crate::oas::models::{BodyDefinition, ParameterSet};

/// A source of per-operation validation rules.
///
/// `path` is the literal request path (it is matched against the declared
/// templates), `method` is case-insensitive.
pub trait Contract {
    /// Media types a request body may be sent as.
    fn request_media_types(&self, path: &str, method: &str) -> AssertResult<Vec<String>>;

    /// Media types a response body may be sent as.
    fn response_media_types(&self, path: &str, method: &str) -> AssertResult<Vec<String>>;

    /// Declared request headers.
    fn request_headers(&self, path: &str, method: &str) -> AssertResult<ParameterSet>;

    /// Declared response headers for `status` (falling back to `default`).
    fn response_headers(&self, path: &str, method: &str, status: u16)
        -> AssertResult<ParameterSet>;

    /// Declared query parameters.
    fn request_query(&self, path: &str, method: &str) -> AssertResult<ParameterSet>;

    /// The declared request body, or `BodyNotFound`.
    fn request_body(&self, path: &str, method: &str) -> AssertResult<BodyDefinition>;

    /// The declared response body for `status` (falling back to `default`), or `BodyNotFound`.
    fn response_body(&self, path: &str, method: &str, status: u16)
        -> AssertResult<BodyDefinition>;
}
