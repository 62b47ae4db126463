#![deny(missing_docs)]

//! # Contract Document Module
//!
//! - **document**: Loading and root validation.
//! - **refs**: Local `$ref` expansion.
//! - **pointer**: JSON Pointer navigation over the loaded tree.
//! - **matcher**: URI template matching of request paths.
//! - **models**: Typed records decoded from the tree.
//! - **contract**: The query interface the assertion engine consumes.
//! - **extractor**: The document-backed implementation of that interface.

pub mod contract;
pub mod document;
pub mod extractor;
pub mod matcher;
pub mod models;
pub mod pointer;
pub(crate) mod refs;

pub use contract::Contract;
pub use document::Specification;
pub use extractor::{ContractExtractor, ResolvedResponse};
pub use matcher::{PathMatch, PathMatcher};
pub use models::{
    BodyDefinition, Descriptor, MediaKind, ParameterLocation, ParameterSet, ShimHeader,
    ShimParameter, ShimResponse,
};
pub use pointer::NodeResolver;
