//! depver - dependency metadata extraction for Go modules
//!
//! This crate parses `go.mod` files and flattens the module identity,
//! minimum Go version, deprecation notice and required dependencies into a
//! fixed JSON record for dependency-analysis tools.

pub mod config;
pub mod extractor;
pub mod modfile;

pub use extractor::{
    ExtractError, ManifestExtractor, ManifestRecord, SENTINEL, extract_dependencies,
};
