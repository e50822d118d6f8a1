//! Catalog loading errors.
//!
//! Every variant carries enough context (file path, offending code) to
//! locate the problem in the YAML source.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog file could not be read.
    #[error("failed to read catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing failed.
    #[error("failed to parse catalog YAML ({origin}): {source}")]
    YamlParse {
        origin: String,
        source: serde_yaml::Error,
    },

    /// Two entries share a code.
    #[error("duplicate {kind} code {code}")]
    DuplicateCode { kind: &'static str, code: String },

    /// An entry references a compliance type the catalog does not define.
    #[error("{context} references unknown compliance type {code}")]
    UnknownComplianceType { context: String, code: String },

    /// A workflow schema is malformed.
    #[error("invalid workflow schema for {code}: {reason}")]
    InvalidWorkflow { code: String, reason: String },

    /// A due-date descriptor cannot describe a real calendar date.
    #[error("invalid due-date rule for {code}: {reason}")]
    InvalidDueDate { code: String, reason: String },
}

/// Convenience alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
