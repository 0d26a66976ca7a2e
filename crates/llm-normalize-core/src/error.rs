//! Error types for schema definitions.
//!
//! Normalization itself never fails; these errors describe a malformed
//! `SchemaSpec` or `SynonymTable`, which is a programming mistake caught once
//! when the spec is built or loaded.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate field at {path}")]
    DuplicateField { path: String },

    #[error("Invalid bounds at {path}: {message}")]
    InvalidBounds { path: String, message: String },

    #[error("Invalid default at {path}: {message}")]
    InvalidDefault { path: String, message: String },

    #[error("Primary field '{field}' is not a declared top-level text field")]
    InvalidPrimaryField { field: String },

    #[error("Synonym table error: {0}")]
    SynonymTable(String),
}
