use thiserror::Error;

use crate::domain::{Protocol, ResourceType};

/// Failures while dereferencing a schema document
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unresolvable reference: {0}")]
    UnresolvableRef(String),

    #[error("Circular reference: {0}")]
    CircularRef(String),

    #[error("Schema nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("No schema branch for '{0}'")]
    BranchNotFound(String),

    #[error("Schema has no properties")]
    MissingProperties,
}

/// Recoverable form failures. None of these are fatal; callers render them inline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormError {
    #[error("Failed to load schema: {0}")]
    SchemaFetch(String),

    #[error("Invalid schema: {0}")]
    SchemaInvalid(String),

    #[error("Options for {protocol} {resource_type} are still loading")]
    ReferenceResolutionPending {
        protocol: Protocol,
        resource_type: ResourceType,
    },

    #[error("Failed to list {resource_type}: {message}")]
    ReferenceFetch {
        resource_type: String,
        message: String,
    },

    #[error("Form is read-only")]
    ReadOnly,

    #[error("Invalid edit at '{path}': {reason}")]
    InvalidEdit { path: String, reason: String },
}

impl From<SchemaError> for FormError {
    fn from(err: SchemaError) -> Self {
        FormError::SchemaInvalid(err.to_string())
    }
}
