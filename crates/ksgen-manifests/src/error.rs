//! Error types for manifest compilation
//!
//! Every error aborts the run. Variants carry the principal, kind, or path
//! they were raised for so the message points at the offending input.

use std::path::PathBuf;

use thiserror::Error;

use crate::cluster::ClusterType;

/// Default context value when no specific principal is known
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for manifest compilation
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid admins spec content
    #[error("validation error for {principal}: {message}")]
    Validation {
        /// Name of the principal with invalid configuration
        principal: String,
        /// Description of what's invalid
        message: String,
    },

    /// A role referenced by a principal is missing from the role library
    #[error("no such role with the name '{name}' defined")]
    RoleNotFound {
        /// Bare role name as written in the admins spec
        name: String,
        /// Cluster type the role was looked up for
        cluster_type: ClusterType,
    },

    /// Object lacks the identity fields needed to store it
    #[error("invalid {kind} object: {message}")]
    InvalidObject {
        /// Resource kind of the object
        kind: String,
        /// What is missing or malformed
        message: String,
    },

    /// A document declared a kind other than the one expected at that place
    #[error("ambiguous kind '{found}' in {source_name}: expected {expected}")]
    AmbiguousKind {
        /// Kind found in the document (empty when absent)
        found: String,
        /// Kind that was expected
        expected: String,
        /// Where the document came from (file name, catalog name)
        source_name: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// File writer failure
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// Path being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a validation error without principal context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            principal: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
        }
    }

    /// Create a validation error for a named principal
    pub fn validation_for(principal: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            principal: principal.into(),
            message: msg.into(),
        }
    }

    /// Create a role lookup error
    pub fn role_not_found(name: impl Into<String>, cluster_type: ClusterType) -> Self {
        Self::RoleNotFound {
            name: name.into(),
            cluster_type,
        }
    }

    /// Create an invalid object error
    pub fn invalid_object(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidObject {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create an ambiguous kind error
    pub fn ambiguous_kind(
        found: impl Into<String>,
        expected: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        Self::AmbiguousKind {
            found: found.into(),
            expected: expected.into(),
            source_name: source_name.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an I/O error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
