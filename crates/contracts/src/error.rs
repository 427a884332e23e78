//! Layered error definitions
//!
//! Categorized by source: config / hierarchy / store

use thiserror::Error;

use crate::ParamType;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Hierarchy Errors =====
    /// Node handle or id not known to the host
    #[error("unknown node: {node}")]
    UnknownNode { node: String },

    /// Edge handle or id not known to the host
    #[error("unknown edge: {edge}")]
    UnknownEdge { edge: String },

    /// Node exists but carries no parameter store
    #[error("node '{node}' has no parameter store")]
    NoStore { node: String },

    // ===== Store Errors =====
    /// Write through a setter whose type disagrees with the stored type
    #[error("type mismatch for param '{name}': stored as {stored}, written as {written}")]
    TypeMismatch {
        name: String,
        stored: ParamType,
        written: ParamType,
    },

    /// Write with `RequireExisting` on an absent param
    #[error("param '{name}' does not exist")]
    MissingParam { name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_node(node: impl ToString) -> Self {
        Self::UnknownNode {
            node: node.to_string(),
        }
    }

    pub fn unknown_edge(edge: impl ToString) -> Self {
        Self::UnknownEdge {
            edge: edge.to_string(),
        }
    }

    pub fn no_store(node: impl Into<String>) -> Self {
        Self::NoStore { node: node.into() }
    }

    /// Create store type mismatch error
    pub fn type_mismatch(name: impl Into<String>, stored: ParamType, written: ParamType) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            stored,
            written,
        }
    }

    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    /// Per-write store rejection; recoverable by skipping the write
    pub fn is_store_rejection(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::MissingParam { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = ContractError::type_mismatch("health", ParamType::Float, ParamType::Int);
        assert_eq!(
            err.to_string(),
            "type mismatch for param 'health': stored as float, written as int"
        );
        assert!(err.is_store_rejection());
    }

    #[test]
    fn test_config_errors_are_not_store_rejections() {
        let err = ContractError::config_validation("nodes[id=a]", "duplicate node id");
        assert!(!err.is_store_rejection());
        assert!(err.to_string().contains("duplicate node id"));
    }
}
