//! Layered error definitions
//!
//! Categorized by source: call / backend / merge / config

use thiserror::Error;

use crate::ValueType;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Call Errors =====
    /// Caller cancelled the logical call (or its deadline elapsed)
    #[error("request cancelled")]
    Cancelled,

    /// Every backend of a fan-out call failed
    #[error("unable to fetch from downstream servers: {source}")]
    AllBackendsFailed {
        #[source]
        source: Box<ContractError>,
    },

    // ===== Backend Errors =====
    /// A single backend call failed
    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fixture snapshot could not be loaded
    #[error("failed to load fixture '{path}': {message}")]
    FixtureLoad { path: String, message: String },

    // ===== Merge Errors =====
    /// Two partial results cannot be merged because their shapes differ
    #[error("cannot merge {left} result with {right} result")]
    ShapeMismatch { left: ValueType, right: ValueType },

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

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap the last observed backend error after a total failure
    pub fn all_backends_failed(last: ContractError) -> Self {
        Self::AllBackendsFailed {
            source: Box::new(last),
        }
    }

    /// Create fixture load error
    pub fn fixture_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FixtureLoad {
            path: path.into(),
            message: message.into(),
        }
    }

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

    /// True for the caller-cancellation error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
