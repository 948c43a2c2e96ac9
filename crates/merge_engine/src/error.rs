//! Merge error types

use contracts::{ContractError, ValueType};
use thiserror::Error;

/// Merge-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Inputs have incompatible result shapes
    #[error("cannot merge {left} result with {right} result")]
    ShapeMismatch { left: ValueType, right: ValueType },
}

impl From<MergeError> for ContractError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::ShapeMismatch { left, right } => ContractError::ShapeMismatch { left, right },
        }
    }
}
