//! Error types for gpuflow

use crate::dtype::DType;
use crate::runtime::Backend;
use thiserror::Error;

/// Result type alias using gpuflow's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error category reported to the host framework
///
/// Every [`Error`] variant folds into one of these. None of them are retried:
/// invalid arguments are rejected before any runtime state changes, state
/// errors require the host to deactivate the block first, and internal errors
/// are defects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input: unsupported type, unknown device or port, shape/dtype mismatch
    InvalidArgument,
    /// Operation not allowed in the block's current state
    State,
    /// Broken internal invariant
    Internal,
}

/// Errors that can occur in gpuflow operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported type {dtype} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// Type name with no native array counterpart
    #[error("gpuflow blocks do not support this type: {0}")]
    UnsupportedTypeName(String),

    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs} vs {rhs}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Operands live on different backends
    #[error("Backend mismatch: {lhs} vs {rhs}")]
    BackendMismatch {
        /// Left-hand side backend
        lhs: Backend,
        /// Right-hand side backend
        rhs: Backend,
    },

    /// No port with this id on the block
    #[error("Unknown port '{0}'")]
    UnknownPort(String),

    /// Operation not permitted in the current state
    #[error("{0}")]
    State(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a state error
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State(reason.into())
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::State(_) => ErrorKind::State,
            Self::Internal(_) => ErrorKind::Internal,
            Self::InvalidArgument { .. }
            | Self::UnsupportedDType { .. }
            | Self::UnsupportedTypeName(_)
            | Self::ShapeMismatch { .. }
            | Self::DTypeMismatch { .. }
            | Self::BackendMismatch { .. }
            | Self::UnknownPort(_) => ErrorKind::InvalidArgument,
        }
    }
}
