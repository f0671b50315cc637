//! Array kernels
//!
//! Every kernel takes arrays already resident on one device, checks that the
//! operands agree on backend, dtype and shape, and returns a new array on the
//! same device. Typed work goes through the `dispatch_*` macros; element loops
//! share the helpers in `kernel`.

mod cast;
mod complex;
mod elementwise;
mod fft;
mod kernel;
mod random;

pub use cast::{cast, cast_support};
pub use complex::{combine_complex, imag, real};
pub use elementwise::{
    BinaryOp, LogicalOp, UnaryOp, binary, logical, reduce_rows, reduce_rows_logical, unary,
};
pub use fft::{FftDirection, fft, irfft, irfft_len, rfft, rfft_len};
pub use random::{Distribution, EngineKind, RandomEngine};

use crate::array::GpuArray;
use crate::dtype::DType;
use crate::error::{Error, Result};

/// Operands must live on the same device
pub(crate) fn check_same_device(lhs: &GpuArray, rhs: &GpuArray) -> Result<()> {
    if lhs.backend() != rhs.backend() {
        return Err(Error::BackendMismatch {
            lhs: lhs.backend(),
            rhs: rhs.backend(),
        });
    }
    if lhs.device() != rhs.device() {
        return Err(Error::invalid_argument(
            "device",
            format!("operands on {} and {}", lhs.context(), rhs.context()),
        ));
    }
    Ok(())
}

/// Operands must share an element type
pub(crate) fn check_same_dtype(lhs: &GpuArray, rhs: &GpuArray) -> Result<DType> {
    if lhs.dtype() != rhs.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: lhs.dtype(),
            rhs: rhs.dtype(),
        });
    }
    Ok(lhs.dtype())
}

/// Operands must have identical dimensions
pub(crate) fn check_same_shape(lhs: &GpuArray, rhs: &GpuArray) -> Result<()> {
    if lhs.shape() != rhs.shape() {
        return Err(Error::shape_mismatch(lhs.shape(), rhs.shape()));
    }
    Ok(())
}

/// Row count and row width of a 2D array
pub(crate) fn matrix_dims(a: &GpuArray, op: &'static str) -> Result<(usize, usize)> {
    match a.shape().as_slice() {
        &[rows, cols] => Ok((rows, cols)),
        other => Err(Error::invalid_argument(
            "array",
            format!("{op} needs a 2D array, got shape {other:?}"),
        )),
    }
}
