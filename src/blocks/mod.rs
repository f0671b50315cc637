//! GPU blocks
//!
//! Each block embeds an [`ArrayBlock`](crate::bridge::ArrayBlock), validates
//! its element types before binding a device, and implements
//! [`ArrayBlockNode`](crate::bridge::ArrayBlockNode) so the host can drive it
//! through [`Block`](crate::flow::Block).
//!
//! | Block | Inputs | Outputs |
//! |-------|--------|---------|
//! | [`OneToOneBlock`] | `0..nchans` | `0..nchans` |
//! | [`CastBlock`] | `0..nchans` | `0..nchans` |
//! | [`TwoToOneBlock`] | `0`, `1` | `0` |
//! | [`NToOneBlock`] | `0..n` | `0` |
//! | [`CombineComplexBlock`] | `"re"`, `"im"` | `0` |
//! | [`SplitComplexBlock`] | `0` | `"re"`, `"im"` |
//! | [`FftBlock`], [`RfftBlock`] | `0` | `0` |
//! | [`RandomSourceBlock`] | none | `0` |

mod cast;
mod complex;
mod fft;
mod n_to_one;
mod one_to_one;
mod random;
mod two_to_one;

pub use cast::CastBlock;
pub use complex::{CombineComplexBlock, SplitComplexBlock};
pub use fft::{FftBlock, RfftBlock};
pub use n_to_one::NToOneBlock;
pub use one_to_one::OneToOneBlock;
pub use random::{DEFAULT_ELEMENTS_PER_WORK, RandomSourceBlock};
pub use two_to_one::TwoToOneBlock;

use crate::array::GpuArray;
use crate::bridge::ArrayBlock;
use crate::dtype::{DType, DTypeSupport};
use crate::error::{Error, Result};
use crate::flow::PortId;
use crate::ops::{self, BinaryOp, LogicalOp};
use std::fmt;

/// Operation combining two streams into one
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CombineOp {
    /// Arithmetic, output type equals input type
    Arithmetic(BinaryOp),
    /// Logical, output type is int8
    Logical(LogicalOp),
}

impl CombineOp {
    /// Operation name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arithmetic(op) => op.name(),
            Self::Logical(op) => op.name(),
        }
    }

    /// Types the operation accepts
    pub const fn support(self) -> DTypeSupport {
        match self {
            Self::Arithmetic(op) => op.support(),
            Self::Logical(op) => op.support(),
        }
    }

    /// Element type produced for `input`
    pub const fn output_dtype(self, input: DType) -> DType {
        match self {
            Self::Arithmetic(_) => input,
            Self::Logical(_) => LogicalOp::OUTPUT_DTYPE,
        }
    }

    fn apply(self, lhs: &GpuArray, rhs: &GpuArray) -> Result<GpuArray> {
        match self {
            Self::Arithmetic(op) => ops::binary(op, lhs, rhs),
            Self::Logical(op) => ops::logical(op, lhs, rhs),
        }
    }

    fn reduce_rows(self, a: &GpuArray) -> Result<GpuArray> {
        match self {
            Self::Arithmetic(op) => ops::reduce_rows(op, a),
            Self::Logical(op) => ops::reduce_rows_logical(op, a),
        }
    }
}

impl From<BinaryOp> for CombineOp {
    fn from(op: BinaryOp) -> Self {
        Self::Arithmetic(op)
    }
}

impl From<LogicalOp> for CombineOp {
    fn from(op: LogicalOp) -> Self {
        Self::Logical(op)
    }
}

impl fmt::Display for CombineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_channels(nchans: usize) -> Result<()> {
    if nchans == 0 {
        return Err(Error::invalid_argument("nchans", "at least one channel is required"));
    }
    Ok(())
}

/// Run `f` over every channel of a `0..nchans` in/out block
///
/// A single channel goes through one array; several channels are stacked into
/// a 2D array, transformed together and scattered back one row per output.
fn process_channels<F>(base: &mut ArrayBlock, nchans: usize, f: F) -> Result<()>
where
    F: Fn(&GpuArray) -> Result<GpuArray>,
{
    let elements = base.work_info().min_elements;
    if elements == 0 {
        return Ok(());
    }

    if nchans == 1 {
        let output = f(&base.input_array(0usize, true)?)?;
        base.ports_mut()
            .input_mut(&PortId::Index(0))?
            .consume(elements)?;
        return base.post_array(0usize, &output);
    }

    let stacked = base.input_arrays_2d()?;
    base.post_rows_to_outputs(&f(&stacked)?)
}
