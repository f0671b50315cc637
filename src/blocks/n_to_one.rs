//! Many-to-one accumulation block

use super::CombineOp;
use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, validate_dtype};
use crate::error::{Error, Result};

/// Folds inputs `0..n` into output `0` with one [`CombineOp`]
///
/// Rows are combined in port order: `((in0 op in1) op in2) ...`.
#[derive(Debug)]
pub struct NToOneBlock {
    base: ArrayBlock,
    op: CombineOp,
    nchans: usize,
}

impl NToOneBlock {
    /// Create a block on `device` with `nchans >= 2` inputs of `dtype`
    pub fn new(
        device: &str,
        op: impl Into<CombineOp>,
        dtype: impl Into<BufferDType>,
        nchans: usize,
    ) -> Result<Self> {
        let op = op.into();
        let input = dtype.into();
        validate_dtype(input.dtype(), op.support(), op.name())?;
        if nchans < 2 {
            return Err(Error::invalid_argument("nchans", "must be >= 2"));
        }
        let output = input.with_dtype(op.output_dtype(input.dtype()));

        let mut base = ArrayBlock::new(device, &[input.dtype(), output.dtype()])?;
        for chan in 0..nchans {
            base.setup_input(chan, input)?;
        }
        base.setup_output(0usize, output)?;
        Ok(Self { base, op, nchans })
    }

    /// The applied operation
    pub fn op(&self) -> CombineOp {
        self.op
    }

    /// Number of inputs
    pub fn channels(&self) -> usize {
        self.nchans
    }
}

impl ArrayBlockNode for NToOneBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        if self.base.work_info().min_elements == 0 {
            return Ok(());
        }
        let stacked = self.base.input_arrays_2d()?;
        let output = self.op.reduce_rows(&stacked)?;
        self.base.post_array(0usize, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AUTO_DEVICE;
    use crate::dtype::DType;
    use crate::error::ErrorKind;
    use crate::ops::{BinaryOp, LogicalOp};

    #[test]
    fn test_requires_two_channels() {
        let err = NToOneBlock::new(AUTO_DEVICE, BinaryOp::Add, DType::F32, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_port_layout() {
        let block = NToOneBlock::new(AUTO_DEVICE, LogicalOp::And, DType::U8, 3).unwrap();
        assert_eq!(block.array_block().ports().inputs().len(), 3);
        assert_eq!(block.array_block().ports().outputs()[0].dtype().dtype(), DType::I8);
    }
}
