//! Unary elementwise block

use super::{check_channels, process_channels};
use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, validate_dtype};
use crate::error::Result;
use crate::ops::{self, UnaryOp};

/// Applies one [`UnaryOp`] to each of `nchans` independent streams
#[derive(Debug)]
pub struct OneToOneBlock {
    base: ArrayBlock,
    op: UnaryOp,
    nchans: usize,
}

impl OneToOneBlock {
    /// Create a block on `device` reading `dtype` samples
    ///
    /// The output type is `op.output_dtype(dtype)` with the same dimension.
    pub fn new(
        device: &str,
        op: UnaryOp,
        dtype: impl Into<BufferDType>,
        nchans: usize,
    ) -> Result<Self> {
        let input = dtype.into();
        validate_dtype(input.dtype(), op.support(), op.name())?;
        check_channels(nchans)?;
        let output = input.with_dtype(op.output_dtype(input.dtype()));

        let mut base = ArrayBlock::new(device, &[input.dtype(), output.dtype()])?;
        for chan in 0..nchans {
            base.setup_input(chan, input)?;
            base.setup_output(chan, output)?;
        }
        Ok(Self { base, op, nchans })
    }

    /// The applied operation
    pub fn op(&self) -> UnaryOp {
        self.op
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.nchans
    }
}

impl ArrayBlockNode for OneToOneBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let op = self.op;
        process_channels(&mut self.base, self.nchans, |a| ops::unary(op, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AUTO_DEVICE;
    use crate::dtype::DType;
    use crate::error::Error;
    use crate::flow::{Block, BufferChunk, PortId};

    #[test]
    fn test_rejects_unsupported_dtype() {
        let err = OneToOneBlock::new(AUTO_DEVICE, UnaryOp::Sqrt, DType::I32, 1).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDType { .. }));
        assert!(OneToOneBlock::new(AUTO_DEVICE, UnaryOp::Abs, DType::F32, 0).is_err());
    }

    #[test]
    fn test_single_channel() {
        let mut block = OneToOneBlock::new(AUTO_DEVICE, UnaryOp::Negate, DType::I16, 1).unwrap();
        block.activate().unwrap();
        block
            .ports_mut()
            .input_mut(&PortId::Index(0))
            .unwrap()
            .push_buffer(BufferChunk::from_slice(&[1i16, -2, 3]))
            .unwrap();
        block.work().unwrap();

        let chunk = block
            .ports_mut()
            .output_mut(&PortId::Index(0))
            .unwrap()
            .pop_buffer()
            .unwrap();
        assert_eq!(chunk.to_vec::<i16>().unwrap(), vec![-1, 2, -3]);
        assert_eq!(block.ports().inputs()[0].elements(), 0);
    }

    #[test]
    fn test_complex_abs_outputs_float() {
        let block =
            OneToOneBlock::new(AUTO_DEVICE, UnaryOp::Abs, DType::Complex64, 1).unwrap();
        assert_eq!(block.ports().outputs()[0].dtype().dtype(), DType::F32);
    }
}
