//! Binary elementwise block

use super::CombineOp;
use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, validate_dtype};
use crate::error::Result;
use crate::flow::PortId;

/// Combines inputs `0` and `1` element by element into output `0`
///
/// Each cycle handles the overlap of the two front chunks.
#[derive(Debug)]
pub struct TwoToOneBlock {
    base: ArrayBlock,
    op: CombineOp,
}

impl TwoToOneBlock {
    /// Create a block on `device` for `dtype` operands
    pub fn new(
        device: &str,
        op: impl Into<CombineOp>,
        dtype: impl Into<BufferDType>,
    ) -> Result<Self> {
        let op = op.into();
        let input = dtype.into();
        validate_dtype(input.dtype(), op.support(), op.name())?;
        let output = input.with_dtype(op.output_dtype(input.dtype()));

        let mut base = ArrayBlock::new(device, &[input.dtype(), output.dtype()])?;
        base.setup_input(0usize, input)?;
        base.setup_input(1usize, input)?;
        base.setup_output(0usize, output)?;
        Ok(Self { base, op })
    }

    /// The applied operation
    pub fn op(&self) -> CombineOp {
        self.op
    }
}

impl ArrayBlockNode for TwoToOneBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let elements = self.base.work_info().min_elements;
        if elements == 0 {
            return Ok(());
        }

        let lhs = self.base.input_array(0usize, true)?;
        let rhs = self.base.input_array(1usize, true)?;
        let output = self.op.apply(&lhs, &rhs)?;

        for port in 0..2 {
            self.base
                .ports_mut()
                .input_mut(&PortId::Index(port))?
                .consume(elements)?;
        }
        self.base.post_array(0usize, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AUTO_DEVICE;
    use crate::dtype::DType;
    use crate::flow::{Block, BufferChunk};
    use crate::ops::{BinaryOp, LogicalOp};

    fn push<T: crate::dtype::Element>(block: &mut TwoToOneBlock, port: usize, data: &[T]) {
        block
            .ports_mut()
            .input_mut(&PortId::Index(port))
            .unwrap()
            .push_buffer(BufferChunk::from_slice(data))
            .unwrap();
    }

    #[test]
    fn test_processes_overlap_only() {
        let mut block = TwoToOneBlock::new(AUTO_DEVICE, BinaryOp::Add, DType::I32).unwrap();
        block.activate().unwrap();
        push(&mut block, 0, &[1i32, 2, 3, 4]);
        push(&mut block, 1, &[10i32, 20]);
        block.work().unwrap();

        let out = block.ports_mut().output_mut(&PortId::Index(0)).unwrap().drain();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_vec::<i32>().unwrap(), vec![11, 22]);
        assert_eq!(block.ports().inputs()[0].elements(), 2);
        assert_eq!(block.ports().inputs()[1].elements(), 0);
    }

    #[test]
    fn test_logical_outputs_int8() {
        let mut block = TwoToOneBlock::new(AUTO_DEVICE, LogicalOp::Xor, DType::U16).unwrap();
        assert_eq!(block.ports().outputs()[0].dtype().dtype(), DType::I8);
        block.activate().unwrap();
        push(&mut block, 0, &[0u16, 1, 2, 0]);
        push(&mut block, 1, &[0u16, 0, 5, 7]);
        block.work().unwrap();

        let out = block.ports_mut().output_mut(&PortId::Index(0)).unwrap().drain();
        assert_eq!(out[0].to_vec::<i8>().unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_min_rejects_complex() {
        assert!(TwoToOneBlock::new(AUTO_DEVICE, BinaryOp::Min, DType::Complex128).is_err());
    }
}
