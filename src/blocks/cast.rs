//! Element type conversion block

use super::{check_channels, process_channels};
use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, DType};
use crate::error::Result;
use crate::ops;

/// Converts each of `nchans` streams to another element type
#[derive(Debug)]
pub struct CastBlock {
    base: ArrayBlock,
    output: DType,
    nchans: usize,
}

impl CastBlock {
    /// Create a block on `device` converting `input` samples to `output`
    ///
    /// Complex to real conversions are rejected; the dimension is kept.
    pub fn new(
        device: &str,
        input: impl Into<BufferDType>,
        output: DType,
        nchans: usize,
    ) -> Result<Self> {
        let input = input.into();
        ops::cast_support(input.dtype(), output)?;
        check_channels(nchans)?;
        let output_type = input.with_dtype(output);

        let mut base = ArrayBlock::new(device, &[input.dtype(), output])?;
        for chan in 0..nchans {
            base.setup_input(chan, input)?;
            base.setup_output(chan, output_type)?;
        }
        Ok(Self {
            base,
            output,
            nchans,
        })
    }

    /// Element type produced
    pub fn output_dtype(&self) -> DType {
        self.output
    }
}

impl ArrayBlockNode for CastBlock {
    fn array_block(&self) -> &ArrayBlock {
        &self.base
    }

    fn array_block_mut(&mut self) -> &mut ArrayBlock {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let output = self.output;
        process_channels(&mut self.base, self.nchans, |a| ops::cast(a, output))
    }
}
