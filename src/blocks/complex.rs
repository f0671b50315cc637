//! Complex assembly and decomposition blocks

use crate::bridge::{ArrayBlock, ArrayBlockNode};
use crate::dtype::{BufferDType, DTypeSupport, validate_dtype};
use crate::error::{Error, Result};
use crate::flow::PortId;
use crate::ops;

const RE: &str = "re";
const IM: &str = "im";

/// Complex counterpart of a float port type
fn complex_port(component: BufferDType, op: &'static str) -> Result<BufferDType> {
    validate_dtype(component.dtype(), DTypeSupport::FLOAT, op)?;
    let complex = component
        .dtype()
        .to_complex()
        .ok_or_else(|| Error::unsupported_dtype(component.dtype(), op))?;
    Ok(component.with_dtype(complex))
}

/// Interleaves inputs `"re"` and `"im"` into complex output `0`
#[derive(Debug)]
pub struct CombineComplexBlock {
    base: ArrayBlock,
}

impl CombineComplexBlock {
    /// Create a block on `device`; `dtype` is the float component type
    pub fn new(device: &str, dtype: impl Into<BufferDType>) -> Result<Self> {
        let component = dtype.into();
        let complex = complex_port(component, "combine_complex")?;

        let mut base = ArrayBlock::new(device, &[component.dtype()])?;
        base.setup_input(RE, component)?;
        base.setup_input(IM, component)?;
        base.setup_output(0usize, complex)?;
        Ok(Self { base })
    }
}

impl ArrayBlockNode for CombineComplexBlock {
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

        let re = self.base.input_array(RE, true)?;
        let im = self.base.input_array(IM, true)?;
        let output = ops::combine_complex(&re, &im)?;

        for port in [RE, IM] {
            self.base
                .ports_mut()
                .input_mut(&PortId::from(port))?
                .consume(elements)?;
        }
        self.base.post_array(0usize, &output)
    }
}

/// Splits complex input `0` into outputs `"re"` and `"im"`
#[derive(Debug)]
pub struct SplitComplexBlock {
    base: ArrayBlock,
}

impl SplitComplexBlock {
    /// Create a block on `device`; `dtype` is the float component type
    pub fn new(device: &str, dtype: impl Into<BufferDType>) -> Result<Self> {
        let component = dtype.into();
        let complex = complex_port(component, "split_complex")?;

        let mut base = ArrayBlock::new(device, &[component.dtype()])?;
        base.setup_input(0usize, complex)?;
        base.setup_output(RE, component)?;
        base.setup_output(IM, component)?;
        Ok(Self { base })
    }
}

impl ArrayBlockNode for SplitComplexBlock {
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

        let input = self.base.input_array(0usize, true)?;
        let re = ops::real(&input)?;
        let im = ops::imag(&input)?;

        self.base
            .ports_mut()
            .input_mut(&PortId::Index(0))?
            .consume(elements)?;
        self.base.post_array(RE, &re)?;
        self.base.post_array(IM, &im)
    }
}
