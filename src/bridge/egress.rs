//! Arrays to output chunks

use super::ArrayBlock;
use crate::array::GpuArray;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::flow::{BufferChunk, PortId};

impl ArrayBlock {
    /// Copy `array` into a new host buffer and post it to output `port`
    ///
    /// The array's dtype must match the port's; its length is used as is.
    pub fn post_array(&mut self, port: impl Into<PortId>, array: &GpuArray) -> Result<()> {
        let id = port.into();
        let output = self.ports.output_mut(&id)?;
        let dtype = output.dtype();
        check_output_dtype(&id, dtype.dtype(), array)?;

        let chunk = BufferChunk::from_host_bytes(dtype, array.as_bytes().to_vec())?;
        output.post_buffer(chunk)
    }

    /// Post `array` itself to output `port` without copying
    ///
    /// Downstream blocks that assume device-resident inputs pick the array up
    /// zero-copy.
    pub fn post_array_by_reference(
        &mut self,
        port: impl Into<PortId>,
        array: GpuArray,
    ) -> Result<()> {
        let id = port.into();
        let output = self.ports.output_mut(&id)?;
        let dtype = output.dtype();
        check_output_dtype(&id, dtype.dtype(), &array)?;

        let chunk = BufferChunk::from_array(array.flatten()?, dtype)?;
        output.post_buffer(chunk)
    }

    /// Post row `i` of a 2D array to numbered output `i`
    ///
    /// The row count must equal the number of outputs.
    pub fn post_rows_to_outputs(&mut self, array: &GpuArray) -> Result<()> {
        let outputs = self.ports.outputs().len();
        if array.ndim() != 2 || array.rows() != outputs {
            return Err(Error::invalid_argument(
                "array",
                format!(
                    "cannot scatter shape {:?} across {outputs} outputs",
                    array.shape()
                ),
            ));
        }
        for index in 0..outputs {
            self.post_array(index, &array.row(index)?)?;
        }
        Ok(())
    }
}

fn check_output_dtype(id: &PortId, expected: DType, array: &GpuArray) -> Result<()> {
    if array.dtype() != expected {
        return Err(Error::invalid_argument(
            "array",
            format!("output {id} carries {expected}, got a {} array", array.dtype()),
        ));
    }
    Ok(())
}
