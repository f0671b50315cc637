//! Input chunks to arrays

use super::ArrayBlock;
use crate::array::GpuArray;
use crate::error::{Error, Result};
use crate::flow::PortId;

impl ArrayBlock {
    /// The front chunk of input `port` as an array on the block's device
    ///
    /// With `truncate_to_min_length`, at most `work_info().min_elements`
    /// elements are taken; otherwise the whole chunk. Nothing is consumed.
    ///
    /// - Device-resident input on the block's backend: a view of the same
    ///   storage (no copy).
    /// - Device-resident input on another backend: copied through a host
    ///   staging buffer into a new array.
    /// - Host input: imported into a new array.
    pub fn input_array(
        &self,
        port: impl Into<PortId>,
        truncate_to_min_length: bool,
    ) -> Result<GpuArray> {
        let id = port.into();
        let input = self.ports.input(&id)?;
        let dtype = input.dtype();

        let Some(chunk) = input.buffer() else {
            return GpuArray::zeros(self.ctx, dtype.dtype(), dtype.array_shape(0));
        };

        let min_length = self.work_info().min_elements;
        let elements = if truncate_to_min_length && min_length < chunk.elements() {
            min_length
        } else {
            chunk.elements()
        };
        let shape = dtype.array_shape(elements);

        if self.assume_array_inputs {
            let source = chunk.resident_array()?.ok_or_else(|| {
                Error::invalid_argument(
                    "buffer",
                    format!("input {id} expected a device-resident array, got host memory"),
                )
            })?;
            let values = elements * dtype.dimension();

            if source.backend() == self.ctx.backend {
                tracing::trace!(port = %id, elements, "ingress: zero-copy");
                return source.slice(0, values)?.reshape(shape);
            }

            // The thread's active backend is left alone: both sides of the
            // copy name their device explicitly.
            tracing::trace!(
                port = %id,
                elements,
                from = %source.context(),
                to = %self.ctx,
                "ingress: cross-backend copy"
            );
            let mut staged = source.as_bytes().to_vec();
            staged.truncate(values * dtype.dtype().size_in_bytes());
            return GpuArray::from_bytes(self.ctx, dtype.dtype(), shape, staged);
        }

        tracing::trace!(port = %id, elements, "ingress: host import");
        let window = if elements < chunk.elements() {
            chunk.narrowed(elements)?
        } else {
            chunk.clone()
        };
        GpuArray::from_bytes(self.ctx, dtype.dtype(), shape, window.as_bytes().to_vec())
    }

    /// Every numbered input stacked into one 2D array, consuming the rows
    ///
    /// Row `i` holds `min_elements` elements of input `i`; the result has
    /// shape `[inputs, min_elements * dimension]`. All inputs must be
    /// numbered `0..n`, share one dtype and have data available.
    pub fn input_arrays_2d(&mut self) -> Result<GpuArray> {
        let inputs = self.ports.inputs();
        let Some(first) = inputs.first() else {
            return Err(Error::invalid_argument("ports", "block has no inputs"));
        };
        let dtype = first.dtype();

        for (index, input) in inputs.iter().enumerate() {
            if input.id().index() != Some(index) {
                return Err(Error::invalid_argument(
                    "ports",
                    format!("input {} is not numbered {index}", input.id()),
                ));
            }
            if input.dtype() != dtype {
                return Err(Error::DTypeMismatch {
                    lhs: dtype.dtype(),
                    rhs: input.dtype().dtype(),
                });
            }
        }

        let rows = inputs.len();
        let min_length = self.work_info().min_elements;
        if min_length == 0 {
            return Err(Error::invalid_argument(
                "elements",
                "every input needs data before stacking",
            ));
        }
        let cols = min_length * dtype.dimension();

        let mut bytes = Vec::with_capacity(rows * cols * dtype.dtype().size_in_bytes());
        for row in 0..rows {
            let array = self.input_array(row, true)?;
            bytes.extend_from_slice(array.as_bytes());
        }
        for row in 0..rows {
            self.ports.input_mut(&PortId::Index(row))?.consume(min_length)?;
        }

        GpuArray::from_bytes(self.ctx, dtype.dtype(), [rows, cols], bytes)
    }
}
