//! Shared buffers and buffer chunks

use crate::array::GpuArray;
use crate::dtype::{BufferDType, Element};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Backing allocation of a buffer
///
/// Host memory, or an array still resident on its device. Only the `Array`
/// variant can be handed to a block without a copy.
pub enum BufferContainer {
    /// Plain host bytes
    Host(Vec<u8>),
    /// Device-resident array
    Array(GpuArray),
}

impl BufferContainer {
    /// Size of the allocation in bytes
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::Host(bytes) => bytes.len(),
            Self::Array(array) => array.size_in_bytes(),
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::Host(bytes) => bytes,
            Self::Array(array) => array.as_bytes(),
        }
    }
}

impl fmt::Debug for BufferContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(bytes) => f.debug_tuple("Host").field(&bytes.len()).finish(),
            Self::Array(array) => f.debug_tuple("Array").field(array).finish(),
        }
    }
}

/// A byte window into a reference-counted container
///
/// `offset + length <= container size` holds for every value of this type.
#[derive(Clone, Debug)]
pub struct SharedBuffer {
    container: Arc<BufferContainer>,
    offset: usize,
    length: usize,
}

impl SharedBuffer {
    /// Window `offset..offset + length` of `container`
    pub fn new(container: Arc<BufferContainer>, offset: usize, length: usize) -> Result<Self> {
        let size = container.size_in_bytes();
        if offset.checked_add(length).is_none_or(|end| end > size) {
            return Err(Error::invalid_argument(
                "buffer",
                format!("window {offset}+{length} exceeds container of {size} bytes"),
            ));
        }
        Ok(Self {
            container,
            offset,
            length,
        })
    }

    /// Whole-allocation window over host bytes
    pub fn host(bytes: Vec<u8>) -> Self {
        let length = bytes.len();
        Self {
            container: Arc::new(BufferContainer::Host(bytes)),
            offset: 0,
            length,
        }
    }

    /// Whole-array window over a device-resident array
    pub fn array(array: GpuArray) -> Self {
        let length = array.size_in_bytes();
        Self {
            container: Arc::new(BufferContainer::Array(array)),
            offset: 0,
            length,
        }
    }

    /// Backing container
    pub fn container(&self) -> &BufferContainer {
        &self.container
    }

    /// Byte offset into the container
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Window length in bytes
    pub fn length(&self) -> usize {
        self.length
    }

    /// Sub-window relative to this one, sharing the container
    pub fn narrow(&self, offset: usize, length: usize) -> Result<Self> {
        if offset.checked_add(length).is_none_or(|end| end > self.length) {
            return Err(Error::invalid_argument(
                "buffer",
                format!(
                    "sub-window {offset}+{length} exceeds window of {} bytes",
                    self.length
                ),
            ));
        }
        Self::new(Arc::clone(&self.container), self.offset + offset, length)
    }

    /// The windowed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.container.bytes()[self.offset..self.offset + self.length]
    }

    /// Whether both windows view the same container
    pub fn shares_container(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.container, &other.container)
    }
}

/// A typed window of a shared buffer, as carried on a port
#[derive(Clone, Debug)]
pub struct BufferChunk {
    buffer: SharedBuffer,
    dtype: BufferDType,
}

impl BufferChunk {
    /// Wrap `buffer`; its length must be a whole number of elements
    pub fn new(buffer: SharedBuffer, dtype: BufferDType) -> Result<Self> {
        if buffer.length() % dtype.size() != 0 {
            return Err(Error::invalid_argument(
                "buffer",
                format!(
                    "{} bytes is not a whole number of {dtype} elements",
                    buffer.length()
                ),
            ));
        }
        if let BufferContainer::Array(array) = buffer.container() {
            if array.dtype() != dtype.dtype() {
                return Err(Error::DTypeMismatch {
                    lhs: array.dtype(),
                    rhs: dtype.dtype(),
                });
            }
        }
        Ok(Self { buffer, dtype })
    }

    /// Host chunk holding a copy of `data`
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        Self {
            buffer: SharedBuffer::host(bytemuck::cast_slice(data).to_vec()),
            dtype: BufferDType::scalar(T::DTYPE),
        }
    }

    /// Host chunk over `bytes`
    pub fn from_host_bytes(dtype: BufferDType, bytes: Vec<u8>) -> Result<Self> {
        Self::new(SharedBuffer::host(bytes), dtype)
    }

    /// Chunk aliasing a device-resident array
    pub fn from_array(array: GpuArray, dtype: BufferDType) -> Result<Self> {
        Self::new(SharedBuffer::array(array), dtype)
    }

    /// Backing window
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Element type
    pub fn dtype(&self) -> BufferDType {
        self.dtype
    }

    /// Number of elements in the window
    pub fn elements(&self) -> usize {
        self.buffer.length() / self.dtype.size()
    }

    /// Raw bytes of the window
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// First `elements` elements, sharing the backing allocation
    pub fn narrowed(&self, elements: usize) -> Result<Self> {
        Ok(Self {
            buffer: self.buffer.narrow(0, elements * self.dtype.size())?,
            dtype: self.dtype,
        })
    }

    /// Drop the first `elements` elements from the window
    pub fn advance(&mut self, elements: usize) -> Result<()> {
        if elements > self.elements() {
            return Err(Error::invalid_argument(
                "elements",
                format!("cannot advance {elements} past {} elements", self.elements()),
            ));
        }
        let bytes = elements * self.dtype.size();
        self.buffer = self.buffer.narrow(bytes, self.buffer.length() - bytes)?;
        Ok(())
    }

    /// The array view matching this window, if the chunk is device-resident
    pub fn resident_array(&self) -> Result<Option<GpuArray>> {
        let BufferContainer::Array(array) = self.buffer.container() else {
            return Ok(None);
        };
        let size = array.dtype().size_in_bytes();
        let view = array
            .flatten()?
            .slice(self.buffer.offset() / size, self.buffer.length() / size)?;
        Ok(Some(view))
    }

    /// Copy the window out as typed values
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype.dtype(),
                rhs: T::DTYPE,
            });
        }
        Ok(bytemuck::pod_collect_to_vec(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::runtime::{ArrayContext, Backend};

    #[test]
    fn test_window_invariant() {
        let container = Arc::new(BufferContainer::Host(vec![0u8; 16]));
        assert!(SharedBuffer::new(Arc::clone(&container), 8, 8).is_ok());
        assert!(SharedBuffer::new(Arc::clone(&container), 12, 8).is_err());
        assert!(SharedBuffer::new(container, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_narrow_and_advance_share_allocation() {
        let mut chunk = BufferChunk::from_slice(&[1i16, 2, 3, 4, 5]);
        let head = chunk.narrowed(3).unwrap();
        assert!(head.buffer().shares_container(chunk.buffer()));
        assert_eq!(head.to_vec::<i16>().unwrap(), vec![1, 2, 3]);
        assert!(chunk.narrowed(6).is_err());

        chunk.advance(2).unwrap();
        assert_eq!(chunk.elements(), 3);
        assert_eq!(chunk.to_vec::<i16>().unwrap(), vec![3, 4, 5]);
        assert!(chunk.advance(4).is_err());
    }

    #[test]
    fn test_resident_array_view() {
        let ctx = ArrayContext::new(Backend::Cpu, 0);
        let array = GpuArray::from_vec(ctx, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let mut chunk = BufferChunk::from_array(array.clone(), DType::F32.into()).unwrap();
        chunk.advance(1).unwrap();

        let view = chunk.resident_array().unwrap().unwrap();
        assert!(view.shares_storage(&array));
        assert_eq!(view.to_vec::<f32>().unwrap(), vec![2.0, 3.0, 4.0]);

        assert!(BufferChunk::from_array(array, DType::I32.into()).is_err());
        assert!(
            BufferChunk::from_slice(&[1u8])
                .resident_array()
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_vector_dtype_elements() {
        let dtype = BufferDType::new(DType::F32, 2).unwrap();
        let chunk = BufferChunk::from_host_bytes(dtype, vec![0u8; 24]).unwrap();
        assert_eq!(chunk.elements(), 3);
        assert!(BufferChunk::from_host_bytes(dtype, vec![0u8; 20]).is_err());
    }
}
