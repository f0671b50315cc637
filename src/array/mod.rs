//! GPU array handle
//!
//! A [`GpuArray`] is a contiguous, row-major view into reference-counted
//! device [`Storage`]. It always knows which backend and device owns its
//! memory; kernels refuse to mix arrays from different backends.

mod shape;
mod storage;

pub use shape::Shape;
pub use storage::Storage;

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::{ArrayContext, Backend};
use std::fmt;

/// Array resident on one device of one backend
///
/// Cloning is cheap and shares storage.
#[derive(Clone)]
pub struct GpuArray {
    storage: Storage,
    /// Byte offset of the first element in `storage`
    offset: usize,
    shape: Shape,
    dtype: DType,
}

impl GpuArray {
    /// Upload `bytes` as a new array on `ctx`
    ///
    /// `bytes` must hold exactly `product(shape)` elements of `dtype`.
    pub fn from_bytes(
        ctx: ArrayContext,
        dtype: DType,
        shape: impl Into<Shape>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elements() * dtype.size_in_bytes();
        if bytes.len() != expected {
            return Err(Error::invalid_argument(
                "bytes",
                format!(
                    "{} bytes cannot hold a {dtype} array of shape {shape:?} ({expected} bytes)",
                    bytes.len()
                ),
            ));
        }
        Ok(Self {
            storage: Storage::upload(ctx, bytes),
            offset: 0,
            shape,
            dtype,
        })
    }

    /// Upload a typed slice
    pub fn from_slice<T: Element>(
        ctx: ArrayContext,
        data: &[T],
        shape: impl Into<Shape>,
    ) -> Result<Self> {
        Self::from_bytes(ctx, T::DTYPE, shape, bytemuck::cast_slice(data).to_vec())
    }

    /// Upload a 1D typed vector
    pub fn from_vec<T: Element>(ctx: ArrayContext, data: Vec<T>) -> Result<Self> {
        let len = data.len();
        Self::from_slice(ctx, &data, [len])
    }

    /// Zero-filled array
    pub fn zeros(ctx: ArrayContext, dtype: DType, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let len = shape.elements() * dtype.size_in_bytes();
        Self::from_bytes(ctx, dtype, shape, vec![0u8; len])
    }

    /// Owning backend
    #[inline]
    pub fn backend(&self) -> Backend {
        self.storage.context().backend
    }

    /// Device index within the backend
    #[inline]
    pub fn device(&self) -> usize {
        self.storage.context().device
    }

    /// Owning backend and device
    #[inline]
    pub fn context(&self) -> ArrayContext {
        self.storage.context()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimensions
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn elements(&self) -> usize {
        self.shape.elements()
    }

    /// Extent of the outermost dimension
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape.rows()
    }

    /// Size of the viewed data in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.elements() * self.dtype.size_in_bytes()
    }

    /// Backing storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Whether both arrays view the same device block
    pub fn shares_storage(&self, other: &GpuArray) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Raw bytes of the viewed elements
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.bytes()[self.offset..self.offset + self.size_in_bytes()]
    }

    /// Copy the viewed elements back to the host
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(Error::DTypeMismatch {
                lhs: self.dtype,
                rhs: T::DTYPE,
            });
        }
        Ok(bytemuck::pod_collect_to_vec(self.as_bytes()))
    }

    /// Deep copy onto `ctx`
    ///
    /// The result never shares storage with `self`, even when `ctx` is the
    /// array's own device.
    pub fn copy_to(&self, ctx: ArrayContext) -> Result<Self> {
        Self::from_bytes(ctx, self.dtype, self.shape.clone(), self.as_bytes().to_vec())
    }

    /// View `len` steps of the outermost dimension starting at `start`
    pub fn slice(&self, start: usize, len: usize) -> Result<Self> {
        let rows = self.rows();
        if self.ndim() == 0 || start.checked_add(len).is_none_or(|end| end > rows) {
            return Err(Error::invalid_argument(
                "slice",
                format!(
                    "range {start}..{} out of bounds for shape {:?}",
                    start.saturating_add(len),
                    self.shape
                ),
            ));
        }
        let row_bytes = self.shape.row_elements() * self.dtype.size_in_bytes();
        Ok(Self {
            storage: self.storage.clone(),
            offset: self.offset + start * row_bytes,
            shape: self.shape.with_rows(len),
            dtype: self.dtype,
        })
    }

    /// Row `index` of a 2D array as a 1D view
    pub fn row(&self, index: usize) -> Result<Self> {
        if self.ndim() != 2 {
            return Err(Error::invalid_argument(
                "array",
                format!("row access needs a 2D array, got shape {:?}", self.shape),
            ));
        }
        let cols = self.shape[1];
        self.slice(index, 1)?.reshape([cols])
    }

    /// Same elements, new dimensions
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if shape.elements() != self.elements() {
            return Err(Error::shape_mismatch(&self.shape, &shape));
        }
        Ok(Self {
            storage: self.storage.clone(),
            offset: self.offset,
            shape,
            dtype: self.dtype,
        })
    }

    /// 1D view of every element
    pub fn flatten(&self) -> Result<Self> {
        self.reshape([self.elements()])
    }
}

impl fmt::Debug for GpuArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuArray")
            .field("ctx", &self.context())
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("offset", &self.offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::allocated_bytes;

    fn ctx(device: usize) -> ArrayContext {
        ArrayContext::new(Backend::Cpu, device)
    }

    #[test]
    fn test_from_bytes_checks_length() {
        let err = GpuArray::from_bytes(ctx(0), DType::F32, [3], vec![0u8; 8]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_views_share_storage() {
        let a = GpuArray::from_slice(ctx(0), &[1i32, 2, 3, 4, 5, 6], [3, 2]).unwrap();
        let tail = a.slice(1, 2).unwrap();
        assert!(tail.shares_storage(&a));
        assert_eq!(tail.shape().as_slice(), &[2, 2]);
        assert_eq!(tail.to_vec::<i32>().unwrap(), vec![3, 4, 5, 6]);

        let row = a.row(2).unwrap();
        assert_eq!(row.to_vec::<i32>().unwrap(), vec![5, 6]);
        assert!(a.slice(2, 2).is_err());
        assert!(row.row(0).is_err());
    }

    #[test]
    fn test_to_vec_checks_dtype() {
        let a = GpuArray::from_vec(ctx(0), vec![1.0f64, 2.0]).unwrap();
        assert!(a.to_vec::<f32>().is_err());
        assert_eq!(a.to_vec::<f64>().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_copy_to_allocates_on_target() {
        let target = ArrayContext::new(Backend::OpenCl, 7001);
        let a = GpuArray::from_vec(ctx(0), vec![1u16, 2, 3]).unwrap();
        let b = a.copy_to(target).unwrap();
        assert_eq!(b.backend(), Backend::OpenCl);
        assert!(!b.shares_storage(&a));
        assert_eq!(allocated_bytes(target), 6);
        drop(b);
        assert_eq!(allocated_bytes(target), 0);
    }

    #[test]
    fn test_reshape_and_flatten() {
        let a = GpuArray::from_vec(ctx(0), vec![0u8; 12]).unwrap();
        assert_eq!(a.reshape([3, 4]).unwrap().rows(), 3);
        assert!(a.reshape([5, 2]).is_err());
        assert_eq!(a.reshape([2, 6]).unwrap().flatten().unwrap().ndim(), 1);
    }
}
