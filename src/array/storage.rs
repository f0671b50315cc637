//! Storage: device memory shared between array views

use crate::runtime::{ArrayContext, DeviceMemory};
use std::sync::Arc;

/// Reference-counted device memory backing one or more arrays
///
/// Views (slices, rows, reshapes) clone the `Storage`, never the memory.
/// The block is released when the last view is dropped.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<DeviceMemory>,
}

impl Storage {
    /// Allocate on `ctx` and upload `bytes`
    pub(crate) fn upload(ctx: ArrayContext, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(DeviceMemory::upload(ctx, bytes)),
        }
    }

    /// Device owning the memory
    #[inline]
    pub fn context(&self) -> ArrayContext {
        self.inner.context()
    }

    /// Size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.bytes().len()
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    /// Number of live views
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same device block
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ctx", &self.context())
            .field("len", &self.size_in_bytes())
            .field("refs", &self.ref_count())
            .finish()
    }
}
