//! Array runtime: backends, devices and the per-thread active selection
//!
//! ```text
//! DeviceCache (process-wide, populated once)
//! ├── DeviceCacheEntry ("CUDA:0", "OpenCL:1", ...)
//! ArrayContext (backend + device index, passed explicitly)
//! ├── DeviceMemory (per-context allocation accounting)
//! thread-local active selection (ambient, mirrors the array library)
//! ```
//!
//! Array construction and transfers always take an explicit [`ArrayContext`].
//! The thread-local active selection exists for callers that expect the
//! library's ambient state; only the selector operations change it.

mod allocator;
mod backend;
mod device_cache;

pub(crate) use allocator::DeviceMemory;
pub use allocator::allocated_bytes;
pub use backend::{ALL_BACKENDS, Backend};
pub use device_cache::{DeviceCache, DeviceCacheEntry};

use crate::error::{Error, Result};
use std::cell::Cell;
use std::fmt;

/// A backend plus a device index within it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayContext {
    /// Backend
    pub backend: Backend,
    /// Device index within the backend
    pub device: usize,
}

impl ArrayContext {
    /// Create a context; existence is not checked
    pub const fn new(backend: Backend, device: usize) -> Self {
        Self { backend, device }
    }

    /// Cache entry describing this device
    pub fn entry(self) -> Result<&'static DeviceCacheEntry> {
        DeviceCache::global()
            .find(self)
            .ok_or_else(|| Error::internal(format!("device {self} is not in the device cache")))
    }

    /// Whether the device handles float64/complex_float64
    pub fn supports_double(self) -> bool {
        self.entry().map(|e| e.supports_double).unwrap_or(false)
    }
}

impl fmt::Display for ArrayContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.backend, self.device)
    }
}

thread_local! {
    static ACTIVE: Cell<Option<ArrayContext>> = const { Cell::new(None) };
}

/// This thread's active backend and device
///
/// Initialized lazily to the highest-priority device in the cache.
pub fn active_context() -> Result<ArrayContext> {
    if let Some(ctx) = ACTIVE.get() {
        return Ok(ctx);
    }
    let ctx = DeviceCache::global().default_context()?;
    ACTIVE.set(Some(ctx));
    Ok(ctx)
}

/// This thread's active backend
pub fn active_backend() -> Result<Backend> {
    active_context().map(|ctx| ctx.backend)
}

/// Make `backend` active on this thread, selecting its first device
pub fn set_active_backend(backend: Backend) -> Result<ArrayContext> {
    let entry = DeviceCache::global().default_device(backend).ok_or_else(|| {
        Error::invalid_argument("backend", format!("{backend} has no available devices"))
    })?;
    let ctx = entry.context();
    ACTIVE.set(Some(ctx));
    Ok(ctx)
}

/// Make `ctx` active on this thread
pub fn set_active_context(ctx: ArrayContext) -> Result<()> {
    if DeviceCache::global().find(ctx).is_none() {
        return Err(Error::invalid_argument(
            "device",
            format!("{ctx} is not an available device"),
        ));
    }
    ACTIVE.set(Some(ctx));
    Ok(())
}
