//! Backend and device selection

use super::{ArrayBlock, check_double_support};
use crate::error::{Error, Result};
use crate::runtime::{self, Backend, DeviceCache};

impl ArrayBlock {
    /// Backend the block runs on
    ///
    /// Must match this thread's active backend; debug builds panic otherwise.
    pub fn backend(&self) -> Backend {
        debug_assert_eq!(
            runtime::active_backend().ok(),
            Some(self.ctx.backend),
            "block backend diverged from the thread's active backend"
        );
        self.ctx.backend
    }

    /// Move the block to `backend`'s first device
    ///
    /// Fails with `State` while active and `InvalidArgument` if the backend
    /// has no usable device; in both cases nothing changes.
    pub fn set_backend(&mut self, backend: Backend) -> Result<()> {
        self.ensure_inactive("backend")?;
        let entry = DeviceCache::global().default_device(backend).ok_or_else(|| {
            Error::invalid_argument("backend", format!("{backend} has no available devices"))
        })?;
        check_double_support(entry.context(), self.requires_double)?;

        let ctx = runtime::set_active_backend(backend)?;
        tracing::debug!(from = %self.ctx, to = %ctx, "backend changed");
        self.ctx = ctx;
        Ok(())
    }

    /// Name of the block's device, e.g. `"CUDA:0"`
    pub fn device(&self) -> Result<String> {
        DeviceCache::global()
            .find(self.ctx)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| Error::internal(format!("device {} is not in the device cache", self.ctx)))
    }

    /// Move the block to the device called `name` on its current backend
    ///
    /// Fails with `State` while active and `InvalidArgument` if `name` is not
    /// a device of the current backend; in both cases nothing changes.
    pub fn set_device(&mut self, name: &str) -> Result<()> {
        self.ensure_inactive("device")?;
        let entry = DeviceCache::global()
            .find_by_name(self.ctx.backend, name)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "device",
                    format!("\"{name}\" is not a {} device", self.ctx.backend),
                )
            })?;
        let ctx = entry.context();
        check_double_support(ctx, self.requires_double)?;

        runtime::set_active_context(ctx)?;
        tracing::debug!(from = %self.ctx, to = %ctx, "device changed");
        self.ctx = ctx;
        Ok(())
    }

    /// Whether inputs are expected to arrive as device-resident arrays
    pub fn assumes_array_inputs(&self) -> bool {
        self.assume_array_inputs
    }

    /// Expect device-resident inputs (or not)
    pub fn set_assumes_array_inputs(&mut self, value: bool) {
        self.assume_array_inputs = value;
    }
}
