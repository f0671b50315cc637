//! Buffer/array bridge
//!
//! [`ArrayBlock`] is the state every GPU block embeds: the device it runs on,
//! whether its inputs arrive device-resident, its activity flag and its
//! ports. Its methods are grouped by role:
//!
//! - `selector`: backend/device accessors and mutators
//! - `ingress`: input chunks to arrays on the block's device
//! - `egress`: arrays to output chunks
//!
//! Every array created here is placed on the block's explicit
//! [`ArrayContext`]; the thread's ambient selection is only touched by
//! construction and by the selector mutators.

mod egress;
mod ingress;
mod selector;

use crate::dtype::{BufferDType, DType};
use crate::error::{Error, Result};
use crate::flow::{Block, PortId, Ports, WorkInfo};
use crate::runtime::{self, ArrayContext, DeviceCache, DeviceCacheEntry};

/// Device name meaning "this thread's active device"
pub const AUTO_DEVICE: &str = "Auto";

/// Shared state of a GPU-backed block
#[derive(Debug)]
pub struct ArrayBlock {
    ctx: ArrayContext,
    assume_array_inputs: bool,
    active: bool,
    requires_double: bool,
    ports: Ports,
}

impl ArrayBlock {
    /// Bind to `device` for a block processing `dtypes`
    ///
    /// `device` is [`AUTO_DEVICE`] or a device cache name such as
    /// `"OpenCL:1"`. Fails with `InvalidArgument` for unknown names and for
    /// double-precision dtypes on devices without double support. On success
    /// the device becomes this thread's active device.
    pub fn new(device: &str, dtypes: &[DType]) -> Result<Self> {
        let requires_double = dtypes.iter().any(|dtype| dtype.needs_double());

        let ctx = if device == AUTO_DEVICE {
            runtime::active_context()?
        } else {
            DeviceCache::global()
                .find_any_by_name(device)
                .map(DeviceCacheEntry::context)
                .ok_or_else(|| {
                    Error::invalid_argument("device", format!("unknown device \"{device}\""))
                })?
        };
        check_double_support(ctx, requires_double)?;
        runtime::set_active_context(ctx)?;

        tracing::debug!(device = %ctx, "array block bound");
        Ok(Self {
            ctx,
            assume_array_inputs: false,
            active: false,
            requires_double,
            ports: Ports::default(),
        })
    }

    /// Device every array of this block lives on
    pub fn context(&self) -> ArrayContext {
        self.ctx
    }

    /// Register an input port
    pub fn setup_input(
        &mut self,
        id: impl Into<PortId>,
        dtype: impl Into<BufferDType>,
    ) -> Result<()> {
        self.ports.add_input(id, dtype.into())
    }

    /// Register an output port
    pub fn setup_output(
        &mut self,
        id: impl Into<PortId>,
        dtype: impl Into<BufferDType>,
    ) -> Result<()> {
        self.ports.add_output(id, dtype.into())
    }

    /// The block's ports
    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// The block's ports, mutably
    pub fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    /// This cycle's work info
    pub fn work_info(&self) -> WorkInfo {
        self.ports.work_info()
    }

    /// Freeze configuration
    pub fn activate(&mut self) -> Result<()> {
        if self.active {
            return Err(Error::state("block is already active"));
        }
        self.active = true;
        Ok(())
    }

    /// Allow configuration changes again
    pub fn deactivate(&mut self) -> Result<()> {
        if !self.active {
            return Err(Error::state("block is not active"));
        }
        self.active = false;
        Ok(())
    }

    /// Whether the block is between `activate` and `deactivate`
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn ensure_inactive(&self, what: &str) -> Result<()> {
        if self.active {
            return Err(Error::state(format!(
                "cannot change {what} while the block is active"
            )));
        }
        Ok(())
    }
}

fn check_double_support(ctx: ArrayContext, requires_double: bool) -> Result<()> {
    if requires_double && !ctx.supports_double() {
        return Err(Error::invalid_argument(
            "device",
            format!("{ctx} does not support double-precision types"),
        ));
    }
    Ok(())
}

/// A block built on [`ArrayBlock`]
///
/// Implementors get [`Block`] for free; `process` runs once per active cycle.
pub trait ArrayBlockNode: Send {
    /// Embedded bridge state
    fn array_block(&self) -> &ArrayBlock;

    /// Embedded bridge state, mutably
    fn array_block_mut(&mut self) -> &mut ArrayBlock;

    /// One processing cycle
    fn process(&mut self) -> Result<()>;
}

impl<N: ArrayBlockNode> Block for N {
    fn ports(&self) -> &Ports {
        self.array_block().ports()
    }

    fn ports_mut(&mut self) -> &mut Ports {
        self.array_block_mut().ports_mut()
    }

    fn activate(&mut self) -> Result<()> {
        self.array_block_mut().activate()
    }

    fn deactivate(&mut self) -> Result<()> {
        self.array_block_mut().deactivate()
    }

    fn is_active(&self) -> bool {
        self.array_block().is_active()
    }

    fn work(&mut self) -> Result<()> {
        if !self.is_active() {
            return Err(Error::state("work called on an inactive block"));
        }
        self.process()
    }
}
