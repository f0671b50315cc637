//! Host dataflow model
//!
//! The side of the bridge that the scheduler sees: blocks with typed,
//! numbered or named ports exchanging [`BufferChunk`]s. A chunk is a typed
//! window into a reference-counted [`SharedBuffer`] whose backing container is
//! either host memory or a device-resident array.
//!
//! ```text
//! upstream block ── post_buffer ──▶ OutputPort ─┐
//!                                               │ scheduler moves chunks
//! InputPort ◀── push_buffer ────────────────────┘
//!     │ buffer() / consume(n)
//!     ▼
//! Block::work()
//! ```

mod buffer;
mod port;

pub use buffer::{BufferChunk, BufferContainer, SharedBuffer};
pub use port::{InputPort, OutputPort, Ports};

use crate::error::Result;
use std::fmt;

/// Port identifier: a number or a name
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PortId {
    /// Numbered port
    Index(usize),
    /// Named port
    Name(String),
}

impl PortId {
    /// Port number, if numbered
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }
}

impl From<usize> for PortId {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for PortId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PortId {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Per-cycle scheduling information
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct WorkInfo {
    /// Fewest elements available on any input; 0 for blocks without inputs
    pub min_elements: usize,
}

/// A node the scheduler drives
///
/// The scheduler calls `activate` once before the first `work` and
/// `deactivate` after the last. `work` is always called from the block's own
/// worker thread.
pub trait Block: Send {
    /// The block's ports
    fn ports(&self) -> &Ports;

    /// The block's ports, mutably
    fn ports_mut(&mut self) -> &mut Ports;

    /// Commit configuration and start processing
    fn activate(&mut self) -> Result<()>;

    /// Stop processing; configuration may change again
    fn deactivate(&mut self) -> Result<()>;

    /// Whether the block is between `activate` and `deactivate`
    fn is_active(&self) -> bool;

    /// One processing cycle: consume inputs, post outputs
    fn work(&mut self) -> Result<()>;
}
