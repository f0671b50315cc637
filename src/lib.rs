//! # gpuflow
//!
//! **GPU array blocks for dataflow graphs.**
//!
//! gpuflow bridges a streaming dataflow host, where blocks exchange typed
//! buffer chunks through ports, and a GPU array library with several compute
//! backends. Blocks pull their inputs as device arrays, run array kernels and
//! post the results back as chunks.
//!
//! ## Layers
//!
//! - **Runtime**: backends (CUDA, OpenCL, CPU), the process-wide device cache
//!   and the per-thread active device
//! - **Arrays**: reference-counted device buffers with shape and dtype
//! - **Flow**: ports, chunks and shared buffers as seen by the scheduler
//! - **Bridge**: device selection plus ingress (chunks to arrays) and egress
//!   (arrays to chunks)
//! - **Blocks**: elementwise, cast, complex, FFT and random source blocks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gpuflow::prelude::*;
//!
//! let mut block = TwoToOneBlock::new("Auto", BinaryOp::Add, DType::F32)?;
//! block.activate()?;
//! block.ports_mut().input_mut(&0usize.into())?.push_buffer(BufferChunk::from_slice(&[1.0f32, 2.0]))?;
//! block.ports_mut().input_mut(&1usize.into())?.push_buffer(BufferChunk::from_slice(&[3.0f32, 4.0]))?;
//! block.work()?;
//! ```
//!
//! ## Configuration
//!
//! The device cache is built once per process from [`config::RuntimeConfig`],
//! either installed programmatically or read from `GPUFLOW_BACKENDS` and
//! `GPUFLOW_NO_DOUBLE`.
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded FFT frames and large elementwise kernels

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod blocks;
pub mod bridge;
pub mod config;
pub mod dtype;
pub mod error;
pub mod flow;
pub mod ops;
pub mod runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array::GpuArray;
    pub use crate::blocks::{
        CastBlock, CombineComplexBlock, CombineOp, FftBlock, NToOneBlock, OneToOneBlock,
        RandomSourceBlock, RfftBlock, SplitComplexBlock, TwoToOneBlock,
    };
    pub use crate::bridge::{AUTO_DEVICE, ArrayBlock, ArrayBlockNode};
    pub use crate::dtype::{BufferDType, DType, DTypeSupport};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::flow::{Block, BufferChunk, PortId};
    pub use crate::ops::{BinaryOp, Distribution, EngineKind, FftDirection, LogicalOp, UnaryOp};
    pub use crate::runtime::{ArrayContext, Backend};
}
