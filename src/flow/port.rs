//! Typed input and output ports

use super::{BufferChunk, BufferContainer, PortId, WorkInfo};
use crate::dtype::BufferDType;
use crate::error::{Error, Result};
use std::collections::VecDeque;

fn check_port_dtype(port: &PortId, expected: BufferDType, got: BufferDType) -> Result<()> {
    if expected != got {
        return Err(Error::invalid_argument(
            "buffer",
            format!("port {port} carries {expected}, got a {got} buffer"),
        ));
    }
    Ok(())
}

fn is_host(chunk: &BufferChunk) -> bool {
    matches!(chunk.buffer().container(), BufferContainer::Host(_))
}

/// Queue of chunks delivered to a block
#[derive(Debug)]
pub struct InputPort {
    id: PortId,
    dtype: BufferDType,
    queue: VecDeque<BufferChunk>,
    total_consumed: usize,
}

impl InputPort {
    pub(crate) fn new(id: PortId, dtype: BufferDType) -> Self {
        Self {
            id,
            dtype,
            queue: VecDeque::new(),
            total_consumed: 0,
        }
    }

    /// Port identifier
    pub fn id(&self) -> &PortId {
        &self.id
    }

    /// Element type, fixed at construction
    pub fn dtype(&self) -> BufferDType {
        self.dtype
    }

    /// Deliver a chunk
    ///
    /// Consecutive host chunks are merged so the front chunk is always the
    /// largest contiguous run available; device-resident chunks stay intact.
    pub fn push_buffer(&mut self, chunk: BufferChunk) -> Result<()> {
        check_port_dtype(&self.id, self.dtype, chunk.dtype())?;
        if chunk.elements() == 0 {
            return Ok(());
        }

        if let Some(last) = self.queue.back_mut() {
            if is_host(last) && is_host(&chunk) {
                let mut bytes = Vec::with_capacity(last.as_bytes().len() + chunk.as_bytes().len());
                bytes.extend_from_slice(last.as_bytes());
                bytes.extend_from_slice(chunk.as_bytes());
                *last = BufferChunk::from_host_bytes(self.dtype, bytes)?;
                return Ok(());
            }
        }
        self.queue.push_back(chunk);
        Ok(())
    }

    /// Front chunk, if any
    pub fn buffer(&self) -> Option<&BufferChunk> {
        self.queue.front()
    }

    /// Elements available in the front chunk
    pub fn elements(&self) -> usize {
        self.queue.front().map_or(0, BufferChunk::elements)
    }

    /// Elements queued across every chunk
    pub fn queued_elements(&self) -> usize {
        self.queue.iter().map(BufferChunk::elements).sum()
    }

    /// Elements consumed since construction
    pub fn total_elements(&self) -> usize {
        self.total_consumed
    }

    /// Mark `n` elements of the front chunk as used
    pub fn consume(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let Some(front) = self.queue.front_mut() else {
            return Err(Error::invalid_argument(
                "elements",
                format!("cannot consume {n} elements from empty port {}", self.id),
            ));
        };
        front.advance(n)?;
        if front.elements() == 0 {
            self.queue.pop_front();
        }
        self.total_consumed += n;
        Ok(())
    }
}

/// Queue of chunks produced by a block
#[derive(Debug)]
pub struct OutputPort {
    id: PortId,
    dtype: BufferDType,
    queue: VecDeque<BufferChunk>,
    total_produced: usize,
}

impl OutputPort {
    pub(crate) fn new(id: PortId, dtype: BufferDType) -> Self {
        Self {
            id,
            dtype,
            queue: VecDeque::new(),
            total_produced: 0,
        }
    }

    /// Port identifier
    pub fn id(&self) -> &PortId {
        &self.id
    }

    /// Element type, fixed at construction
    pub fn dtype(&self) -> BufferDType {
        self.dtype
    }

    /// Hand a chunk downstream; never blocks
    pub fn post_buffer(&mut self, chunk: BufferChunk) -> Result<()> {
        check_port_dtype(&self.id, self.dtype, chunk.dtype())?;
        self.total_produced += chunk.elements();
        self.queue.push_back(chunk);
        Ok(())
    }

    /// Oldest posted chunk
    pub fn pop_buffer(&mut self) -> Option<BufferChunk> {
        self.queue.pop_front()
    }

    /// Every posted chunk, oldest first
    pub fn drain(&mut self) -> Vec<BufferChunk> {
        self.queue.drain(..).collect()
    }

    /// Number of chunks waiting downstream
    pub fn queued_buffers(&self) -> usize {
        self.queue.len()
    }

    /// Elements posted since construction
    pub fn total_elements(&self) -> usize {
        self.total_produced
    }
}

/// The ports of one block
#[derive(Debug, Default)]
pub struct Ports {
    inputs: Vec<InputPort>,
    outputs: Vec<OutputPort>,
}

impl Ports {
    /// Register an input; ids must be unique
    pub fn add_input(&mut self, id: impl Into<PortId>, dtype: BufferDType) -> Result<()> {
        let id = id.into();
        if self.inputs.iter().any(|p| p.id == id) {
            return Err(Error::invalid_argument("port", format!("duplicate input {id}")));
        }
        self.inputs.push(InputPort::new(id, dtype));
        Ok(())
    }

    /// Register an output; ids must be unique
    pub fn add_output(&mut self, id: impl Into<PortId>, dtype: BufferDType) -> Result<()> {
        let id = id.into();
        if self.outputs.iter().any(|p| p.id == id) {
            return Err(Error::invalid_argument("port", format!("duplicate output {id}")));
        }
        self.outputs.push(OutputPort::new(id, dtype));
        Ok(())
    }

    /// Inputs in registration order
    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    /// Outputs in registration order
    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    /// Input `id`
    pub fn input(&self, id: &PortId) -> Result<&InputPort> {
        self.inputs
            .iter()
            .find(|p| p.id == *id)
            .ok_or_else(|| Error::UnknownPort(id.to_string()))
    }

    /// Input `id`, mutably
    pub fn input_mut(&mut self, id: &PortId) -> Result<&mut InputPort> {
        self.inputs
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| Error::UnknownPort(id.to_string()))
    }

    /// Output `id`
    pub fn output(&self, id: &PortId) -> Result<&OutputPort> {
        self.outputs
            .iter()
            .find(|p| p.id == *id)
            .ok_or_else(|| Error::UnknownPort(id.to_string()))
    }

    /// Output `id`, mutably
    pub fn output_mut(&mut self, id: &PortId) -> Result<&mut OutputPort> {
        self.outputs
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| Error::UnknownPort(id.to_string()))
    }

    /// This cycle's work info
    pub fn work_info(&self) -> WorkInfo {
        WorkInfo {
            min_elements: self.inputs.iter().map(InputPort::elements).min().unwrap_or(0),
        }
    }
}
