//! Common test utilities
#![allow(dead_code)]

use gpuflow::array::GpuArray;
use gpuflow::config::RuntimeConfig;
use gpuflow::dtype::{BufferDType, Element};
use gpuflow::flow::{BufferChunk, PortId, Ports};
use gpuflow::runtime::{ArrayContext, Backend, DeviceCache};

pub const CUDA0: ArrayContext = ArrayContext::new(Backend::Cuda, 0);
pub const OPENCL0: ArrayContext = ArrayContext::new(Backend::OpenCl, 0);
pub const OPENCL1: ArrayContext = ArrayContext::new(Backend::OpenCl, 1);
pub const CPU0: ArrayContext = ArrayContext::new(Backend::Cpu, 0);

/// Install the test device set: one CUDA device, two OpenCL devices without
/// double support, one CPU device
///
/// Every test binary shares one process-wide cache, so every test calls this
/// first with the same configuration.
pub fn setup() {
    let config = RuntimeConfig::builder()
        .backend(Backend::Cuda, 1)
        .backend(Backend::OpenCl, 2)
        .without_double(Backend::OpenCl)
        .backend(Backend::Cpu, 1)
        .build()
        .expect("valid test configuration");
    DeviceCache::install(config).expect("device cache installs");
}

/// Deliver host samples to input `port`
pub fn push<T: Element>(ports: &mut Ports, port: impl Into<PortId>, data: &[T]) {
    ports
        .input_mut(&port.into())
        .unwrap()
        .push_buffer(BufferChunk::from_slice(data))
        .unwrap();
}

/// Deliver a device-resident array to input `port`
pub fn push_array(ports: &mut Ports, port: impl Into<PortId>, array: GpuArray) {
    let id = port.into();
    let dtype: BufferDType = ports.input(&id).unwrap().dtype();
    ports
        .input_mut(&id)
        .unwrap()
        .push_buffer(BufferChunk::from_array(array, dtype).unwrap())
        .unwrap();
}

/// Every sample posted to output `port`, oldest first
pub fn collect<T: Element>(ports: &mut Ports, port: impl Into<PortId>) -> Vec<T> {
    ports
        .output_mut(&port.into())
        .unwrap()
        .drain()
        .iter()
        .flat_map(|chunk| chunk.to_vec::<T>().unwrap())
        .collect()
}

/// Move every chunk posted on `from`'s output into `to`'s input
pub fn forward(
    from: &mut Ports,
    output: impl Into<PortId>,
    to: &mut Ports,
    input: impl Into<PortId>,
) {
    let input = input.into();
    for chunk in from.output_mut(&output.into()).unwrap().drain() {
        to.input_mut(&input).unwrap().push_buffer(chunk).unwrap();
    }
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}
