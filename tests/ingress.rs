//! Ingress integration tests
//!
//! Tests for turning input chunks into device arrays:
//! - Host import for every supported dtype
//! - Truncation to the shortest input (prefix law)
//! - Zero-copy reuse of same-backend resident arrays
//! - Cross-backend staging without touching the thread's active device
//! - Stacking numbered inputs into one 2D array

mod common;

use common::{CPU0, CUDA0, OPENCL0, OPENCL1, push, push_array, setup};
use gpuflow::array::GpuArray;
use gpuflow::bridge::ArrayBlock;
use gpuflow::dtype::{ALL_DTYPES, BufferDType, DType};
use gpuflow::error::{Error, ErrorKind};
use gpuflow::flow::{BufferChunk, PortId};
use gpuflow::runtime::{self, Backend, allocated_bytes};
use rand::Rng;

fn make_block(device: &str, dtype: impl Into<BufferDType> + Copy, inputs: usize) -> ArrayBlock {
    let buffer_dtype: BufferDType = dtype.into();
    let mut block = ArrayBlock::new(device, &[buffer_dtype.dtype()]).unwrap();
    for port in 0..inputs {
        block.setup_input(port, buffer_dtype).unwrap();
    }
    block
}

// ============================================================================
// Host Import
// ============================================================================

#[test]
fn test_host_ingress_every_dtype() {
    setup();
    for dtype in ALL_DTYPES {
        let mut block = make_block("CUDA:0", dtype, 1);
        let bytes = vec![0u8; 5 * dtype.size_in_bytes()];
        block
            .ports_mut()
            .input_mut(&PortId::Index(0))
            .unwrap()
            .push_buffer(BufferChunk::from_host_bytes(dtype.into(), bytes).unwrap())
            .unwrap();

        let array = block.input_array(0usize, false).unwrap();
        assert_eq!(array.elements(), 5, "{dtype}");
        assert_eq!(array.dtype(), dtype);
        assert_eq!(array.context(), CUDA0);
    }
}

#[test]
fn test_int16_values_survive_and_nothing_is_consumed() {
    setup();
    let mut block = make_block("CPU:0", DType::I16, 1);
    push(block.ports_mut(), 0usize, &[1i16, 2, 3, 4, 5]);

    let array = block.input_array(0usize, false).unwrap();
    assert_eq!(array.to_vec::<i16>().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(array.backend(), Backend::Cpu);
    assert_eq!(block.ports().inputs()[0].elements(), 5);
}

#[test]
fn test_vector_samples_become_2d() {
    setup();
    let dtype = BufferDType::new(DType::F32, 2).unwrap();
    let mut block = make_block("CPU:0", dtype, 1);
    block
        .ports_mut()
        .input_mut(&PortId::Index(0))
        .unwrap()
        .push_buffer(
            BufferChunk::from_host_bytes(
                dtype,
                bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).to_vec(),
            )
            .unwrap(),
        )
        .unwrap();

    let array = block.input_array(0usize, false).unwrap();
    assert_eq!(array.shape().as_slice(), &[3, 2]);
    assert_eq!(array.row(1).unwrap().to_vec::<f32>().unwrap(), vec![3.0, 4.0]);
}

#[test]
fn test_empty_port_yields_empty_array() {
    setup();
    let block = make_block("CPU:0", DType::U32, 1);
    let array = block.input_array(0usize, true).unwrap();
    assert_eq!(array.elements(), 0);
    assert_eq!(array.dtype(), DType::U32);
}

#[test]
fn test_unknown_port() {
    setup();
    let block = make_block("CPU:0", DType::U8, 1);
    assert!(matches!(
        block.input_array("missing", false),
        Err(Error::UnknownPort(_))
    ));
}

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn test_truncation_takes_prefix() {
    setup();
    let mut rng = rand::rng();
    let data: Vec<i32> = (0..32).map(|_| rng.random()).collect();

    for k in 0..=data.len() {
        let mut block = make_block("CPU:0", DType::I32, 2);
        push(block.ports_mut(), 0usize, &data);
        push(block.ports_mut(), 1usize, &data[..k]);

        let truncated = block.input_array(0usize, true).unwrap();
        assert_eq!(truncated.to_vec::<i32>().unwrap(), &data[..k], "k = {k}");

        let whole = block.input_array(0usize, false).unwrap();
        assert_eq!(whole.elements(), data.len());
    }
}

// ============================================================================
// Device-Resident Inputs
// ============================================================================

#[test]
fn test_host_input_rejected_when_arrays_assumed() {
    setup();
    let mut block = make_block("CPU:0", DType::F32, 1);
    block.set_assumes_array_inputs(true);
    push(block.ports_mut(), 0usize, &[1.0f32]);

    let err = block.input_array(0usize, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_same_backend_is_zero_copy() {
    // OpenCL:1 is used by this test only, so its allocation count is stable.
    setup();
    let source = GpuArray::from_vec(OPENCL1, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();

    let mut block = make_block("OpenCL:1", DType::F32, 2);
    block.set_assumes_array_inputs(true);
    push_array(block.ports_mut(), 0usize, source.clone());
    push_array(
        block.ports_mut(),
        1usize,
        GpuArray::from_vec(OPENCL1, vec![0.0f32; 3]).unwrap(),
    );

    let before = allocated_bytes(OPENCL1);
    let whole = block.input_array(0usize, false).unwrap();
    let truncated = block.input_array(0usize, true).unwrap();
    assert_eq!(allocated_bytes(OPENCL1), before);

    assert!(whole.shares_storage(&source));
    assert!(truncated.shares_storage(&source));
    assert_eq!(truncated.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0]);

    // Only the backend is compared: another device of the same backend is
    // reused as is.
    let mut other = make_block("OpenCL:0", DType::F32, 1);
    other.set_assumes_array_inputs(true);
    push_array(other.ports_mut(), 0usize, source.clone());
    let reused = other.input_array(0usize, false).unwrap();
    assert!(reused.shares_storage(&source));
    assert_eq!(reused.context(), OPENCL1);
}

#[test]
fn test_cross_backend_copy_leaves_active_device() {
    setup();
    let mut block = make_block("OpenCL:0", DType::F32, 2);
    block.set_assumes_array_inputs(true);
    push_array(
        block.ports_mut(),
        0usize,
        GpuArray::from_vec(CPU0, vec![1.0f32, 2.0, 3.0]).unwrap(),
    );
    push_array(
        block.ports_mut(),
        1usize,
        GpuArray::from_vec(CPU0, vec![9.0f32, 9.0]).unwrap(),
    );

    runtime::set_active_backend(Backend::Cuda).unwrap();
    let array = block.input_array(0usize, true).unwrap();

    assert_eq!(array.to_vec::<f32>().unwrap(), vec![1.0, 2.0]);
    assert_eq!(array.context(), OPENCL0);
    assert_eq!(runtime::active_backend().unwrap(), Backend::Cuda);
}

#[test]
fn test_cross_backend_copy_without_truncation() {
    setup();
    let values = [0.1f64, -2.5, 1e300, f64::MIN_POSITIVE, -0.0];
    let mut block = make_block("CPU:0", DType::F64, 2);
    block.set_assumes_array_inputs(true);
    push_array(
        block.ports_mut(),
        0usize,
        GpuArray::from_vec(CUDA0, values.to_vec()).unwrap(),
    );
    push_array(
        block.ports_mut(),
        1usize,
        GpuArray::from_vec(CUDA0, vec![0.0f64]).unwrap(),
    );

    let array = block.input_array(0usize, false).unwrap();
    assert_eq!(array.context(), CPU0);
    let out = array.to_vec::<f64>().unwrap();
    let bits: Vec<u64> = out.iter().map(|x| x.to_bits()).collect();
    let expected: Vec<u64> = values.iter().map(|x| x.to_bits()).collect();
    assert_eq!(bits, expected);
}

#[test]
fn test_cross_backend_copy_of_partially_consumed_vectors() {
    setup();
    let dtype = BufferDType::new(DType::I64, 2).unwrap();
    let mut block = make_block("CUDA:0", dtype, 1);
    block.set_assumes_array_inputs(true);
    let source = GpuArray::from_slice(OPENCL0, &[0i64, 1, 2, 3, 4, 5], [3, 2]).unwrap();
    push_array(block.ports_mut(), 0usize, source.clone());
    block
        .ports_mut()
        .input_mut(&PortId::Index(0))
        .unwrap()
        .consume(1)
        .unwrap();

    let array = block.input_array(0usize, true).unwrap();
    assert_eq!(array.context(), CUDA0);
    assert!(!array.shares_storage(&source));
    assert_eq!(array.shape().as_slice(), &[2, 2]);
    assert_eq!(array.to_vec::<i64>().unwrap(), vec![2, 3, 4, 5]);
    assert_eq!(block.ports().inputs()[0].elements(), 2);
}

// ============================================================================
// 2D Stacking
// ============================================================================

#[test]
fn test_stacking_consumes_shortest_length() {
    setup();
    let mut block = make_block("CPU:0", DType::I32, 3);
    push(block.ports_mut(), 0usize, &[1i32, 2, 3, 4]);
    push(block.ports_mut(), 1usize, &[5i32, 6, 7]);
    push(block.ports_mut(), 2usize, &[8i32, 9, 10, 11, 12]);

    let stacked = block.input_arrays_2d().unwrap();
    assert_eq!(stacked.shape().as_slice(), &[3, 3]);
    assert_eq!(
        stacked.to_vec::<i32>().unwrap(),
        vec![1, 2, 3, 5, 6, 7, 8, 9, 10]
    );

    let left: Vec<usize> = block.ports().inputs().iter().map(|p| p.elements()).collect();
    assert_eq!(left, vec![1, 0, 2]);
}

#[test]
fn test_stacking_requires_numbered_inputs_with_data() {
    setup();
    let mut named = ArrayBlock::new("CPU:0", &[DType::F32]).unwrap();
    named.setup_input("a", DType::F32).unwrap();
    push(named.ports_mut(), "a", &[1.0f32]);
    assert!(named.input_arrays_2d().is_err());

    let mut starved = make_block("CPU:0", DType::F32, 2);
    push(starved.ports_mut(), 0usize, &[1.0f32]);
    assert_eq!(
        starved.input_arrays_2d().unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}
