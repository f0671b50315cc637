//! Element type conversion

use super::kernel::map_unary;
use crate::array::GpuArray;
use crate::dtype::{Complex64, Complex128, DType};
use crate::error::{Error, Result};
use crate::{dispatch_complex_dtype, dispatch_real_dtype};
use num_traits::AsPrimitive;

/// Check that `input` can be converted to `output`
///
/// Every pair is allowed except complex to real, which would silently drop
/// the imaginary part.
pub fn cast_support(input: DType, output: DType) -> Result<()> {
    if input.is_complex() && !output.is_complex() {
        return Err(Error::invalid_argument(
            "dtype",
            format!("cannot cast complex type {input} to scalar type {output}"),
        ));
    }
    Ok(())
}

/// Convert every element of `a` to `dtype`
///
/// Real conversions follow `as` semantics (truncation toward zero, saturation
/// for float to int). Real to complex sets the imaginary part to zero.
pub fn cast(a: &GpuArray, dtype: DType) -> Result<GpuArray> {
    cast_support(a.dtype(), dtype)?;
    let ctx = a.context();
    let shape = a.shape().clone();

    if a.dtype() == dtype {
        return a.copy_to(ctx);
    }

    match (a.dtype().is_complex(), dtype.is_complex()) {
        (false, false) => dispatch_real_dtype!(a.dtype(), S => {
            let data = a.to_vec::<S>()?;
            dispatch_real_dtype!(dtype, D => {
                let out: Vec<D> = map_unary(&data, |x: S| AsPrimitive::<D>::as_(x));
                GpuArray::from_slice(ctx, &out, shape)
            }, "cast")
        }, "cast"),
        (false, true) => dispatch_real_dtype!(a.dtype(), S => {
            let data = a.to_vec::<S>()?;
            dispatch_complex_dtype!(dtype, C, F => {
                let out: Vec<C> = map_unary(&data, |x: S| C::new(AsPrimitive::<F>::as_(x), 0.0));
                GpuArray::from_slice(ctx, &out, shape)
            }, "cast")
        }, "cast"),
        (true, true) => {
            if dtype == DType::Complex128 {
                let data = a.to_vec::<Complex64>()?;
                let out: Vec<Complex128> = map_unary(&data, |c: Complex64| Complex128::from(c));
                GpuArray::from_slice(ctx, &out, shape)
            } else {
                let data = a.to_vec::<Complex128>()?;
                let out: Vec<Complex64> = map_unary(&data, |c: Complex128| Complex64::from(c));
                GpuArray::from_slice(ctx, &out, shape)
            }
        }
        (true, false) => Err(Error::internal("complex to real cast passed validation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ArrayContext, Backend};

    const CPU: ArrayContext = ArrayContext::new(Backend::Cpu, 0);

    #[test]
    fn test_real_casts() {
        let a = GpuArray::from_vec(CPU, vec![1.9f32, -2.5, 300.0]).unwrap();
        let ints = cast(&a, DType::I32).unwrap();
        assert_eq!(ints.to_vec::<i32>().unwrap(), vec![1, -2, 300]);
        let bytes = cast(&a, DType::U8).unwrap();
        assert_eq!(bytes.to_vec::<u8>().unwrap(), vec![1, 0, 255]);

        let wide = cast(&ints, DType::F64).unwrap();
        assert_eq!(wide.to_vec::<f64>().unwrap(), vec![1.0, -2.0, 300.0]);
    }

    #[test]
    fn test_complex_casts() {
        let a = GpuArray::from_vec(CPU, vec![2i16, -1]).unwrap();
        let c = cast(&a, DType::Complex64).unwrap();
        assert_eq!(
            c.to_vec::<Complex64>().unwrap(),
            vec![Complex64::new(2.0, 0.0), Complex64::new(-1.0, 0.0)]
        );
        let wide = cast(&c, DType::Complex128).unwrap();
        assert_eq!(wide.to_vec::<Complex128>().unwrap()[0], Complex128::new(2.0, 0.0));

        assert!(cast(&c, DType::F32).is_err());
        assert!(cast_support(DType::Complex128, DType::I8).is_err());
    }

    #[test]
    fn test_same_type_cast_copies() {
        let a = GpuArray::from_vec(CPU, vec![7u64]).unwrap();
        let b = cast(&a, DType::U64).unwrap();
        assert!(!b.shares_storage(&a));
        assert_eq!(b.to_vec::<u64>().unwrap(), vec![7]);
    }
}
