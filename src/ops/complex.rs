//! Complex assembly and decomposition

use super::kernel::{map_binary, map_unary};
use super::{check_same_device, check_same_dtype, check_same_shape};
use crate::array::GpuArray;
use crate::error::Result;
use crate::{dispatch_complex_dtype, dispatch_float_dtype};

/// Interleave a real and an imaginary float array into a complex array
pub fn combine_complex(re: &GpuArray, im: &GpuArray) -> Result<GpuArray> {
    check_same_device(re, im)?;
    let dtype = check_same_dtype(re, im)?;
    check_same_shape(re, im)?;

    dispatch_float_dtype!(dtype, T => {
        let re_data = re.to_vec::<T>()?;
        let im_data = im.to_vec::<T>()?;
        let out = map_binary(&re_data, &im_data, |r: T, i: T| complex_of(r, i));
        GpuArray::from_slice(re.context(), &out, re.shape().clone())
    }, "combine_complex")
}

/// Real part of a complex array
pub fn real(a: &GpuArray) -> Result<GpuArray> {
    dispatch_complex_dtype!(a.dtype(), C, F => {
        let data = a.to_vec::<C>()?;
        let out: Vec<F> = map_unary(&data, |c: C| c.re);
        GpuArray::from_slice(a.context(), &out, a.shape().clone())
    }, "real")
}

/// Imaginary part of a complex array
pub fn imag(a: &GpuArray) -> Result<GpuArray> {
    dispatch_complex_dtype!(a.dtype(), C, F => {
        let data = a.to_vec::<C>()?;
        let out: Vec<F> = map_unary(&data, |c: C| c.im);
        GpuArray::from_slice(a.context(), &out, a.shape().clone())
    }, "imag")
}

/// Complex type whose parts are `T`
trait ComplexOf: Sized {
    type Complex: crate::dtype::Element;

    fn complex(re: Self, im: Self) -> Self::Complex;
}

impl ComplexOf for f32 {
    type Complex = crate::dtype::Complex64;

    fn complex(re: f32, im: f32) -> Self::Complex {
        crate::dtype::Complex64::new(re, im)
    }
}

impl ComplexOf for f64 {
    type Complex = crate::dtype::Complex128;

    fn complex(re: f64, im: f64) -> Self::Complex {
        crate::dtype::Complex128::new(re, im)
    }
}

#[inline]
fn complex_of<T: ComplexOf>(re: T, im: T) -> T::Complex {
    T::complex(re, im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::{Complex128, DType};
    use crate::runtime::{ArrayContext, Backend};

    const CPU: ArrayContext = ArrayContext::new(Backend::Cpu, 0);

    #[test]
    fn test_combine_then_split() {
        let re = GpuArray::from_vec(CPU, vec![1.0f64, 2.0]).unwrap();
        let im = GpuArray::from_vec(CPU, vec![-1.0f64, 0.5]).unwrap();
        let c = combine_complex(&re, &im).unwrap();
        assert_eq!(c.dtype(), DType::Complex128);
        assert_eq!(c.to_vec::<Complex128>().unwrap()[1], Complex128::new(2.0, 0.5));

        assert_eq!(real(&c).unwrap().to_vec::<f64>().unwrap(), vec![1.0, 2.0]);
        assert_eq!(imag(&c).unwrap().to_vec::<f64>().unwrap(), vec![-1.0, 0.5]);
    }

    #[test]
    fn test_rejects_wrong_families() {
        let ints = GpuArray::from_vec(CPU, vec![1i32]).unwrap();
        assert!(combine_complex(&ints, &ints).is_err());
        assert!(real(&ints).is_err());
    }
}
