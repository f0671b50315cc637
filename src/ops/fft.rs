//! Fast Fourier transforms along the last dimension
//!
//! Power-of-two frame lengths use the Stockham autosort radix-2 algorithm;
//! other lengths fall back to a direct DFT. Both single and double precision
//! inputs are transformed in `Complex128` and converted back.
//!
//! # Algorithm: Stockham Radix-2 FFT
//!
//! ```text
//! For each stage s = 0..log2(N):
//!     half_m = 2^s
//!     m = 2^(s+1)
//!     For each group g = 0..(N/m):
//!         For each butterfly b = 0..half_m:
//!             twiddle = exp(sign * 2πi * b / m)
//!             even = src[g * half_m + b]
//!             odd = src[N/2 + g * half_m + b] * twiddle
//!             dst[g * m + b] = even + odd
//!             dst[g * m + b + half_m] = even - odd
//!     swap(src, dst)
//! ```
//!
//! No implicit 1/N scaling is applied in either direction; callers pass the
//! normalization factor they want.

use crate::array::{GpuArray, Shape};
use crate::dtype::{Complex64, Complex128, DType};
use crate::error::{Error, Result};
use crate::{dispatch_complex_dtype, dispatch_float_dtype};
use std::f64::consts::PI;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Transform direction
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FftDirection {
    /// exp(-2πi k n / N)
    Forward,
    /// exp(+2πi k n / N)
    Inverse,
}

impl FftDirection {
    #[inline]
    fn is_inverse(self) -> bool {
        self == Self::Inverse
    }
}

/// Number of complex outputs of a real forward transform of `n` samples
pub const fn rfft_len(n: usize) -> usize {
    n / 2 + 1
}

/// Number of real outputs of a complex-to-real transform of `num_bins` bins
///
/// An odd bin count reconstructs an odd-length signal.
pub const fn irfft_len(num_bins: usize) -> usize {
    if num_bins == 0 {
        0
    } else {
        2 * (num_bins - 1) + num_bins % 2
    }
}

/// Complex-to-complex transform of every frame, scaled by `norm`
pub fn fft(a: &GpuArray, direction: FftDirection, norm: f64) -> Result<GpuArray> {
    let n = frame_len(a, "fft")?;
    let mut data = to_complex128(a, "fft")?;
    transform_frames(&mut data, n, direction.is_inverse());
    scale(&mut data, norm);
    from_complex128(a, a.dtype(), a.shape().clone(), data)
}

/// Real-to-complex forward transform of every frame, scaled by `norm`
///
/// Each frame of `n` real samples yields `n/2 + 1` complex bins.
pub fn rfft(a: &GpuArray, norm: f64) -> Result<GpuArray> {
    let n = frame_len(a, "rfft")?;
    let out_dtype = a
        .dtype()
        .to_complex()
        .ok_or_else(|| Error::unsupported_dtype(a.dtype(), "rfft"))?;

    let mut data: Vec<Complex128> = dispatch_float_dtype!(a.dtype(), T => {
        a.to_vec::<T>()?
            .into_iter()
            .map(|x| Complex128::new(x as f64, 0.0))
            .collect()
    }, "rfft");
    transform_frames(&mut data, n, false);

    let bins = rfft_len(n);
    let mut out: Vec<Complex128> = data
        .chunks_exact(n)
        .flat_map(|frame| &frame[..bins])
        .copied()
        .collect();
    scale(&mut out, norm);
    from_complex128(a, out_dtype, last_dim(a.shape(), bins), out)
}

/// Complex-to-real inverse transform of every frame, scaled by `norm`
///
/// Each frame of `m` Hermitian bins yields `irfft_len(m)` real samples.
pub fn irfft(a: &GpuArray, norm: f64) -> Result<GpuArray> {
    let bins = frame_len(a, "irfft")?;
    let out_dtype = a
        .dtype()
        .complex_component_dtype()
        .ok_or_else(|| Error::unsupported_dtype(a.dtype(), "irfft"))?;
    let n = irfft_len(bins);
    let spectrum = to_complex128(a, "irfft")?;

    // Rebuild the full spectrum from its non-negative half.
    let mut full = Vec::with_capacity(spectrum.len() / bins * n);
    for frame in spectrum.chunks_exact(bins) {
        for k in 0..n {
            let value = if k < bins {
                frame[k]
            } else {
                frame[n - k].conj()
            };
            full.push(value);
        }
    }
    if n > 0 {
        transform_frames(&mut full, n, true);
    }

    let ctx = a.context();
    let shape = last_dim(a.shape(), n);
    dispatch_float_dtype!(out_dtype, T => {
        let out: Vec<T> = full.iter().map(|c| (c.re * norm) as T).collect();
        GpuArray::from_slice(ctx, &out, shape)
    }, "irfft")
}

fn frame_len(a: &GpuArray, op: &'static str) -> Result<usize> {
    if a.ndim() == 0 || a.ndim() > 2 {
        return Err(Error::invalid_argument(
            "array",
            format!("{op} needs a 1D or 2D array, got shape {:?}", a.shape()),
        ));
    }
    let n = a.shape()[a.ndim() - 1];
    if n == 0 {
        return Err(Error::invalid_argument("array", format!("{op} of an empty frame")));
    }
    Ok(n)
}

fn last_dim(shape: &Shape, len: usize) -> Shape {
    let mut dims = shape.to_vec();
    if let Some(last) = dims.last_mut() {
        *last = len;
    }
    Shape::from(dims)
}

fn to_complex128(a: &GpuArray, op: &'static str) -> Result<Vec<Complex128>> {
    dispatch_complex_dtype!(a.dtype(), C, F => {
        Ok(a.to_vec::<C>()?.into_iter().map(Complex128::from).collect())
    }, op)
}

fn from_complex128(
    like: &GpuArray,
    dtype: DType,
    shape: Shape,
    data: Vec<Complex128>,
) -> Result<GpuArray> {
    match dtype {
        DType::Complex128 => GpuArray::from_slice(like.context(), &data, shape),
        DType::Complex64 => {
            let narrow: Vec<Complex64> = data.into_iter().map(Complex64::from).collect();
            GpuArray::from_slice(like.context(), &narrow, shape)
        }
        other => Err(Error::unsupported_dtype(other, "fft")),
    }
}

fn scale(data: &mut [Complex128], norm: f64) {
    if norm != 1.0 {
        for value in data.iter_mut() {
            *value = value.scale(norm);
        }
    }
}

/// Transform consecutive frames of length `n` in place
fn transform_frames(data: &mut [Complex128], n: usize, inverse: bool) {
    #[cfg(feature = "rayon")]
    if data.len() >= super::kernel::PARALLEL_THRESHOLD && data.len() > n {
        data.par_chunks_mut(n)
            .for_each(|frame| transform_frame(frame, inverse));
        return;
    }

    for frame in data.chunks_mut(n) {
        transform_frame(frame, inverse);
    }
}

fn transform_frame(frame: &mut [Complex128], inverse: bool) {
    let n = frame.len();
    let result = if n.is_power_of_two() {
        stockham(frame, inverse)
    } else {
        dft(frame, inverse)
    };
    frame.copy_from_slice(&result);
}

#[inline]
fn twiddle(sign: f64, k: usize, m: usize) -> Complex128 {
    let theta = sign * 2.0 * PI * (k as f64) / (m as f64);
    Complex128::new(theta.cos(), theta.sin())
}

fn stockham(input: &[Complex128], inverse: bool) -> Vec<Complex128> {
    let n = input.len();
    let sign = if inverse { 1.0 } else { -1.0 };

    let mut src = input.to_vec();
    let mut dst = vec![Complex128::ZERO; n];

    let mut half_m = 1;
    while half_m < n {
        let m = half_m * 2;
        for g in 0..n / m {
            for b in 0..half_m {
                let even = src[g * half_m + b];
                let odd = src[n / 2 + g * half_m + b] * twiddle(sign, b, m);
                dst[g * m + b] = even + odd;
                dst[g * m + b + half_m] = even - odd;
            }
        }
        std::mem::swap(&mut src, &mut dst);
        half_m = m;
    }

    src
}

fn dft(input: &[Complex128], inverse: bool) -> Vec<Complex128> {
    let n = input.len();
    let sign = if inverse { 1.0 } else { -1.0 };

    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .fold(Complex128::ZERO, |acc, (j, &x)| {
                    acc + x * twiddle(sign, (j * k) % n, n)
                })
        })
        .collect()
}
