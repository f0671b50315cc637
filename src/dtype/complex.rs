//! Complex element types for `complex_float32` / `complex_float64` ports
//!
//! Both are stored interleaved (re, im, re, im...), so a complex buffer is
//! always backed by pairs of the matching float width and can be viewed as
//! bytes with `bytemuck`.

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

macro_rules! impl_complex {
    ($name:ident, $float:ty, $doc:literal) => {
        #[doc = $doc]
        #[repr(C)]
        #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
        pub struct $name {
            /// Real part
            pub re: $float,
            /// Imaginary part
            pub im: $float,
        }

        impl $name {
            /// Zero complex number
            pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

            /// Create a new complex number
            #[inline]
            pub const fn new(re: $float, im: $float) -> Self {
                Self { re, im }
            }

            /// r * e^(iθ)
            #[inline]
            pub fn from_polar(r: $float, theta: $float) -> Self {
                Self {
                    re: r * theta.cos(),
                    im: r * theta.sin(),
                }
            }

            /// |z|
            #[inline]
            pub fn magnitude(self) -> $float {
                self.re.hypot(self.im)
            }

            /// |z|², cheaper than `magnitude()` when only ordering matters
            #[inline]
            pub fn magnitude_squared(self) -> $float {
                self.re * self.re + self.im * self.im
            }

            /// a - bi
            #[inline]
            pub fn conj(self) -> Self {
                Self {
                    re: self.re,
                    im: -self.im,
                }
            }

            /// Multiply both parts by a real factor
            #[inline]
            pub fn scale(self, factor: $float) -> Self {
                Self {
                    re: self.re * factor,
                    im: self.im * factor,
                }
            }
        }

        impl Add for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self::new(self.re + rhs.re, self.im + rhs.im)
            }
        }

        impl Sub for $name {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self::new(self.re - rhs.re, self.im - rhs.im)
            }
        }

        impl Mul for $name {
            type Output = Self;

            #[inline]
            fn mul(self, rhs: Self) -> Self {
                Self::new(
                    self.re * rhs.re - self.im * rhs.im,
                    self.re * rhs.im + self.im * rhs.re,
                )
            }
        }

        impl Div for $name {
            type Output = Self;

            /// Division by zero yields NaN in both parts.
            #[inline]
            fn div(self, rhs: Self) -> Self {
                let denom = rhs.magnitude_squared();
                if denom == 0.0 {
                    Self::new(<$float>::NAN, <$float>::NAN)
                } else {
                    Self::new(
                        (self.re * rhs.re + self.im * rhs.im) / denom,
                        (self.im * rhs.re - self.re * rhs.im) / denom,
                    )
                }
            }
        }

        impl Neg for $name {
            type Output = Self;

            #[inline]
            fn neg(self) -> Self {
                Self::new(-self.re, -self.im)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.im >= 0.0 {
                    write!(f, "{}+{}i", self.re, self.im)
                } else {
                    write!(f, "{}{}i", self.re, self.im)
                }
            }
        }

        impl From<$float> for $name {
            #[inline]
            fn from(re: $float) -> Self {
                Self { re, im: 0.0 }
            }
        }
    };
}

impl_complex!(
    Complex64,
    f32,
    "64-bit complex number (two interleaved f32) backing `complex_float32`"
);
impl_complex!(
    Complex128,
    f64,
    "128-bit complex number (two interleaved f64) backing `complex_float64`"
);

impl From<Complex64> for Complex128 {
    #[inline]
    fn from(c: Complex64) -> Self {
        Self::new(c.re as f64, c.im as f64)
    }
}

impl From<Complex128> for Complex64 {
    #[inline]
    fn from(c: Complex128) -> Self {
        Self::new(c.re as f32, c.im as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, 4.0);

        assert_eq!(a + b, Complex64::new(4.0, 6.0));
        assert_eq!(a - b, Complex64::new(-2.0, -2.0));
        // (1+2i)(3+4i) = -5 + 10i
        assert_eq!(a * b, Complex64::new(-5.0, 10.0));
        assert_eq!(-a, Complex64::new(-1.0, -2.0));
        assert_eq!(b.magnitude(), 5.0);
    }

    #[test]
    fn test_division() {
        // 1/i = -i
        let q = Complex128::new(1.0, 0.0) / Complex128::new(0.0, 1.0);
        assert!(q.re.abs() < 1e-12);
        assert!((q.im + 1.0).abs() < 1e-12);

        let nan = Complex128::new(1.0, 1.0) / Complex128::ZERO;
        assert!(nan.re.is_nan() && nan.im.is_nan());
    }

    #[test]
    fn test_polar() {
        let z = Complex128::from_polar(1.0, std::f64::consts::PI);
        assert!((z.re + 1.0).abs() < 1e-12);
        assert!(z.im.abs() < 1e-12);
    }

    #[test]
    fn test_interleaved_layout() {
        assert_eq!(std::mem::size_of::<Complex64>(), 2 * std::mem::size_of::<f32>());
        assert_eq!(std::mem::size_of::<Complex128>(), 2 * std::mem::size_of::<f64>());

        let z = [Complex64::new(1.0, 2.0)];
        let parts: &[f32] = bytemuck::cast_slice(&z);
        assert_eq!(parts, &[1.0, 2.0]);
    }

    #[test]
    fn test_width_conversion() {
        let wide: Complex128 = Complex64::new(1.5, -2.5).into();
        assert_eq!(wide, Complex128::new(1.5, -2.5));
        let narrow: Complex64 = wide.into();
        assert_eq!(narrow, Complex64::new(1.5, -2.5));
    }
}
