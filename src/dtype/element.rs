//! Element trait for mapping Rust types to DType

use super::{Complex64, Complex128, DType};
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;

/// Trait for types that can be elements of a buffer or array
///
/// This trait connects Rust's type system to the runtime `DType`. It is
/// implemented for the twelve primitive and complex types a port can carry.
///
/// Integer arithmetic wraps on overflow and integer division by zero yields
/// zero, so kernels never panic on data values.
pub trait Element: Copy + Send + Sync + Pod + Zeroable + PartialEq + Debug + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Zero value
    fn zero() -> Self;

    /// Truthiness used by logical operations
    #[inline]
    fn is_nonzero(self) -> bool {
        self != Self::zero()
    }

    /// self + rhs
    fn add_elem(self, rhs: Self) -> Self;

    /// self - rhs
    fn sub_elem(self, rhs: Self) -> Self;

    /// self * rhs
    fn mul_elem(self, rhs: Self) -> Self;

    /// self / rhs
    fn div_elem(self, rhs: Self) -> Self;

    /// -self
    fn neg_elem(self) -> Self;

    /// |self| (complex: magnitude in the real part)
    fn abs_elem(self) -> Self;

    /// Smaller of the two (complex: by magnitude)
    fn min_elem(self, rhs: Self) -> Self;

    /// Larger of the two (complex: by magnitude)
    fn max_elem(self, rhs: Self) -> Self;
}

macro_rules! impl_int_element {
    ($t:ty, $dtype:expr, |$a:ident| $abs:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                if rhs == 0 { 0 } else { self.wrapping_div(rhs) }
            }

            #[inline]
            fn neg_elem(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn abs_elem(self) -> Self {
                let $a = self;
                $abs
            }

            #[inline]
            fn min_elem(self, rhs: Self) -> Self {
                Ord::min(self, rhs)
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                Ord::max(self, rhs)
            }
        }
    };
}

impl_int_element!(i8, DType::I8, |a| a.wrapping_abs());
impl_int_element!(i16, DType::I16, |a| a.wrapping_abs());
impl_int_element!(i32, DType::I32, |a| a.wrapping_abs());
impl_int_element!(i64, DType::I64, |a| a.wrapping_abs());
impl_int_element!(u8, DType::U8, |a| a);
impl_int_element!(u16, DType::U16, |a| a);
impl_int_element!(u32, DType::U32, |a| a);
impl_int_element!(u64, DType::U64, |a| a);

macro_rules! impl_float_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn neg_elem(self) -> Self {
                -self
            }

            #[inline]
            fn abs_elem(self) -> Self {
                self.abs()
            }

            #[inline]
            fn min_elem(self, rhs: Self) -> Self {
                self.min(rhs)
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                self.max(rhs)
            }
        }
    };
}

impl_float_element!(f32, DType::F32);
impl_float_element!(f64, DType::F64);

macro_rules! impl_complex_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn zero() -> Self {
                <$t>::ZERO
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn neg_elem(self) -> Self {
                -self
            }

            #[inline]
            fn abs_elem(self) -> Self {
                <$t>::new(self.magnitude(), 0.0)
            }

            #[inline]
            fn min_elem(self, rhs: Self) -> Self {
                if rhs.magnitude_squared() < self.magnitude_squared() {
                    rhs
                } else {
                    self
                }
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                if rhs.magnitude_squared() > self.magnitude_squared() {
                    rhs
                } else {
                    self
                }
            }
        }
    };
}

impl_complex_element!(Complex64, DType::Complex64);
impl_complex_element!(Complex128, DType::Complex128);
