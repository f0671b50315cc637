//! DType dispatch: the single table mapping `DType` to concrete Rust types
//!
//! Every typed kernel in the crate is written once, generically, and reaches
//! its concrete element type through one of these macros instead of repeating
//! a `match` on `DType`.
//!
//! # Usage
//!
//! ```ignore
//! fn bytes_per_value(dtype: DType) -> usize {
//!     dispatch_dtype!(dtype, T => { std::mem::size_of::<T>() })
//! }
//! ```
//!
//! - `dispatch_dtype!` covers every `DType` and never fails.
//! - `dispatch_real_dtype!` covers integers and real floats; complex types
//!   return `Error::UnsupportedDType` from the enclosing function.
//! - `dispatch_float_dtype!` covers `F32`/`F64` only.
//! - `dispatch_complex_dtype!` binds both the complex type and its float half.

/// Dispatch over every `DType`
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::Complex64 => {
                type $T = $crate::dtype::Complex64;
                $body
            }
            $crate::dtype::DType::Complex128 => {
                type $T = $crate::dtype::Complex128;
                $body
            }
        }
    };
}

/// Dispatch over integer and real float dtypes
#[macro_export]
macro_rules! dispatch_real_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            other @ ($crate::dtype::DType::Complex64 | $crate::dtype::DType::Complex128) => {
                return Err($crate::error::Error::unsupported_dtype(other, $error_op));
            }
        }
    };
}

/// Dispatch over `F32`/`F64`
#[macro_export]
macro_rules! dispatch_float_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            other => {
                return Err($crate::error::Error::unsupported_dtype(other, $error_op));
            }
        }
    };
}

/// Dispatch over complex dtypes, binding the complex type and its float half
#[macro_export]
macro_rules! dispatch_complex_dtype {
    ($dtype:expr, $C:ident, $F:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::Complex64 => {
                type $C = $crate::dtype::Complex64;
                #[allow(dead_code)]
                type $F = f32;
                $body
            }
            $crate::dtype::DType::Complex128 => {
                type $C = $crate::dtype::Complex128;
                #[allow(dead_code)]
                type $F = f64;
                $body
            }
            other => {
                return Err($crate::error::Error::unsupported_dtype(other, $error_op));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::dtype::{ALL_DTYPES, DType, Element};
    use crate::error::Result;

    fn size_via_dispatch(dtype: DType) -> usize {
        crate::dispatch_dtype!(dtype, T => { std::mem::size_of::<T>() })
    }

    fn dtype_via_dispatch(dtype: DType) -> DType {
        crate::dispatch_dtype!(dtype, T => { <T as Element>::DTYPE })
    }

    fn real_only(dtype: DType) -> Result<usize> {
        crate::dispatch_real_dtype!(dtype, T => { Ok(std::mem::size_of::<T>()) }, "real_only")
    }

    #[test]
    fn test_dispatch_table_agrees_with_dtype() {
        for dtype in ALL_DTYPES {
            assert_eq!(size_via_dispatch(dtype), dtype.size_in_bytes());
            assert_eq!(dtype_via_dispatch(dtype), dtype);
        }
    }

    #[test]
    fn test_real_dispatch_rejects_complex() {
        assert_eq!(real_only(DType::U16).unwrap(), 2);
        assert!(real_only(DType::Complex64).is_err());
    }
}
