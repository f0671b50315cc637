//! Element type system shared by host buffers and GPU arrays
//!
//! This module provides the `DType` enum naming every element type a block
//! port can carry, the `BufferDType` pairing a `DType` with a per-sample
//! vector width, and the `DTypeSupport` capability descriptor that gates which
//! types an operation accepts.
//!
//! # Type names
//!
//! Names follow the host framework's spelling (`int16`, `float32`,
//! `complex_float64`, ...). Complex integer names are recognized so they can be
//! rejected with a dedicated error: no block supports them.

pub mod complex;
mod dispatch;
mod element;

pub use complex::{Complex64, Complex128};
pub use element::Element;

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DType Enum
// ============================================================================

/// Element types supported by gpuflow ports and arrays
///
/// # Discriminant Values (Serialization Stability)
///
/// - Floats: 0-9 (F64=0, F32=1)
/// - Signed ints: 10-19 (I64=10, I32=11, I16=12, I8=13)
/// - Unsigned ints: 20-29 (U64=20, U32=21, U16=22, U8=23)
/// - Complex: 40-49 (Complex64=40, Complex128=41)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DType {
    /// 64-bit floating point
    F64 = 0,
    /// 32-bit floating point
    F32 = 1,

    /// 64-bit signed integer
    I64 = 10,
    /// 32-bit signed integer
    I32 = 11,
    /// 16-bit signed integer
    I16 = 12,
    /// 8-bit signed integer
    I8 = 13,

    /// 64-bit unsigned integer
    U64 = 20,
    /// 32-bit unsigned integer
    U32 = 21,
    /// 16-bit unsigned integer
    U16 = 22,
    /// 8-bit unsigned integer
    U8 = 23,

    /// 64-bit complex (two f32: re, im)
    Complex64 = 40,
    /// 128-bit complex (two f64: re, im)
    Complex128 = 41,
}

/// Every supported dtype, in host-name order
pub const ALL_DTYPES: [DType; 12] = [
    DType::I8,
    DType::I16,
    DType::I32,
    DType::I64,
    DType::U8,
    DType::U16,
    DType::U32,
    DType::U64,
    DType::F32,
    DType::F64,
    DType::Complex64,
    DType::Complex128,
];

/// Complex integer names: recognized, never supported
const GLOBALLY_UNSUPPORTED: [&str; 8] = [
    "complex_int8",
    "complex_int16",
    "complex_int32",
    "complex_int64",
    "complex_uint8",
    "complex_uint16",
    "complex_uint32",
    "complex_uint64",
];

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Complex128 => 16,
            Self::F64 | Self::I64 | Self::U64 | Self::Complex64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 => 1,
        }
    }

    /// Returns true if this is a (real) floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32)
    }

    /// Returns true if this is a complex number type
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::I16 | Self::I8)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U64 | Self::U32 | Self::U16 | Self::U8)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns true for types needing double-precision device support
    #[inline]
    pub const fn needs_double(self) -> bool {
        matches!(self, Self::F64 | Self::Complex128)
    }

    /// The float type backing each half of a complex type
    #[inline]
    pub const fn complex_component_dtype(self) -> Option<Self> {
        match self {
            Self::Complex64 => Some(Self::F32),
            Self::Complex128 => Some(Self::F64),
            _ => None,
        }
    }

    /// The complex type whose halves are this float type
    #[inline]
    pub const fn to_complex(self) -> Option<Self> {
        match self {
            Self::F32 => Some(Self::Complex64),
            Self::F64 => Some(Self::Complex128),
            _ => None,
        }
    }

    /// Host-framework name (e.g., "int16", "complex_float32")
    pub const fn name(self) -> &'static str {
        match self {
            Self::F64 => "float64",
            Self::F32 => "float32",
            Self::I64 => "int64",
            Self::I32 => "int32",
            Self::I16 => "int16",
            Self::I8 => "int8",
            Self::U64 => "uint64",
            Self::U32 => "uint32",
            Self::U16 => "uint16",
            Self::U8 => "uint8",
            Self::Complex64 => "complex_float32",
            Self::Complex128 => "complex_float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if GLOBALLY_UNSUPPORTED.contains(&s) {
            return Err(Error::UnsupportedTypeName(s.to_string()));
        }

        let dtype = match s {
            "float" => Self::F32,
            "double" => Self::F64,
            "complex_float" => Self::Complex64,
            "complex_double" => Self::Complex128,
            other => ALL_DTYPES
                .into_iter()
                .find(|dtype| dtype.name() == other)
                .ok_or_else(|| {
                    Error::invalid_argument("dtype", format!("unknown type name \"{other}\""))
                })?,
        };
        Ok(dtype)
    }
}

// ============================================================================
// Buffer DType
// ============================================================================

/// Port element type: a `DType` plus the number of values per sample
///
/// A dimension of 1 is a plain scalar stream; a dimension of `d` packs `d`
/// consecutive values into one element, so element counts on ports are in
/// samples, not values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferDType {
    dtype: DType,
    dimension: usize,
}

impl BufferDType {
    /// Scalar buffer type
    pub const fn scalar(dtype: DType) -> Self {
        Self {
            dtype,
            dimension: 1,
        }
    }

    /// Buffer type with `dimension` values per element
    pub fn new(dtype: DType, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::invalid_argument(
                "dimension",
                "dtype dimension must be at least 1",
            ));
        }
        Ok(Self { dtype, dimension })
    }

    /// Same dimension, different element type
    pub const fn with_dtype(self, dtype: DType) -> Self {
        Self {
            dtype,
            dimension: self.dimension,
        }
    }

    /// Underlying element type
    #[inline]
    pub const fn dtype(self) -> DType {
        self.dtype
    }

    /// Values per element
    #[inline]
    pub const fn dimension(self) -> usize {
        self.dimension
    }

    /// Bytes per element (`dtype size * dimension`)
    #[inline]
    pub const fn size(self) -> usize {
        self.dtype.size_in_bytes() * self.dimension
    }

    /// Array shape holding `elements` samples of this type
    ///
    /// Scalars map to `[n]`; vector types to `[n, dimension]`.
    pub fn array_shape(self, elements: usize) -> Vec<usize> {
        if self.dimension == 1 {
            vec![elements]
        } else {
            vec![elements, self.dimension]
        }
    }
}

impl From<DType> for BufferDType {
    fn from(dtype: DType) -> Self {
        Self::scalar(dtype)
    }
}

impl FromStr for BufferDType {
    type Err = Error;

    /// Parses `"name"` or `"name:dimension"`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            None => Ok(Self::scalar(s.parse()?)),
            Some((name, dim)) => {
                let dimension = dim.trim().parse::<usize>().map_err(|_| {
                    Error::invalid_argument("dimension", format!("invalid dimension \"{dim}\""))
                })?;
                Self::new(name.parse()?, dimension)
            }
        }
    }
}

impl fmt::Display for BufferDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dimension == 1 {
            write!(f, "{}", self.dtype)
        } else {
            write!(f, "{}:{}", self.dtype, self.dimension)
        }
    }
}

// ============================================================================
// Capability Descriptor
// ============================================================================

/// Which type families an operation accepts
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DTypeSupport {
    /// Signed integers
    pub int: bool,
    /// Unsigned integers
    pub uint: bool,
    /// Real floats
    pub float: bool,
    /// Complex floats
    pub complex_float: bool,
}

impl DTypeSupport {
    /// Every family
    pub const ALL: Self = Self {
        int: true,
        uint: true,
        float: true,
        complex_float: true,
    };

    /// Integers and real floats
    pub const REAL: Self = Self {
        int: true,
        uint: true,
        float: true,
        complex_float: false,
    };

    /// Real floats only
    pub const FLOAT: Self = Self {
        int: false,
        uint: false,
        float: true,
        complex_float: false,
    };

    /// Complex floats only
    pub const COMPLEX_FLOAT: Self = Self {
        int: false,
        uint: false,
        float: false,
        complex_float: true,
    };

    /// Returns true if `dtype` belongs to an accepted family
    pub const fn supports(self, dtype: DType) -> bool {
        (dtype.is_signed_int() && self.int)
            || (dtype.is_unsigned_int() && self.uint)
            || (dtype.is_float() && self.float)
            || (dtype.is_complex() && self.complex_float)
    }

    const fn is_empty(self) -> bool {
        !(self.int || self.uint || self.float || self.complex_float)
    }
}

/// Reject `dtype` unless `support` accepts it
///
/// Called by every block factory before any array or runtime state is touched.
pub fn validate_dtype(dtype: DType, support: DTypeSupport, op: &'static str) -> Result<()> {
    if support.is_empty() {
        return Err(Error::internal(format!(
            "operation '{op}' declares no supported types"
        )));
    }
    if support.supports(dtype) {
        Ok(())
    } else {
        Err(Error::unsupported_dtype(dtype, op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(DType::I8.size_in_bytes(), 1);
        assert_eq!(DType::U16.size_in_bytes(), 2);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::Complex64.size_in_bytes(), 8);
        assert_eq!(DType::Complex128.size_in_bytes(), 16);
    }

    #[test]
    fn test_name_roundtrip_is_total() {
        for dtype in ALL_DTYPES {
            assert_eq!(dtype.name().parse::<DType>().unwrap(), dtype);
        }
    }

    #[test]
    fn test_complex_int_rejected_globally() {
        for name in GLOBALLY_UNSUPPORTED {
            let err = name.parse::<DType>().unwrap_err();
            assert!(matches!(err, Error::UnsupportedTypeName(ref n) if n == name));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!("bogus".parse::<DType>().is_err());
    }

    #[test]
    fn test_buffer_dtype_parse() {
        let bd: BufferDType = "float32:4".parse().unwrap();
        assert_eq!(bd.dtype(), DType::F32);
        assert_eq!(bd.dimension(), 4);
        assert_eq!(bd.size(), 16);
        assert_eq!(bd.to_string(), "float32:4");
        assert!("float32:0".parse::<BufferDType>().is_err());
        assert_eq!(bd.array_shape(3), vec![3, 4]);
        assert_eq!(BufferDType::scalar(DType::I8).array_shape(3), vec![3]);
    }

    #[test]
    fn test_validate_dtype() {
        assert!(validate_dtype(DType::F64, DTypeSupport::FLOAT, "sqrt").is_ok());
        let err = validate_dtype(DType::I16, DTypeSupport::FLOAT, "sqrt").unwrap_err();
        assert!(err.to_string().contains("int16"));
        assert!(validate_dtype(DType::Complex64, DTypeSupport::REAL, "min").is_err());
        assert!(validate_dtype(DType::U8, DTypeSupport::ALL, "add").is_ok());
    }

    #[test]
    fn test_complex_component_pairs() {
        assert_eq!(DType::Complex64.complex_component_dtype(), Some(DType::F32));
        assert_eq!(DType::F64.to_complex(), Some(DType::Complex128));
        assert_eq!(DType::I32.to_complex(), None);
    }
}
