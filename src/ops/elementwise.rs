//! Elementwise arithmetic, unary math, logical ops and row reductions

use super::kernel::{map_binary, map_unary};
use super::{check_same_device, check_same_dtype, check_same_shape, matrix_dims};
use crate::array::GpuArray;
use crate::dtype::{DType, DTypeSupport, Element, validate_dtype};
use crate::error::{Error, Result};
use crate::{dispatch_complex_dtype, dispatch_dtype, dispatch_float_dtype, dispatch_real_dtype};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Binary arithmetic
// ============================================================================

/// Two-operand arithmetic
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// lhs + rhs
    Add,
    /// lhs - rhs
    Subtract,
    /// lhs * rhs
    Multiply,
    /// lhs / rhs
    Divide,
    /// min(lhs, rhs)
    Min,
    /// max(lhs, rhs)
    Max,
}

impl BinaryOp {
    /// Operation name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Types the operation accepts
    pub const fn support(self) -> DTypeSupport {
        match self {
            Self::Min | Self::Max => DTypeSupport::REAL,
            _ => DTypeSupport::ALL,
        }
    }

    #[inline]
    fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        match self {
            Self::Add => lhs.add_elem(rhs),
            Self::Subtract => lhs.sub_elem(rhs),
            Self::Multiply => lhs.mul_elem(rhs),
            Self::Divide => lhs.div_elem(rhs),
            Self::Min => lhs.min_elem(rhs),
            Self::Max => lhs.max_elem(rhs),
        }
    }
}

/// `lhs op rhs` elementwise
pub fn binary(op: BinaryOp, lhs: &GpuArray, rhs: &GpuArray) -> Result<GpuArray> {
    check_same_device(lhs, rhs)?;
    let dtype = check_same_dtype(lhs, rhs)?;
    check_same_shape(lhs, rhs)?;
    validate_dtype(dtype, op.support(), op.name())?;

    dispatch_dtype!(dtype, T => {
        let a = lhs.to_vec::<T>()?;
        let b = rhs.to_vec::<T>()?;
        let out = map_binary(&a, &b, |x: T, y: T| op.apply(x, y));
        GpuArray::from_slice(lhs.context(), &out, lhs.shape().clone())
    })
}

/// Fold the rows of a 2D array with `op`, left to right
///
/// Returns a 1D array as wide as one row.
pub fn reduce_rows(op: BinaryOp, a: &GpuArray) -> Result<GpuArray> {
    validate_dtype(a.dtype(), op.support(), op.name())?;
    let (rows, cols) = matrix_dims(a, op.name())?;
    if rows == 0 {
        return Err(Error::invalid_argument("array", "cannot reduce zero rows"));
    }

    dispatch_dtype!(a.dtype(), T => {
        let data = a.to_vec::<T>()?;
        let mut acc = data[..cols].to_vec();
        for row in data.chunks_exact(cols.max(1)).skip(1).take(rows - 1) {
            acc = map_binary(&acc, row, |x: T, y: T| op.apply(x, y));
        }
        GpuArray::from_slice(a.context(), &acc, [cols])
    })
}

// ============================================================================
// Unary math
// ============================================================================

/// Single-operand math
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// |x|; complex input yields the real magnitude
    Abs,
    /// -x
    Negate,
    /// Square root
    Sqrt,
    /// e^x
    Exp,
    /// Natural logarithm
    Log,
}

impl UnaryOp {
    /// Operation name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Negate => "negate",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Log => "log",
        }
    }

    /// Types the operation accepts
    pub const fn support(self) -> DTypeSupport {
        match self {
            Self::Abs | Self::Negate => DTypeSupport::ALL,
            Self::Sqrt | Self::Exp | Self::Log => DTypeSupport::FLOAT,
        }
    }

    /// Element type produced for `input`
    pub fn output_dtype(self, input: DType) -> DType {
        match self {
            Self::Abs => input.complex_component_dtype().unwrap_or(input),
            _ => input,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnaryOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "abs" => Ok(Self::Abs),
            "negate" => Ok(Self::Negate),
            "sqrt" => Ok(Self::Sqrt),
            "exp" => Ok(Self::Exp),
            "log" => Ok(Self::Log),
            _ => Err(Error::invalid_argument(
                "operation",
                format!("unknown unary operation \"{s}\""),
            )),
        }
    }
}

/// `op(a)` elementwise
pub fn unary(op: UnaryOp, a: &GpuArray) -> Result<GpuArray> {
    validate_dtype(a.dtype(), op.support(), op.name())?;
    let ctx = a.context();
    let shape = a.shape().clone();

    match op {
        UnaryOp::Abs if a.dtype().is_complex() => {
            dispatch_complex_dtype!(a.dtype(), C, F => {
                let data = a.to_vec::<C>()?;
                let out: Vec<F> = map_unary(&data, |c: C| c.magnitude());
                GpuArray::from_slice(ctx, &out, shape)
            }, op.name())
        }
        UnaryOp::Abs | UnaryOp::Negate => dispatch_dtype!(a.dtype(), T => {
            let data = a.to_vec::<T>()?;
            let out = if op == UnaryOp::Abs {
                map_unary(&data, T::abs_elem)
            } else {
                map_unary(&data, T::neg_elem)
            };
            GpuArray::from_slice(ctx, &out, shape)
        }),
        UnaryOp::Sqrt | UnaryOp::Exp | UnaryOp::Log => {
            dispatch_float_dtype!(a.dtype(), T => {
                let data = a.to_vec::<T>()?;
                let out = match op {
                    UnaryOp::Sqrt => map_unary(&data, |x: T| x.sqrt()),
                    UnaryOp::Exp => map_unary(&data, |x: T| x.exp()),
                    _ => map_unary(&data, |x: T| x.ln()),
                };
                GpuArray::from_slice(ctx, &out, shape)
            }, op.name())
        }
    }
}

// ============================================================================
// Logical
// ============================================================================

/// Truth-valued combination of two operands, producing int8 0/1
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// lhs && rhs
    And,
    /// lhs || rhs
    Or,
    /// lhs != rhs (as truth values)
    Xor,
}

impl LogicalOp {
    /// Operation name
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    /// Types the operation accepts
    pub const fn support(self) -> DTypeSupport {
        DTypeSupport::REAL
    }

    /// Element type of every logical result
    pub const OUTPUT_DTYPE: DType = DType::I8;

    #[inline]
    fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Self::And => lhs && rhs,
            Self::Or => lhs || rhs,
            Self::Xor => lhs != rhs,
        }
    }
}

/// `lhs op rhs` over truth values; the result is int8
pub fn logical(op: LogicalOp, lhs: &GpuArray, rhs: &GpuArray) -> Result<GpuArray> {
    check_same_device(lhs, rhs)?;
    let dtype = check_same_dtype(lhs, rhs)?;
    check_same_shape(lhs, rhs)?;
    validate_dtype(dtype, op.support(), op.name())?;

    dispatch_real_dtype!(dtype, T => {
        let a = lhs.to_vec::<T>()?;
        let b = rhs.to_vec::<T>()?;
        let out: Vec<i8> =
            map_binary(&a, &b, |x: T, y: T| op.apply(x.is_nonzero(), y.is_nonzero()) as i8);
        GpuArray::from_slice(lhs.context(), &out, lhs.shape().clone())
    }, op.name())
}

/// Fold the rows of a 2D array with a logical op; the result is int8
pub fn reduce_rows_logical(op: LogicalOp, a: &GpuArray) -> Result<GpuArray> {
    validate_dtype(a.dtype(), op.support(), op.name())?;
    let (rows, cols) = matrix_dims(a, op.name())?;
    if rows == 0 {
        return Err(Error::invalid_argument("array", "cannot reduce zero rows"));
    }

    dispatch_real_dtype!(a.dtype(), T => {
        let data = a.to_vec::<T>()?;
        let mut acc: Vec<bool> = data[..cols].iter().map(|x| x.is_nonzero()).collect();
        for row in data.chunks_exact(cols.max(1)).skip(1).take(rows - 1) {
            for (acc, x) in acc.iter_mut().zip(row) {
                *acc = op.apply(*acc, x.is_nonzero());
            }
        }
        let out: Vec<i8> = acc.into_iter().map(i8::from).collect();
        GpuArray::from_slice(a.context(), &out, [cols])
    }, op.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Complex64;
    use crate::runtime::{ArrayContext, Backend};

    const CPU: ArrayContext = ArrayContext::new(Backend::Cpu, 0);

    #[test]
    fn test_binary_ops() {
        let a = GpuArray::from_vec(CPU, vec![1i16, 5, -3]).unwrap();
        let b = GpuArray::from_vec(CPU, vec![2i16, 0, 4]).unwrap();

        let sum = binary(BinaryOp::Add, &a, &b).unwrap();
        assert_eq!(sum.to_vec::<i16>().unwrap(), vec![3, 5, 1]);
        let quot = binary(BinaryOp::Divide, &a, &b).unwrap();
        assert_eq!(quot.to_vec::<i16>().unwrap(), vec![0, 0, 0]);
        let max = binary(BinaryOp::Max, &a, &b).unwrap();
        assert_eq!(max.to_vec::<i16>().unwrap(), vec![2, 5, 4]);
    }

    #[test]
    fn test_min_rejects_complex() {
        let a = GpuArray::from_vec(CPU, vec![Complex64::new(1.0, 1.0)]).unwrap();
        let err = binary(BinaryOp::Min, &a, &a).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDType { .. }));
        assert!(binary(BinaryOp::Multiply, &a, &a).is_ok());
    }

    #[test]
    fn test_unary_ops() {
        let a = GpuArray::from_vec(CPU, vec![4.0f32, 9.0]).unwrap();
        assert_eq!(unary(UnaryOp::Sqrt, &a).unwrap().to_vec::<f32>().unwrap(), vec![2.0, 3.0]);
        assert_eq!(
            unary(UnaryOp::Negate, &a).unwrap().to_vec::<f32>().unwrap(),
            vec![-4.0, -9.0]
        );

        let ints = GpuArray::from_vec(CPU, vec![4i32]).unwrap();
        assert!(unary(UnaryOp::Log, &ints).is_err());

        let c = GpuArray::from_vec(CPU, vec![Complex64::new(3.0, 4.0)]).unwrap();
        let mag = unary(UnaryOp::Abs, &c).unwrap();
        assert_eq!(mag.dtype(), DType::F32);
        assert_eq!(mag.to_vec::<f32>().unwrap(), vec![5.0]);
        assert_eq!(UnaryOp::Abs.output_dtype(DType::Complex64), DType::F32);
    }

    #[test]
    fn test_logical_and_row_reductions() {
        let a = GpuArray::from_vec(CPU, vec![0u8, 1, 2, 0]).unwrap();
        let b = GpuArray::from_vec(CPU, vec![0u8, 0, 3, 7]).unwrap();
        let and = logical(LogicalOp::And, &a, &b).unwrap();
        assert_eq!(and.dtype(), DType::I8);
        assert_eq!(and.to_vec::<i8>().unwrap(), vec![0, 0, 1, 0]);

        let m = GpuArray::from_slice(CPU, &[1i32, 2, 3, 10, 20, 30, 100, 200, 300], [3, 3]).unwrap();
        let sum = reduce_rows(BinaryOp::Add, &m).unwrap();
        assert_eq!(sum.to_vec::<i32>().unwrap(), vec![111, 222, 333]);

        let bits = GpuArray::from_slice(CPU, &[1i32, 0, 1, 1, 0, 0], [3, 2]).unwrap();
        let xor = reduce_rows_logical(LogicalOp::Xor, &bits).unwrap();
        assert_eq!(xor.to_vec::<i8>().unwrap(), vec![0, 1]);
        let or = reduce_rows_logical(LogicalOp::Or, &bits).unwrap();
        assert_eq!(or.to_vec::<i8>().unwrap(), vec![1, 1]);
    }
}
