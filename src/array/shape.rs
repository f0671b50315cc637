//! Shape type: dimensions of an array

use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

/// Arrays crossing the bridge are 1D or 2D; a little headroom beyond that
/// keeps reshapes on the stack.
pub(crate) const STACK_DIMS: usize = 4;

/// Dimensions of a [`GpuArray`](super::GpuArray), outermost first
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// View as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Product of all dimensions (1 for a 0-d shape).
    #[inline]
    pub fn elements(&self) -> usize {
        self.0.iter().product()
    }

    /// Extent of the outermost dimension, 1 for 0-d shapes.
    #[inline]
    pub fn rows(&self) -> usize {
        self.0.first().copied().unwrap_or(1)
    }

    /// Elements per step of the outermost dimension.
    #[inline]
    pub fn row_elements(&self) -> usize {
        self.0.iter().skip(1).product()
    }

    /// Same shape with the outermost dimension replaced.
    pub(crate) fn with_rows(&self, rows: usize) -> Self {
        let mut shape = self.clone();
        if let Some(first) = shape.0.first_mut() {
            *first = rows;
        }
        shape
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_and_elements() {
        let shape = Shape::from([3, 4]);
        assert_eq!(shape.ndim(), 2);
        assert_eq!(shape.elements(), 12);
        assert_eq!(shape.rows(), 3);
        assert_eq!(shape.row_elements(), 4);
        assert_eq!(shape.with_rows(1).as_slice(), &[1, 4]);

        let scalar = Shape::default();
        assert_eq!(scalar.elements(), 1);
        assert_eq!(scalar.rows(), 1);
    }
}
