//! Stride handling.
//!
//! Strides here are always expressed in elements, never bytes, and are signed
//! so that reversed host layouts can be represented.

use std::ops::Index;

use super::Layout;
use crate::error::{HostArrayError, Result};

/// Per-dimension element strides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Stride {
    strides: Vec<isize>,
}

impl Stride {
    pub fn new(strides: Vec<isize>) -> Self {
        Self { strides }
    }

    pub fn from_slice(strides: &[isize]) -> Self {
        Self {
            strides: strides.to_vec(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.strides.len()
    }

    pub fn as_slice(&self) -> &[isize] {
        &self.strides
    }

    pub fn into_vec(self) -> Vec<isize> {
        self.strides
    }

    /// Dense row-major strides: last dimension varies fastest.
    pub fn row_major(shape: &[usize]) -> Self {
        let mut strides = vec![0isize; shape.len()];
        let mut acc = 1isize;
        for i in (0..shape.len()).rev() {
            strides[i] = acc;
            acc *= shape[i] as isize;
        }
        Self { strides }
    }

    /// Dense column-major strides: first dimension varies fastest.
    pub fn column_major(shape: &[usize]) -> Self {
        let mut strides = vec![0isize; shape.len()];
        let mut acc = 1isize;
        for i in 0..shape.len() {
            strides[i] = acc;
            acc *= shape[i] as isize;
        }
        Self { strides }
    }

    /// Strides used when reshaping to `shape` under `layout`.
    ///
    /// Identical to [`Stride::row_major`] / [`Stride::column_major`] except
    /// that every length-1 dimension gets stride 0, which marks it as
    /// broadcastable. The zeroed stride does not change the strides of the
    /// other dimensions.
    pub fn for_layout(shape: &[usize], layout: Layout) -> Self {
        let mut strides = match layout {
            Layout::RowMajor => Self::row_major(shape),
            Layout::ColumnMajor => Self::column_major(shape),
        };
        for (s, &n) in strides.strides.iter_mut().zip(shape) {
            if n == 1 {
                *s = 0;
            }
        }
        strides
    }

    /// Element offset of `indices`.
    pub fn offset(&self, indices: &[usize]) -> Result<isize> {
        if indices.len() != self.strides.len() {
            return Err(HostArrayError::dimension_mismatch(self.strides.len(), indices.len()));
        }
        Ok(indices
            .iter()
            .zip(&self.strides)
            .map(|(&i, &s)| i as isize * s)
            .sum())
    }
}

impl Index<usize> for Stride {
    type Output = isize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.strides[index]
    }
}

impl AsRef<[isize]> for Stride {
    fn as_ref(&self) -> &[isize] {
        &self.strides
    }
}

impl From<Vec<isize>> for Stride {
    fn from(strides: Vec<isize>) -> Self {
        Self { strides }
    }
}

impl From<Stride> for Vec<isize> {
    fn from(stride: Stride) -> Self {
        stride.strides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        assert_eq!(Stride::row_major(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert_eq!(Stride::row_major(&[]).as_slice(), &[] as &[isize]);
    }

    #[test]
    fn test_column_major_strides() {
        assert_eq!(Stride::column_major(&[2, 3, 4]).as_slice(), &[1, 2, 6]);
    }

    #[test]
    fn test_degenerate_dimensions() {
        let strides = Stride::for_layout(&[2, 1, 3], Layout::RowMajor);
        assert_eq!(strides.as_slice(), &[3, 0, 1]);
        let strides = Stride::for_layout(&[2, 1, 3], Layout::ColumnMajor);
        assert_eq!(strides.as_slice(), &[1, 0, 2]);
        let strides = Stride::for_layout(&[1, 1], Layout::RowMajor);
        assert_eq!(strides.as_slice(), &[0, 0]);
    }

    #[test]
    fn test_offset_calculation() {
        let strides = Stride::new(vec![12, 4, 1]);
        assert_eq!(strides.offset(&[0, 0, 0]).unwrap(), 0);
        assert_eq!(strides.offset(&[1, 2, 3]).unwrap(), 23);
        assert!(strides.offset(&[1, 2]).is_err());
        let reversed = Stride::new(vec![-3, 1]);
        assert_eq!(reversed.offset(&[1, 2]).unwrap(), -1);
    }
}
