//! Owned runtime-rank layouts.

use std::fmt;

use super::{Layout, Stride, StridedLayout};
use crate::error::{HostArrayError, Result};

/// A shape paired with element strides, determined at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynamicDim {
    shape: Vec<usize>,
    strides: Stride,
}

impl DynamicDim {
    /// Row-major layout for `shape`, with stride 0 on length-1 dimensions.
    pub fn new(shape: impl Into<Vec<usize>>) -> Self {
        Self::with_layout(shape, Layout::RowMajor)
    }

    /// Layout for `shape` under `layout`, with stride 0 on length-1 dimensions.
    pub fn with_layout(shape: impl Into<Vec<usize>>, layout: Layout) -> Self {
        let shape = shape.into();
        let strides = Stride::for_layout(&shape, layout);
        Self { shape, strides }
    }

    /// Explicit element strides.
    pub fn with_strides(shape: impl Into<Vec<usize>>, strides: impl Into<Vec<isize>>) -> Result<Self> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.len() != strides.len() {
            return Err(HostArrayError::StrideLengthMismatch(shape.len(), strides.len()));
        }
        Ok(Self {
            shape,
            strides: Stride::new(strides),
        })
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.shape
    }

    pub fn element_strides(&self) -> &Stride {
        &self.strides
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<isize>) {
        (self.shape, self.strides.into_vec())
    }
}

impl StridedLayout for DynamicDim {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn stride(&self, axis: usize) -> isize {
        self.strides[axis]
    }
}

impl fmt::Display for DynamicDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_dim_creation() {
        let dim = DynamicDim::new(vec![2, 3, 4]);
        assert_eq!(dim.dimension(), 3);
        assert_eq!(dim.size(), 24);
        assert_eq!(dim.element_strides().as_slice(), &[12, 4, 1]);
        assert_eq!(dim.to_string(), "[2, 3, 4]");
    }

    #[test]
    fn test_with_strides() {
        let dim = DynamicDim::with_strides(vec![2, 3, 4], vec![24, 8, 2]).unwrap();
        assert_eq!(dim.stride(1), 8);
        assert!(DynamicDim::with_strides(vec![2, 3], vec![1]).is_err());
    }

    #[test]
    fn test_column_major() {
        let dim = DynamicDim::with_layout(vec![2, 1, 4], Layout::ColumnMajor);
        let (shape, strides) = dim.into_parts();
        assert_eq!(shape, vec![2, 1, 4]);
        assert_eq!(strides, vec![1, 0, 2]);
    }
}
