//! Dimension system for strided views.
//!
//! This module provides the layout vocabulary shared by host buffers and
//! views: memory layouts, element strides, backstrides, and the broadcasting
//! rules used to iterate a view against a larger target shape.

pub mod backstride;
pub mod dynamic;
pub mod shape;
pub mod stride;

pub use backstride::Backstrides;
pub use dynamic::DynamicDim;
pub use shape::{broadcast_shape, is_dense};
pub use stride::Stride;

/// Memory layout used when computing strides for a new shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// Last dimension varies fastest.
    #[default]
    RowMajor,
    /// First dimension varies fastest.
    ColumnMajor,
}

/// A shape with per-dimension element strides.
pub trait StridedLayout {
    /// Per-dimension element counts.
    fn shape(&self) -> &[usize];

    /// Element stride of dimension `axis`.
    fn stride(&self, axis: usize) -> isize;

    /// Number of dimensions.
    fn dimension(&self) -> usize {
        self.shape().len()
    }

    /// All element strides.
    fn strides(&self) -> Vec<isize> {
        (0..self.dimension()).map(|axis| self.stride(axis)).collect()
    }

    /// Backstrides of this layout.
    fn backstrides(&self) -> Backstrides<'_, Self> {
        Backstrides::new(self)
    }
}
