use thiserror::Error;

use crate::storage::Dtype;

#[derive(Error, Debug)]
pub enum HostArrayError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Index dimension mismatch: expected {expected} indices, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Index out of bounds: {0} for dimension of size {1} at axis {2}")]
    IndexOutOfBounds(usize, usize, usize),
    #[error("Shape and strides must have the same length: {0} vs {1}")]
    StrideLengthMismatch(usize, usize),
    #[error("Broadcast error: cannot broadcast shape {0:?} to {1:?}")]
    BroadcastError(Vec<usize>, Vec<usize>),
    #[error("Dtype mismatch: expected {expected}, got {actual}")]
    DtypeMismatch { expected: Dtype, actual: Dtype },
    #[error("Cannot cast {from} to {to} without forcecast")]
    CastNotAllowed { from: Dtype, to: Dtype },
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    #[error("Operation on an invalid array")]
    InvalidArray,
    #[error("Array is not contiguous")]
    NotContiguous,
    #[error("Buffer is read-only")]
    ReadOnly,
    #[error("Buffer is shared with another view")]
    SharedBuffer,
    #[error("Byte stride {stride} is not a multiple of the item size {itemsize}")]
    MisalignedStride { stride: isize, itemsize: usize },
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostArrayError {
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn index_out_of_bounds(index: usize, size: usize, axis: usize) -> Self {
        Self::IndexOutOfBounds(index, size, axis)
    }

    pub fn broadcast_error(shape: &[usize], target: &[usize]) -> Self {
        Self::BroadcastError(shape.to_vec(), target.to_vec())
    }

    pub fn conversion_failed(msg: impl Into<String>) -> Self {
        Self::ConversionFailed(msg.into())
    }

    pub fn allocation_failed(msg: impl Into<String>) -> Self {
        Self::AllocationFailed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HostArrayError>;
