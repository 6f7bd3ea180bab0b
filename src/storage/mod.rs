//! Host buffer abstraction.
//!
//! A host buffer is a block of memory owned by a host runtime and described by
//! the buffer protocol: a data pointer, a dtype, per-dimension lengths and
//! per-dimension *byte* strides. Views never own this memory; they hold a
//! reference-counted [`BufferHandle`] to it.

mod cpu;
pub mod convert;
mod dtype;
#[cfg(feature = "mmap")]
mod mmap;

pub use cpu::{BufferInfo, NdBuffer};
pub use dtype::{Dtype, DtypeKind, Element};
#[cfg(feature = "mmap")]
pub use mmap::MmapBuffer;

use crate::error::{HostArrayError, Result};
use std::{fmt::Debug, sync::Arc};

/// The buffer-protocol descriptor of a block of host memory.
///
/// # Safety
/// For as long as the value lives, [`HostBuffer::as_ptr`] must point to
/// memory that is aligned for [`HostBuffer::dtype`] and covers every offset
/// reachable through `shape` and `byte_strides`. It must be writable unless
/// [`HostBuffer::is_writeable`] returns `false`. None of these may change
/// while the value lives.
pub unsafe trait HostBuffer: Debug + Send + Sync + 'static {
    /// Element type tag.
    fn dtype(&self) -> Dtype;

    /// Per-dimension element counts.
    fn shape(&self) -> &[usize];

    /// Per-dimension strides in bytes.
    fn byte_strides(&self) -> &[isize];

    /// Pointer to the element at index `[0, ..., 0]`.
    fn as_ptr(&self) -> *mut u8;

    /// Returns `false` if the memory must not be written through.
    fn is_writeable(&self) -> bool {
        true
    }

    /// Size of one element in bytes.
    fn itemsize(&self) -> usize {
        self.dtype().itemsize()
    }

    /// Number of dimensions.
    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Byte offset of `index` without any rank or bounds validation.
    ///
    /// Indices beyond the buffer rank are ignored, missing ones count as zero.
    fn byte_offset(&self, index: &[usize]) -> isize {
        index
            .iter()
            .zip(self.byte_strides())
            .map(|(&i, &s)| i as isize * s)
            .sum()
    }

    /// Checked byte offset of `index`.
    fn offset_at(&self, index: &[usize]) -> Result<isize> {
        if index.len() > self.ndim() {
            return Err(HostArrayError::dimension_mismatch(self.ndim(), index.len()));
        }
        for (axis, (&i, &n)) in index.iter().zip(self.shape()).enumerate() {
            if i >= n {
                return Err(HostArrayError::index_out_of_bounds(i, n, axis));
            }
        }
        Ok(self.byte_offset(index))
    }

    /// Returns `true` if the buffer is laid out in dense row-major order.
    fn is_c_contiguous(&self) -> bool {
        let mut expected = self.itemsize() as isize;
        for (&n, &s) in self.shape().iter().zip(self.byte_strides()).rev() {
            if n != 1 && s != expected {
                return false;
            }
            expected *= n as isize;
        }
        true
    }
}

/// A reference-counted handle to host memory.
pub type BufferHandle = Arc<dyn HostBuffer>;

/// Smallest and largest byte offsets reachable from the first element.
///
/// Returns `None` when the buffer holds no elements.
pub(crate) fn byte_extent(shape: &[usize], byte_strides: &[isize]) -> Option<(isize, isize)> {
    if shape.iter().any(|&n| n == 0) {
        return None;
    }
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (&n, &s) in shape.iter().zip(byte_strides) {
        let end = (n as isize - 1) * s;
        if end >= 0 {
            hi += end;
        } else {
            lo += end;
        }
    }
    Some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_extent() {
        assert_eq!(byte_extent(&[2, 3], &[24, 8]), Some((0, 40)));
        assert_eq!(byte_extent(&[2, 3], &[-24, 8]), Some((-24, 16)));
        assert_eq!(byte_extent(&[2, 0], &[8, 8]), None);
        assert_eq!(byte_extent(&[], &[]), Some((0, 0)));
    }

    #[test]
    fn test_offset_at_checks() {
        let buffer = NdBuffer::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(buffer.offset_at(&[1, 2]).unwrap(), 40);
        assert!(buffer.offset_at(&[2, 0]).is_err());
        assert!(buffer.offset_at(&[0, 0, 0]).is_err());
        assert!(buffer.is_c_contiguous());
    }
}
