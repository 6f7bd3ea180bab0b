//! Forced conversion of arbitrary host buffers into a required element type
//! and layout.

use super::{BufferHandle, Dtype, Element, HostBuffer, NdBuffer};
use crate::dimension::Stride;
use crate::error::{HostArrayError, Result};
use std::sync::Arc;

/// Conversion policy applied when adopting a host buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayFlags {
    /// Allow lossy dtype casts.
    pub forcecast: bool,
    /// Require a dense row-major layout, copying if needed.
    pub c_style: bool,
}

impl ArrayFlags {
    pub const fn new() -> Self {
        Self {
            forcecast: true,
            c_style: false,
        }
    }

    /// Flags used for vectorized arguments: dense row-major, force-cast.
    pub const fn c_style_forcecast() -> Self {
        Self {
            forcecast: true,
            c_style: true,
        }
    }

    pub const fn forcecast(mut self, forcecast: bool) -> Self {
        self.forcecast = forcecast;
        self
    }

    pub const fn c_style(mut self, c_style: bool) -> Self {
        self.c_style = c_style;
        self
    }
}

impl Default for ArrayFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a handle to a buffer of `T` satisfying `flags`.
///
/// The input handle is shared when it already qualifies; otherwise the data is
/// copied into a fresh dense row-major buffer.
pub fn ensure<T: Element>(source: &BufferHandle, flags: ArrayFlags) -> Result<BufferHandle> {
    let from = source.dtype();
    if from == T::DTYPE && (!flags.c_style || source.is_c_contiguous()) {
        return Ok(Arc::clone(source));
    }
    if from != T::DTYPE && !flags.forcecast && !from.can_cast_safely(T::DTYPE) {
        return Err(HostArrayError::CastNotAllowed { from, to: T::DTYPE });
    }
    tracing::debug!(%from, to = %T::DTYPE, shape = ?source.shape(), "copying host buffer for conversion");
    let data = cast_row_major::<T>(source.as_ref(), from)?;
    Ok(Arc::new(NdBuffer::from_slice(
        source.shape(),
        Stride::row_major(source.shape()).as_slice(),
        &data,
    )?))
}

fn cast_row_major<T: Element>(source: &dyn HostBuffer, from: Dtype) -> Result<Vec<T>> {
    let shape = source.shape();
    let size = source.size();
    let mut out = Vec::with_capacity(size);
    if size == 0 {
        return Ok(out);
    }
    let base = source.as_ptr();
    let mut index = vec![0usize; shape.len()];
    for _ in 0..size {
        // SAFETY: `index` stays within `shape`.
        let value = unsafe { from.read_as::<T>(base.offset(source.byte_offset(&index))) }
            .ok_or_else(|| {
                HostArrayError::conversion_failed(format!(
                    "value at {index:?} is not representable as {}",
                    T::DTYPE
                ))
            })?;
        out.push(value);
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(buffer: NdBuffer) -> BufferHandle {
        Arc::new(buffer)
    }

    #[test]
    fn test_same_dtype_is_shared() {
        let source = handle(NdBuffer::from_vec(vec![1.0f64, 2.0, 3.0], &[3]).unwrap());
        let out = ensure::<f64>(&source, ArrayFlags::default()).unwrap();
        assert!(Arc::ptr_eq(&source, &out));
    }

    #[test]
    fn test_c_style_copies_strided() {
        let source = handle(NdBuffer::from_slice(&[2, 2], &[1, 2], &[1i32, 2, 3, 4]).unwrap());
        let out = ensure::<i32>(&source, ArrayFlags::c_style_forcecast()).unwrap();
        assert!(!Arc::ptr_eq(&source, &out));
        assert!(out.is_c_contiguous());
        let values: Vec<i32> = (0..4)
            .map(|i| unsafe { out.as_ptr().cast::<i32>().add(i).read() })
            .collect();
        assert_eq!(values, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_cast_policies() {
        let source = handle(NdBuffer::from_vec(vec![1.5f64, -2.0], &[2]).unwrap());
        let strict = ArrayFlags::default().forcecast(false);
        assert!(matches!(
            ensure::<i32>(&source, strict),
            Err(HostArrayError::CastNotAllowed { .. })
        ));
        let out = ensure::<i32>(&source, ArrayFlags::default()).unwrap();
        assert_eq!(out.dtype(), Dtype::I32);
        assert!(matches!(
            ensure::<u8>(&source, ArrayFlags::default()),
            Err(HostArrayError::ConversionFailed(_))
        ));
        let widened = handle(NdBuffer::from_vec(vec![7i16], &[1]).unwrap());
        assert!(ensure::<f64>(&widened, strict).is_ok());
    }
}
