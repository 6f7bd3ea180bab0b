//! Host-allocated buffers.

use super::{byte_extent, Dtype, Element, HostBuffer};
use crate::dimension::Stride;
use crate::error::{HostArrayError, Result};
use std::{
    alloc::{self, Layout},
    any::Any,
    fmt,
    ptr::{self, NonNull},
    sync::Arc,
};

const BLOCK_ALIGN: usize = 16;

/// Raw buffer-protocol description of foreign memory.
#[derive(Debug, Clone)]
pub struct BufferInfo {
    pub ptr: *mut u8,
    pub itemsize: usize,
    pub format: String,
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
    pub readonly: bool,
}

impl BufferInfo {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

enum Block {
    Owned { base: NonNull<u8>, layout: Layout },
    Empty,
    Foreign(#[allow(dead_code)] Option<Arc<dyn Any + Send + Sync>>),
}

/// An N-dimensional block of host memory with arbitrary byte strides.
///
/// This plays the role of the host runtime's array object: it either owns a
/// zero-initialised allocation or wraps foreign memory kept alive by an owner.
pub struct NdBuffer {
    block: Block,
    ptr: *mut u8,
    dtype: Dtype,
    shape: Vec<usize>,
    byte_strides: Vec<isize>,
    writeable: bool,
}

// SAFETY: the buffer only exposes raw pointers; synchronising access through
// them is the caller's responsibility, as for any host-owned memory.
unsafe impl Send for NdBuffer {}
unsafe impl Sync for NdBuffer {}

impl NdBuffer {
    /// Allocates a zero-filled buffer with the given byte strides.
    ///
    /// Every stride must be a multiple of the item size.
    pub fn zeros(dtype: Dtype, shape: &[usize], byte_strides: &[isize]) -> Result<Self> {
        if shape.len() != byte_strides.len() {
            return Err(HostArrayError::StrideLengthMismatch(shape.len(), byte_strides.len()));
        }
        let itemsize = dtype.itemsize() as isize;
        if let Some(&stride) = byte_strides.iter().find(|&&s| s % itemsize != 0) {
            return Err(HostArrayError::MisalignedStride {
                stride,
                itemsize: dtype.itemsize(),
            });
        }
        let (block, ptr) = match byte_extent(shape, byte_strides) {
            None => (Block::Empty, NonNull::<u128>::dangling().as_ptr().cast::<u8>()),
            Some((lo, hi)) => {
                let nbytes = usize::try_from(hi - lo + itemsize).map_err(|_| {
                    HostArrayError::allocation_failed(format!("invalid extent for shape {shape:?}"))
                })?;
                let layout = Layout::from_size_align(nbytes, BLOCK_ALIGN)
                    .map_err(|e| HostArrayError::allocation_failed(e.to_string()))?;
                // SAFETY: layout has a non-zero size.
                let base = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
                    .ok_or_else(|| HostArrayError::allocation_failed(format!("{nbytes} bytes")))?;
                // SAFETY: -lo is within the allocation.
                let ptr = unsafe { base.as_ptr().offset(-lo) };
                (Block::Owned { base, layout }, ptr)
            }
        };
        tracing::debug!(%dtype, ?shape, ?byte_strides, "allocated host buffer");
        Ok(Self {
            block,
            ptr,
            dtype,
            shape: shape.to_vec(),
            byte_strides: byte_strides.to_vec(),
            writeable: true,
        })
    }

    /// Allocates a zero-filled buffer of `T` with strides given in elements.
    pub fn with_strides<T: Element>(shape: &[usize], strides: &[isize]) -> Result<Self> {
        let itemsize = std::mem::size_of::<T>() as isize;
        let byte_strides: Vec<isize> = strides.iter().map(|&s| s * itemsize).collect();
        Self::zeros(T::DTYPE, shape, &byte_strides)
    }

    /// Allocates a buffer of `T` with element strides and copies `seed` into it.
    ///
    /// `seed[0]` is the lowest address reachable through `strides`, so the
    /// seed must cover the whole span of the layout.
    pub fn from_slice<T: Element>(shape: &[usize], strides: &[isize], seed: &[T]) -> Result<Self> {
        let buffer = Self::with_strides::<T>(shape, strides)?;
        if let Some((lo, hi)) = byte_extent(shape, &buffer.byte_strides) {
            let itemsize = std::mem::size_of::<T>() as isize;
            let span = ((hi - lo) / itemsize + 1) as usize;
            if seed.len() < span {
                return Err(HostArrayError::shape_mismatch(&[span], &[seed.len()]));
            }
            // SAFETY: the destination span was allocated above and seed holds
            // at least `span` elements.
            unsafe {
                ptr::copy_nonoverlapping(seed.as_ptr(), buffer.ptr.offset(lo).cast::<T>(), span);
            }
        }
        Ok(buffer)
    }

    /// Creates a dense row-major buffer from `data`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let size: usize = shape.iter().product();
        if size != data.len() {
            return Err(HostArrayError::shape_mismatch(shape, &[data.len()]));
        }
        let strides = Stride::row_major(shape);
        Self::from_slice(shape, strides.as_slice(), &data)
    }

    /// Wraps foreign memory without copying.
    ///
    /// # Safety
    /// `info.ptr` must be valid, suitably aligned for the element type, and
    /// cover every offset reachable through `info.shape` and `info.strides`
    /// for as long as the returned buffer lives. `owner` is kept alive until
    /// then. While the buffer lives, nothing else may write the memory
    /// except through views of this buffer, and no other buffer may wrap it.
    pub unsafe fn from_raw_parts(
        info: BufferInfo,
        owner: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Result<Self> {
        let dtype = Dtype::from_format(&info.format)
            .ok_or_else(|| HostArrayError::conversion_failed(format!("unsupported format {:?}", info.format)))?;
        if dtype.itemsize() != info.itemsize {
            return Err(HostArrayError::conversion_failed(format!(
                "itemsize {} does not match format {:?}",
                info.itemsize, info.format
            )));
        }
        if info.shape.len() != info.strides.len() {
            return Err(HostArrayError::StrideLengthMismatch(info.shape.len(), info.strides.len()));
        }
        Ok(Self {
            block: Block::Foreign(owner),
            ptr: info.ptr,
            dtype,
            shape: info.shape,
            byte_strides: info.strides,
            writeable: !info.readonly,
        })
    }

    /// Marks the buffer read-only.
    pub fn into_readonly(mut self) -> Self {
        self.writeable = false;
        self
    }

    /// Describes this buffer for export.
    pub fn buffer_info(&self) -> BufferInfo {
        BufferInfo {
            ptr: self.ptr,
            itemsize: self.dtype.itemsize(),
            format: self.dtype.format().to_string(),
            shape: self.shape.clone(),
            strides: self.byte_strides.clone(),
            readonly: !self.writeable,
        }
    }
}

// SAFETY: the pointer and layout come from `zeros` or from the
// `from_raw_parts` contract.
unsafe impl HostBuffer for NdBuffer {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn byte_strides(&self) -> &[isize] {
        &self.byte_strides
    }

    fn as_ptr(&self) -> *mut u8 {
        self.ptr
    }

    fn is_writeable(&self) -> bool {
        self.writeable
    }
}

impl fmt::Debug for NdBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.block {
            Block::Owned { .. } => "owned",
            Block::Empty => "empty",
            Block::Foreign(_) => "foreign",
        };
        f.debug_struct("NdBuffer")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("byte_strides", &self.byte_strides)
            .field("block", &kind)
            .finish()
    }
}

impl Drop for NdBuffer {
    fn drop(&mut self) {
        if let Block::Owned { base, layout } = self.block {
            // SAFETY: allocated in `zeros` with this layout.
            unsafe { alloc::dealloc(base.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: Element>(buffer: &NdBuffer, index: &[usize]) -> T {
        unsafe { buffer.as_ptr().offset(buffer.byte_offset(index)).cast::<T>().read() }
    }

    #[test]
    fn test_from_vec() {
        let buffer = NdBuffer::from_vec(vec![1i32, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        assert_eq!(buffer.byte_strides(), &[12, 4]);
        assert_eq!(read::<i32>(&buffer, &[1, 0]), 4);
        assert_eq!(read::<i32>(&buffer, &[1, 2]), 6);
        assert!(NdBuffer::from_vec(vec![1i32, 2, 3], &[2, 2]).is_err());
    }

    #[test]
    fn test_zeros_negative_strides() {
        let buffer = NdBuffer::with_strides::<f64>(&[2, 3], &[-3, 1]).unwrap();
        assert_eq!(buffer.byte_strides(), &[-24, 8]);
        assert_eq!(read::<f64>(&buffer, &[1, 2]), 0.0);
        let seeded = NdBuffer::from_slice(&[2, 3], &[-3, 1], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        // seed[0] is the lowest address, reached by [1, 0].
        assert_eq!(read::<f64>(&seeded, &[1, 0]), 1.0);
        assert_eq!(read::<f64>(&seeded, &[0, 0]), 4.0);
    }

    #[test]
    fn test_empty_and_mismatch() {
        let buffer = NdBuffer::zeros(Dtype::F32, &[0, 4], &[16, 4]).unwrap();
        assert_eq!(buffer.size(), 0);
        assert!(NdBuffer::zeros(Dtype::F32, &[2, 4], &[16]).is_err());
        assert!(NdBuffer::from_slice::<f32>(&[4], &[1], &[1.0]).is_err());
    }

    #[test]
    fn test_zeros_rejects_misaligned_strides() {
        assert!(matches!(
            NdBuffer::zeros(Dtype::F64, &[2], &[4]),
            Err(HostArrayError::MisalignedStride { stride: 4, itemsize: 8 })
        ));
        assert!(matches!(
            NdBuffer::zeros(Dtype::I32, &[2, 2], &[8, -6]),
            Err(HostArrayError::MisalignedStride { stride: -6, itemsize: 4 })
        ));
        assert!(NdBuffer::zeros(Dtype::I32, &[2, 2], &[-8, 4]).is_ok());
    }

    #[test]
    fn test_from_raw_parts_native_long() {
        let data = Arc::new(vec![-1 as std::ffi::c_long, 2, 3]);
        let info = BufferInfo {
            ptr: data.as_ptr() as *mut u8,
            itemsize: std::mem::size_of::<std::ffi::c_long>(),
            format: "l".to_string(),
            shape: vec![3],
            strides: vec![std::mem::size_of::<std::ffi::c_long>() as isize],
            readonly: true,
        };
        let buffer = unsafe { NdBuffer::from_raw_parts(info, Some(data.clone())) }.unwrap();
        assert_eq!(buffer.itemsize(), std::mem::size_of::<std::ffi::c_long>());
        assert_eq!(read::<std::ffi::c_long>(&buffer, &[2]), 3);
    }

    #[test]
    fn test_from_raw_parts() {
        let data = Arc::new(vec![1u16, 2, 3, 4]);
        let info = BufferInfo {
            ptr: data.as_ptr() as *mut u8,
            itemsize: 2,
            format: "H".to_string(),
            shape: vec![2, 2],
            strides: vec![2, 4],
            readonly: true,
        };
        let buffer = unsafe { NdBuffer::from_raw_parts(info, Some(data.clone())) }.unwrap();
        assert_eq!(buffer.dtype(), Dtype::U16);
        assert!(!buffer.is_writeable());
        assert!(!buffer.is_c_contiguous());
        assert_eq!(read::<u16>(&buffer, &[0, 1]), 3);
        assert_eq!(buffer.buffer_info().strides, vec![2, 4]);
    }
}
