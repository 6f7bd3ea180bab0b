//! Memory-mapped host buffers.

use super::{Dtype, HostBuffer};
use crate::dimension::Stride;
use crate::error::{HostArrayError, Result};
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

enum Map {
    ReadWrite(MmapMut),
    ReadOnly(Mmap),
}

/// A dense row-major host buffer backed by a memory-mapped file.
///
/// Useful for arrays larger than memory; the mapping stays alive as long as
/// any view holds the buffer handle.
pub struct MmapBuffer {
    map: Map,
    path: PathBuf,
    dtype: Dtype,
    shape: Vec<usize>,
    byte_strides: Vec<isize>,
    _file: File,
}

// SAFETY: the mapping is only reached through raw pointers handed to views.
unsafe impl Send for MmapBuffer {}
unsafe impl Sync for MmapBuffer {}

impl MmapBuffer {
    /// Creates a zero-filled writable mapping.
    ///
    /// A temporary file is used when `path` is `None`.
    pub fn create(path: Option<PathBuf>, dtype: Dtype, shape: &[usize]) -> Result<Self> {
        let nbytes = Self::nbytes(dtype, shape)?;
        let path = path.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("tensorust_host_{}.mmap", uuid::Uuid::new_v4()))
        });
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(nbytes.max(1) as u64)?;
        // SAFETY: the file was just sized by us; concurrent external
        // modification is the host's responsibility.
        let map = unsafe { MmapOptions::new().len(nbytes.max(1)).map_mut(&file)? };
        tracing::debug!(path = %path.display(), %dtype, ?shape, "mapped host buffer");
        Ok(Self::assemble(Map::ReadWrite(map), path, file, dtype, shape))
    }

    /// Maps an existing file read-only.
    pub fn open_readonly(path: impl AsRef<Path>, dtype: Dtype, shape: &[usize]) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let nbytes = Self::nbytes(dtype, shape)?;
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < nbytes as u64 {
            return Err(HostArrayError::shape_mismatch(&[nbytes], &[len as usize]));
        }
        // SAFETY: see `create`.
        let map = unsafe { MmapOptions::new().len(nbytes.max(1)).map(&file)? };
        Ok(Self::assemble(Map::ReadOnly(map), path, file, dtype, shape))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes outstanding writes to the file.
    pub fn flush(&self) -> Result<()> {
        if let Map::ReadWrite(map) = &self.map {
            map.flush()?;
        }
        Ok(())
    }

    fn nbytes(dtype: Dtype, shape: &[usize]) -> Result<usize> {
        shape
            .iter()
            .try_fold(dtype.itemsize(), |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| HostArrayError::allocation_failed(format!("shape {shape:?} too large")))
    }

    fn assemble(map: Map, path: PathBuf, file: File, dtype: Dtype, shape: &[usize]) -> Self {
        let itemsize = dtype.itemsize() as isize;
        let byte_strides = Stride::row_major(shape)
            .as_slice()
            .iter()
            .map(|&s| s * itemsize)
            .collect();
        Self {
            map,
            path,
            dtype,
            shape: shape.to_vec(),
            byte_strides,
            _file: file,
        }
    }
}

// SAFETY: the mapping covers the dense row-major layout and lives as long
// as `self`; read-only maps report non-writeable.
unsafe impl HostBuffer for MmapBuffer {
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
        match &self.map {
            Map::ReadWrite(map) => map.as_ptr() as *mut u8,
            Map::ReadOnly(map) => map.as_ptr() as *mut u8,
        }
    }

    fn is_writeable(&self) -> bool {
        matches!(self.map, Map::ReadWrite(_))
    }
}

impl std::fmt::Debug for MmapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapBuffer")
            .field("path", &self.path)
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("writeable", &self.is_writeable())
            .finish()
    }
}
