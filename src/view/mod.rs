//! Strided views over host-owned buffers.
//!
//! [`HostArray`] adapts a buffer-protocol descriptor into a typed,
//! element-strided N-dimensional view. It never owns the memory: it holds a
//! reference-counted [`BufferHandle`] and derives shape and strides from the
//! live descriptor on every call.
//!
//! Views may share a buffer (see [`HostArray::clone`]), but only a view that
//! holds the sole handle writes through safe methods. While the handle is
//! shared, every view of it is read-only and writes go through
//! [`StepperMut::write`].

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::dimension::{self, Backstrides, Layout, Stride, StridedLayout};
use crate::error::{HostArrayError, Result};
use crate::expression::{self, Expression};
use crate::storage::convert::{self, ArrayFlags};
use crate::storage::{BufferHandle, Element, NdBuffer};

mod iter;
mod stepper;

pub use iter::BroadcastIter;
pub use stepper::{Stepper, StepperMut};

/// A typed strided view over host memory.
///
/// A view without a buffer is *invalid*: it is what a failed conversion or
/// [`HostArray::new`] produces. An invalid view has rank 0, no elements, and
/// becomes valid on its first reshape or assignment.
pub struct HostArray<T: Element> {
    handle: Option<BufferHandle>,
    flags: ArrayFlags,
    _marker: PhantomData<T>,
}

impl<T: Element> HostArray<T> {
    /// Creates an invalid view.
    pub fn new() -> Self {
        Self {
            handle: None,
            flags: ArrayFlags::default(),
            _marker: PhantomData,
        }
    }

    /// Wraps an existing buffer without copying.
    pub fn from_buffer(handle: BufferHandle) -> Result<Self> {
        if handle.dtype() != T::DTYPE {
            return Err(HostArrayError::DtypeMismatch {
                expected: T::DTYPE,
                actual: handle.dtype(),
            });
        }
        Ok(Self {
            handle: Some(handle),
            flags: ArrayFlags::default(),
            _marker: PhantomData,
        })
    }

    /// Adopts an arbitrary host object, converting it as `flags` allow.
    ///
    /// A missing object, or one that cannot be converted, yields an invalid
    /// view instead of an error.
    pub fn from_object(object: Option<BufferHandle>, flags: ArrayFlags) -> Self {
        let handle = object.and_then(|object| match convert::ensure::<T>(&object, flags) {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::debug!(%error, dtype = %T::DTYPE, "conversion failed, clearing error");
                None
            }
        });
        Self {
            handle,
            flags,
            _marker: PhantomData,
        }
    }

    /// Allocates a zero-filled dense row-major array.
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        Self::from_shape_strides(shape, Stride::row_major(shape).as_slice())
    }

    /// Allocates a zero-filled array with the given element strides.
    pub fn from_shape_strides(shape: &[usize], strides: &[isize]) -> Result<Self> {
        Self::from_buffer(Arc::new(NdBuffer::with_strides::<T>(shape, strides)?))
    }

    /// Allocates an array with the given element strides, seeded from `data`.
    ///
    /// `data[0]` is the lowest address of the layout.
    pub fn from_slice_strided(shape: &[usize], strides: &[isize], data: &[T]) -> Result<Self> {
        Self::from_buffer(Arc::new(NdBuffer::from_slice(shape, strides, data)?))
    }

    /// Allocates a dense row-major array holding `data`.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        Self::from_buffer(Arc::new(NdBuffer::from_vec(data, shape)?))
    }

    /// Allocates a one-dimensional zero-filled array of `count` elements.
    pub fn from_count(count: usize) -> Result<Self> {
        Self::from_shape(&[count])
    }

    /// Materialises `expr` into a fresh array.
    pub fn from_expr<E: Expression<T>>(expr: E) -> Result<Self> {
        let mut array = Self::new();
        array.assign(expr)?;
        Ok(array)
    }

    /// Sets the conversion policy reported by this view.
    pub fn with_flags(mut self, flags: ArrayFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> ArrayFlags {
        self.flags
    }

    /// Returns `false` for a view without a buffer.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&BufferHandle> {
        self.handle.as_ref()
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.handle.as_ref().map_or(0, |h| h.ndim())
    }

    /// Per-dimension lengths, read from the live buffer.
    pub fn shape(&self) -> &[usize] {
        self.handle.as_ref().map_or(&[], |h| h.shape())
    }

    /// Per-dimension strides in elements, derived from the byte strides.
    pub fn strides(&self) -> Vec<isize> {
        let itemsize = Self::itemsize() as isize;
        self.handle
            .as_ref()
            .map_or_else(Vec::new, |h| h.byte_strides().iter().map(|&s| s / itemsize).collect())
    }

    pub fn backstrides(&self) -> Backstrides<'_, Self> {
        Backstrides::new(self)
    }

    pub fn size(&self) -> usize {
        self.handle.as_ref().map_or(0, |h| h.size())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub const fn itemsize() -> usize {
        std::mem::size_of::<T>()
    }

    /// Returns `true` if the strides tile exactly `size()` consecutive elements.
    pub fn is_contiguous(&self) -> bool {
        self.is_valid() && dimension::is_dense(self.shape(), &self.strides())
    }

    /// Element offset of `index` relative to the first element.
    ///
    /// The rank is checked here, once; the host computes the byte offset
    /// without re-validating.
    pub fn offset_of(&self, index: &[usize]) -> Result<isize> {
        let handle = self.handle.as_ref().ok_or(HostArrayError::InvalidArray)?;
        if index.len() != handle.ndim() {
            return Err(HostArrayError::dimension_mismatch(handle.ndim(), index.len()));
        }
        Ok(handle.byte_offset(index) / Self::itemsize() as isize)
    }

    fn checked_offset(&self, index: &[usize]) -> Result<isize> {
        let offset = self.offset_of(index)?;
        for (axis, (&i, &n)) in index.iter().zip(self.shape()).enumerate() {
            if i >= n {
                return Err(HostArrayError::index_out_of_bounds(i, n, axis));
            }
        }
        Ok(offset)
    }

    fn writeable_handle(&self) -> Result<&BufferHandle> {
        let handle = self.handle.as_ref().ok_or(HostArrayError::InvalidArray)?;
        if !handle.is_writeable() {
            return Err(HostArrayError::ReadOnly);
        }
        Ok(handle)
    }

    /// The handle, if it is writeable and no other view or handle shares it.
    pub(crate) fn exclusive_handle(&self) -> Result<&BufferHandle> {
        let handle = self.writeable_handle()?;
        if self.is_shared() {
            return Err(HostArrayError::SharedBuffer);
        }
        Ok(handle)
    }

    /// Returns `true` if another handle to this view's buffer exists.
    pub fn is_shared(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| Arc::strong_count(h) != 1 || Arc::weak_count(h) != 0)
    }

    /// Pointer to the first element, null for an invalid view.
    pub fn data(&self) -> *const T {
        self.handle
            .as_ref()
            .map_or(std::ptr::null(), |h| h.as_ptr() as *const T)
    }

    /// Mutable pointer to the first element.
    ///
    /// Only a read-only buffer is refused; writing through the pointer while
    /// the buffer is shared is up to the caller.
    pub fn data_mut(&mut self) -> Result<*mut T> {
        Ok(self.writeable_handle()?.as_ptr().cast::<T>())
    }

    /// Pointer to the element at `index`.
    pub fn data_at(&self, index: &[usize]) -> Result<*const T> {
        let offset = self.checked_offset(index)?;
        Ok(self.data().wrapping_offset(offset))
    }

    /// Reference to the element at `index`.
    pub fn get(&self, index: &[usize]) -> Result<&T> {
        let offset = self.checked_offset(index)?;
        // SAFETY: the index was checked against the live shape.
        Ok(unsafe { &*self.data().offset(offset) })
    }

    /// The element at `index`.
    pub fn at(&self, index: &[usize]) -> Result<T> {
        self.get(index).copied()
    }

    /// Mutable reference to the element at `index`.
    ///
    /// Fails with [`HostArrayError::SharedBuffer`] while another handle to the
    /// buffer exists.
    pub fn at_mut(&mut self, index: &[usize]) -> Result<&mut T> {
        let offset = self.checked_offset(index)?;
        let base = self.exclusive_handle()?.as_ptr().cast::<T>();
        // SAFETY: the index was checked, and the handle is unshared so no
        // other reference into the buffer exists.
        Ok(unsafe { &mut *base.offset(offset) })
    }

    /// Stores `value` at `index`.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        *self.at_mut(index)? = value;
        Ok(())
    }

    /// Reshapes to `shape` in row-major order.
    ///
    /// Does nothing when the view is valid and already has `shape`; strides
    /// are not compared.
    pub fn reshape(&mut self, shape: &[usize]) -> Result<()> {
        if self.is_valid() && self.shape() == shape {
            return Ok(());
        }
        self.reshape_with_layout(shape, Layout::RowMajor)
    }

    /// Reshapes to `shape` with strides computed for `layout`.
    ///
    /// Length-1 dimensions get stride 0.
    pub fn reshape_with_layout(&mut self, shape: &[usize], layout: Layout) -> Result<()> {
        let strides = Stride::for_layout(shape, layout);
        tracing::debug!(from = ?self.shape(), to = ?shape, ?layout, "reshaping host array");
        self.reshape_with_strides(shape, strides.as_slice())
    }

    /// Replaces the buffer with a fresh zero-filled one of the given layout.
    ///
    /// The previous contents are discarded.
    pub fn reshape_with_strides(&mut self, shape: &[usize], strides: &[isize]) -> Result<()> {
        if shape.len() != strides.len() {
            return Err(HostArrayError::StrideLengthMismatch(shape.len(), strides.len()));
        }
        let fresh = Self::from_shape_strides(shape, strides)?;
        self.handle = fresh.handle;
        Ok(())
    }

    /// Merges this view's shape into the broadcast target `shape`.
    ///
    /// Returns `true` when the broadcast is trivial.
    pub fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        dimension::broadcast_shape(self.shape(), shape)
    }

    /// Returns `true` iff `strides` equal this view's element strides,
    /// rank included.
    pub fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        strides.len() == self.dimension() && strides == self.strides().as_slice()
    }

    fn storage_end(&self) -> *const T {
        self.data().wrapping_add(self.size())
    }

    fn broadcast_offset(&self, shape: &[usize]) -> Result<usize> {
        if !self.is_valid() {
            return Err(HostArrayError::InvalidArray);
        }
        let own = self.shape();
        if shape.len() < own.len() {
            return Err(HostArrayError::broadcast_error(own, shape));
        }
        let offset = shape.len() - own.len();
        let compatible = own
            .iter()
            .zip(&shape[offset..])
            .all(|(&n, &target)| n == target || n == 1);
        if !compatible {
            return Err(HostArrayError::broadcast_error(own, shape));
        }
        Ok(offset)
    }

    /// Stepper at the first element, for iteration against `shape`.
    pub fn stepper_begin(&self, shape: &[usize]) -> Result<Stepper<'_, T>> {
        let offset = self.broadcast_offset(shape)?;
        Ok(Stepper::new(self.data(), self.storage_end(), self.shape(), &self.strides(), offset))
    }

    /// Stepper at the end position, for iteration against `shape`.
    pub fn stepper_end(&self, shape: &[usize]) -> Result<Stepper<'_, T>> {
        let mut stepper = self.stepper_begin(shape)?;
        stepper.to_end();
        Ok(stepper)
    }

    /// Writing stepper at the first element, for iteration against `shape`.
    pub fn stepper_begin_mut(&mut self, shape: &[usize]) -> Result<StepperMut<'_, T>> {
        let offset = self.broadcast_offset(shape)?;
        let base = self.writeable_handle()?.as_ptr().cast::<T>();
        let end = base.wrapping_add(self.size());
        Ok(StepperMut::new(base, end, self.shape(), &self.strides(), offset))
    }

    /// Iterates the view as if it had shape `shape`.
    pub fn broadcast_iter(&self, shape: &[usize]) -> Result<BroadcastIter<'_, T>> {
        Ok(BroadcastIter::new(self.stepper_begin(shape)?, shape))
    }

    /// Iterates the view in row-major index order of its own shape.
    pub fn iter(&self) -> BroadcastIter<'_, T> {
        match self.broadcast_iter(self.shape()) {
            Ok(iter) => iter,
            Err(_) => BroadcastIter::empty(Stepper::new(
                std::ptr::null(),
                std::ptr::null(),
                &[],
                &[],
                0,
            )),
        }
    }

    /// Applies `f` to every element in row-major index order.
    pub fn for_each_mut<F: FnMut(&mut T)>(&mut self, mut f: F) -> Result<()> {
        self.exclusive_handle()?;
        let shape = self.shape().to_vec();
        let size = self.size();
        let mut stepper = self.stepper_begin_mut(&shape)?;
        let mut index = vec![0; shape.len()];
        for _ in 0..size {
            // SAFETY: `index` walks `shape`, so the cursor is on an element.
            f(unsafe { stepper.as_mut() });
            stepper.increment(&mut index, &shape);
        }
        Ok(())
    }

    pub fn fill(&mut self, value: T) -> Result<()> {
        self.for_each_mut(|x| *x = value)
    }

    /// Copies the elements out in row-major index order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// The underlying elements in memory order.
    pub fn storage(&self) -> Result<&[T]> {
        if !self.is_contiguous() {
            return Err(HostArrayError::NotContiguous);
        }
        // SAFETY: a contiguous view covers exactly `size()` elements from its
        // first element.
        Ok(unsafe { std::slice::from_raw_parts(self.data(), self.size()) })
    }

    /// The underlying elements in memory order, mutably.
    pub fn storage_mut(&mut self) -> Result<&mut [T]> {
        if !self.is_contiguous() {
            return Err(HostArrayError::NotContiguous);
        }
        let size = self.size();
        let base = self.exclusive_handle()?.as_ptr().cast::<T>();
        // SAFETY: see `storage`; the handle is unshared.
        Ok(unsafe { std::slice::from_raw_parts_mut(base, size) })
    }

    /// Evaluates `expr` into this view, reshaping it first if needed.
    pub fn assign<E: Expression<T>>(&mut self, expr: E) -> Result<&mut Self> {
        expression::assign(self, &expr)?;
        Ok(self)
    }
}

impl<T: Element> Default for HostArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Clone for HostArray<T> {
    /// Shares the buffer; no data is copied.
    ///
    /// Both views are read-only until one of them is dropped or reshaped.
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            flags: self.flags,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> fmt::Debug for HostArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostArray")
            .field("dtype", &T::DTYPE)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<T: Element> StridedLayout for HostArray<T> {
    fn shape(&self) -> &[usize] {
        HostArray::shape(self)
    }

    fn stride(&self, axis: usize) -> isize {
        self.handle
            .as_ref()
            .map_or(0, |h| h.byte_strides()[axis] / Self::itemsize() as isize)
    }
}

impl<'a, T: Element> Index<&'a [usize]> for HostArray<T> {
    type Output = T;

    fn index(&self, index: &'a [usize]) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<'a, T: Element> IndexMut<&'a [usize]> for HostArray<T> {
    fn index_mut(&mut self, index: &'a [usize]) -> &mut T {
        match self.at_mut(index) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<T: Element, const N: usize> Index<[usize; N]> for HostArray<T> {
    type Output = T;

    fn index(&self, index: [usize; N]) -> &T {
        &self[&index[..]]
    }
}

impl<T: Element, const N: usize> IndexMut<[usize; N]> for HostArray<T> {
    fn index_mut(&mut self, index: [usize; N]) -> &mut T {
        &mut self[&index[..]]
    }
}

impl<'a, T: Element> IntoIterator for &'a HostArray<T> {
    type Item = T;
    type IntoIter = BroadcastIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BufferInfo, Dtype};
    use std::any::Any;

    #[test]
    fn test_two_by_two_scenario() {
        let a = HostArray::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        assert_eq!(a.strides(), vec![2, 1]);
        assert_eq!(a.backstrides().to_vec(), vec![2, 1]);
        assert_eq!(a.at(&[1, 0]).unwrap(), 3);
        assert_eq!(a[[1, 0]], 3);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = HostArray::<f64>::from_shape(&[2, 3, 4]).unwrap();
        assert!(matches!(
            a.at(&[1, 1]),
            Err(HostArrayError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(a.offset_of(&[0, 0, 0, 0]), Err(HostArrayError::DimensionMismatch { .. })));
        assert!(matches!(a.at(&[2, 0, 0]), Err(HostArrayError::IndexOutOfBounds(2, 2, 0))));
    }

    #[test]
    #[should_panic(expected = "Index dimension mismatch")]
    fn test_index_panics_on_dimension_mismatch() {
        let a = HostArray::<f64>::from_shape(&[2, 3, 4]).unwrap();
        let _ = a[[0, 1]];
    }

    #[test]
    fn test_reshape_rank_one_to_matrix() {
        let mut a = HostArray::from_vec((0..6).map(|x| x as f64).collect(), &[6]).unwrap();
        a.reshape(&[2, 3]).unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.strides(), vec![3, 1]);
        assert_eq!(a.offset_of(&[1, 2]).unwrap(), 5);
    }

    #[test]
    fn test_reshape_layouts() {
        let mut a = HostArray::<i32>::new();
        a.reshape_with_layout(&[2, 1, 3], Layout::ColumnMajor).unwrap();
        assert_eq!(a.strides(), vec![1, 0, 2]);
        assert_eq!(a.backstrides().to_vec(), vec![1, 0, 4]);
        a.reshape_with_layout(&[2, 1, 3], Layout::RowMajor).unwrap();
        assert_eq!(a.strides(), vec![3, 0, 1]);
        assert!(matches!(
            a.reshape_with_strides(&[2, 3], &[1]),
            Err(HostArrayError::StrideLengthMismatch(2, 1))
        ));
    }

    #[test]
    fn test_reshape_same_shape_is_noop() {
        let mut a = HostArray::from_slice_strided(&[2, 3], &[1, 2], &[1, 2, 3, 4, 5, 6]).unwrap();
        let before = Arc::clone(a.handle().unwrap());
        a.reshape(&[2, 3]).unwrap();
        assert!(Arc::ptr_eq(&before, a.handle().unwrap()));
        // Column-major strides survive a same-shape reshape.
        assert_eq!(a.strides(), vec![1, 2]);
        a.reshape(&[3, 2]).unwrap();
        assert!(!Arc::ptr_eq(&before, a.handle().unwrap()));
        assert_eq!(a.to_vec(), vec![0; 6]);
    }

    #[test]
    fn test_trivial_broadcast() {
        let a = HostArray::<f32>::from_shape(&[2, 3]).unwrap();
        assert!(a.is_trivial_broadcast(&[3, 1]));
        assert!(!a.is_trivial_broadcast(&[3, 2]));
        assert!(!a.is_trivial_broadcast(&[0, 3, 1]));
        let mut target = vec![4, 1, 3];
        assert!(!a.broadcast_shape(&mut target).unwrap());
        assert_eq!(target, vec![4, 2, 3]);
    }

    #[test]
    fn test_write_and_read_back() {
        let mut a = HostArray::<i64>::from_shape(&[2, 3]).unwrap();
        a[[0, 2]] = 7;
        *a.at_mut(&[1, 1]).unwrap() = 9;
        a.set(&[1, 0], 3).unwrap();
        assert_eq!(a.to_vec(), vec![0, 0, 7, 3, 9, 0]);
        a.fill(1).unwrap();
        assert_eq!(a.storage().unwrap(), &[1; 6]);
        a.storage_mut().unwrap()[5] = 4;
        assert_eq!(a[[1, 2]], 4);
    }

    #[test]
    fn test_clone_is_read_only_while_shared() {
        let mut a = HostArray::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let b = a.clone();
        assert!(a.is_shared() && b.is_shared());
        let held = b.get(&[0]).unwrap();
        assert!(matches!(a.at_mut(&[0]), Err(HostArrayError::SharedBuffer)));
        assert!(matches!(a.set(&[0], 99), Err(HostArrayError::SharedBuffer)));
        assert!(matches!(a.storage_mut(), Err(HostArrayError::SharedBuffer)));
        assert_eq!(*held, 1);

        drop(b);
        assert!(!a.is_shared());
        a.set(&[0], 99).unwrap();
        assert_eq!(a.to_vec(), vec![99, 2, 3]);
    }

    #[test]
    fn test_stepper_writes_into_shared_buffer() {
        let mut a = HostArray::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let b = a.clone();
        let mut stepper = a.stepper_begin_mut(&[3]).unwrap();
        stepper.step(0);
        // SAFETY: the cursor is on element 1 and `b` holds no reference.
        unsafe { stepper.write(20) };
        assert_eq!(b.to_vec(), vec![1, 20, 3]);
    }

    #[test]
    fn test_zero_copy_wrap_and_readonly() {
        let data = Arc::new(vec![1.0f32, 2.0, 3.0, 4.0]);
        let info = BufferInfo {
            ptr: data.as_ptr() as *mut u8,
            itemsize: 4,
            format: "f".to_string(),
            shape: vec![2, 2],
            strides: vec![4, 8],
            readonly: true,
        };
        let buffer = unsafe { NdBuffer::from_raw_parts(info, Some(data.clone() as Arc<dyn Any + Send + Sync>)) }.unwrap();
        let mut a = HostArray::<f32>::from_buffer(Arc::new(buffer)).unwrap();
        assert_eq!(a.data(), data.as_ptr());
        assert_eq!(a.strides(), vec![1, 2]);
        assert_eq!(a.to_vec(), vec![1.0, 3.0, 2.0, 4.0]);
        assert!(a.is_contiguous());
        assert!(matches!(a.at_mut(&[0, 0]), Err(HostArrayError::ReadOnly)));
        assert!(matches!(
            HostArray::<f64>::from_buffer(a.handle().unwrap().clone()),
            Err(HostArrayError::DtypeMismatch { expected: Dtype::F64, actual: Dtype::F32 })
        ));
    }

    #[test]
    fn test_from_object() {
        let source: BufferHandle = Arc::new(NdBuffer::from_vec(vec![1i32, 2, 3], &[3]).unwrap());
        let a = HostArray::<f64>::from_object(Some(source.clone()), ArrayFlags::default());
        assert!(a.is_valid());
        assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0]);

        let strict = ArrayFlags::default().forcecast(false);
        let b = HostArray::<i16>::from_object(Some(source), strict);
        assert!(!b.is_valid());
        assert_eq!(b.dimension(), 0);

        assert!(!HostArray::<f64>::from_object(None, strict).is_valid());
    }

    #[test]
    fn test_negative_strides() {
        let a = HostArray::from_slice_strided(&[2, 3], &[-3, 1], &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(a.to_vec(), vec![4, 5, 6, 1, 2, 3]);
        assert_eq!(a.backstrides().to_vec(), vec![-3, 2]);
        assert!(!a.is_contiguous());
        assert!(a.storage().is_err());
    }

    #[test]
    fn test_steppers_on_invalid_view() {
        let a = HostArray::<u8>::new();
        assert!(matches!(a.stepper_begin(&[1]), Err(HostArrayError::InvalidArray)));
        assert!(a.data().is_null());
        let b = HostArray::<u8>::from_shape(&[3]).unwrap();
        let begin = b.stepper_begin(&[3]).unwrap();
        let end = b.stepper_end(&[3]).unwrap();
        assert!(begin != end);
    }
}
