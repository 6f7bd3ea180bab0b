//! Steppers: cursors that walk a view's memory with O(1) pointer adjustments.
//!
//! A stepper is built against a broadcast target shape whose rank may exceed
//! the view's. Target dimensions are numbered in the target's rank; the first
//! `offset` of them do not exist in the view and never move the cursor, and
//! view dimensions of length 1 never move it either. Wrapping a dimension
//! subtracts its backstride.

use std::marker::PhantomData;

/// Movement state shared by [`Stepper`] and [`StepperMut`].
#[derive(Debug, Clone)]
struct Cursor<T> {
    ptr: *mut T,
    end: *mut T,
    strides: Vec<isize>,
    backstrides: Vec<isize>,
    offset: usize,
}

impl<T> Cursor<T> {
    fn new(ptr: *mut T, end: *mut T, shape: &[usize], strides: &[isize], offset: usize) -> Self {
        let strides: Vec<isize> = shape
            .iter()
            .zip(strides)
            .map(|(&n, &s)| if n == 1 { 0 } else { s })
            .collect();
        let backstrides = shape
            .iter()
            .zip(&strides)
            .map(|(&n, &s)| if n == 1 { 0 } else { (n as isize - 1) * s })
            .collect();
        Self {
            ptr,
            end,
            strides,
            backstrides,
            offset,
        }
    }

    #[inline]
    fn axis(&self, dim: usize) -> Option<usize> {
        dim.checked_sub(self.offset).filter(|&axis| axis < self.strides.len())
    }

    #[inline]
    fn step(&mut self, dim: usize) {
        if let Some(axis) = self.axis(dim) {
            self.ptr = self.ptr.wrapping_offset(self.strides[axis]);
        }
    }

    #[inline]
    fn step_back(&mut self, dim: usize) {
        if let Some(axis) = self.axis(dim) {
            self.ptr = self.ptr.wrapping_offset(-self.strides[axis]);
        }
    }

    #[inline]
    fn reset(&mut self, dim: usize) {
        if let Some(axis) = self.axis(dim) {
            self.ptr = self.ptr.wrapping_offset(-self.backstrides[axis]);
        }
    }

    #[inline]
    fn reset_back(&mut self, dim: usize) {
        if let Some(axis) = self.axis(dim) {
            self.ptr = self.ptr.wrapping_offset(self.backstrides[axis]);
        }
    }

    /// Advances `index` in row-major order over `shape`, moving the cursor
    /// along. Returns `false` once the outermost dimension wraps; the cursor
    /// is then at the end position.
    fn increment(&mut self, index: &mut [usize], shape: &[usize]) -> bool {
        for dim in (0..shape.len()).rev() {
            if index[dim] + 1 < shape[dim] {
                index[dim] += 1;
                self.step(dim);
                return true;
            }
            index[dim] = 0;
            self.reset(dim);
        }
        self.ptr = self.end;
        false
    }
}

macro_rules! impl_stepper_moves {
    ($name:ident) => {
        impl<'a, T> $name<'a, T> {
            /// Moves one position forward along target dimension `dim`.
            #[inline]
            pub fn step(&mut self, dim: usize) {
                self.cursor.step(dim);
            }

            /// Moves one position backward along target dimension `dim`.
            #[inline]
            pub fn step_back(&mut self, dim: usize) {
                self.cursor.step_back(dim);
            }

            /// Rewinds target dimension `dim` from its last index to its first.
            #[inline]
            pub fn reset(&mut self, dim: usize) {
                self.cursor.reset(dim);
            }

            /// Moves target dimension `dim` from its first index to its last.
            #[inline]
            pub fn reset_back(&mut self, dim: usize) {
                self.cursor.reset_back(dim);
            }

            /// Moves to the end position.
            #[inline]
            pub fn to_end(&mut self) {
                self.cursor.ptr = self.cursor.end;
            }

            /// Rank difference between the target shape and the view.
            pub fn offset(&self) -> usize {
                self.cursor.offset
            }

            /// Current position.
            pub fn as_ptr(&self) -> *const T {
                self.cursor.ptr
            }

            /// Advances a row-major `index` over `shape` (the target shape this
            /// stepper was built for). Returns `false` when iteration is done.
            pub fn increment(&mut self, index: &mut [usize], shape: &[usize]) -> bool {
                self.cursor.increment(index, shape)
            }

            /// Reads the element under the cursor.
            ///
            /// # Safety
            /// The cursor must be on an element of the view, i.e. it was moved
            /// only in ways consistent with the target shape and is not at the
            /// end position.
            #[inline]
            pub unsafe fn read(&self) -> T
            where
                T: Copy,
            {
                *self.cursor.ptr
            }
        }

        impl<T> PartialEq for $name<'_, T> {
            fn eq(&self, other: &Self) -> bool {
                self.cursor.ptr == other.cursor.ptr
            }
        }
    };
}

/// Read-only stepper over a view.
#[derive(Debug, Clone)]
pub struct Stepper<'a, T> {
    cursor: Cursor<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Stepper<'a, T> {
    pub(crate) fn new(ptr: *const T, end: *const T, shape: &[usize], strides: &[isize], offset: usize) -> Self {
        Self {
            cursor: Cursor::new(ptr as *mut T, end as *mut T, shape, strides, offset),
            _marker: PhantomData,
        }
    }
}

impl_stepper_moves!(Stepper);

/// Stepper that can also write through the cursor.
#[derive(Debug)]
pub struct StepperMut<'a, T> {
    cursor: Cursor<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> StepperMut<'a, T> {
    pub(crate) fn new(ptr: *mut T, end: *mut T, shape: &[usize], strides: &[isize], offset: usize) -> Self {
        Self {
            cursor: Cursor::new(ptr, end, shape, strides, offset),
            _marker: PhantomData,
        }
    }

    /// Writes `value` under the cursor.
    ///
    /// This is the one way to write into a buffer that other views share.
    ///
    /// # Safety
    /// Same requirements as [`StepperMut::read`]. In addition, no reference to
    /// the element may be alive through another view of the same buffer, and
    /// no other thread may access the element concurrently.
    #[inline]
    pub unsafe fn write(&mut self, value: T) {
        *self.cursor.ptr = value;
    }

    /// Mutable reference to the element under the cursor.
    ///
    /// # Safety
    /// Same requirements as [`StepperMut::write`], for as long as the
    /// reference lives.
    #[inline]
    pub unsafe fn as_mut(&mut self) -> &mut T {
        &mut *self.cursor.ptr
    }
}

impl_stepper_moves!(StepperMut);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_reset() {
        let data = [1, 2, 3, 4, 5, 6];
        let base = data.as_ptr();
        let end = base.wrapping_add(data.len());
        let mut stepper = Stepper::new(base, end, &[2, 3], &[3, 1], 0);
        stepper.step(1);
        stepper.step(1);
        assert_eq!(unsafe { stepper.read() }, 3);
        stepper.step(0);
        assert_eq!(unsafe { stepper.read() }, 6);
        stepper.reset(1);
        assert_eq!(unsafe { stepper.read() }, 4);
        stepper.step_back(0);
        stepper.reset_back(1);
        assert_eq!(unsafe { stepper.read() }, 3);
        stepper.to_end();
        assert_eq!(stepper.as_ptr(), end);
    }

    #[test]
    fn test_broadcast_dimensions_do_not_move() {
        let data = [10, 20, 30];
        let base = data.as_ptr();
        // View of shape (1, 3) with a non-zero stride on its singleton axis,
        // iterated against a (2, 4, 3) target.
        let mut stepper = Stepper::new(base, base.wrapping_add(3), &[1, 3], &[3, 1], 1);
        assert_eq!(stepper.offset(), 1);
        stepper.step(0);
        stepper.step(1);
        assert_eq!(unsafe { stepper.read() }, 10);
        stepper.step(2);
        assert_eq!(unsafe { stepper.read() }, 20);
        stepper.reset(1);
        assert_eq!(unsafe { stepper.read() }, 20);
    }

    #[test]
    fn test_increment_visits_row_major() {
        let mut data = [0; 6];
        let base = data.as_mut_ptr();
        let mut stepper = StepperMut::new(base, base.wrapping_add(6), &[3, 2], &[1, 3], 0);
        let shape = [3, 2];
        let mut index = [0, 0];
        let mut counter = 0;
        loop {
            unsafe { stepper.write(counter) };
            counter += 1;
            if !stepper.increment(&mut index, &shape) {
                break;
            }
        }
        assert_eq!(counter, 6);
        // Column-major memory written in row-major index order.
        assert_eq!(data, [0, 2, 4, 1, 3, 5]);
    }
}
