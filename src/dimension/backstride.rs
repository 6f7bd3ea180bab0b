//! Backstrides: the element delta that rewinds a dimension from its last
//! index to its first.

use super::StridedLayout;

/// Backstrides of a strided layout, computed on demand.
///
/// Holds only a reference to the layout, so it always reflects the layout's
/// current shape and strides.
#[derive(Debug)]
pub struct Backstrides<'a, L: ?Sized> {
    layout: &'a L,
}

impl<L: ?Sized> Clone for Backstrides<'_, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: ?Sized> Copy for Backstrides<'_, L> {}

impl<'a, L: StridedLayout + ?Sized> Backstrides<'a, L> {
    pub fn new(layout: &'a L) -> Self {
        Self { layout }
    }

    /// Backstride of dimension `axis`.
    ///
    /// A length-1 dimension never advances, so it never rewinds either.
    ///
    /// # Panics
    /// Panics if `axis` is out of range.
    pub fn get(&self, axis: usize) -> isize {
        let n = self.layout.shape()[axis];
        if n == 1 {
            0
        } else {
            (n as isize - 1) * self.layout.stride(axis)
        }
    }

    pub fn len(&self) -> usize {
        self.layout.dimension()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = isize> + '_ {
        (0..self.len()).map(move |axis| self.get(axis))
    }

    pub fn to_vec(&self) -> Vec<isize> {
        self.iter().collect()
    }
}
