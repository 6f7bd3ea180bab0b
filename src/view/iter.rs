//! Broadcasting iteration over views.

use std::iter::FusedIterator;

use super::stepper::Stepper;

/// Iterator over a view's elements in the row-major order of a broadcast
/// target shape.
///
/// Dimensions the view lacks, or has with length 1, replay the same values.
/// Iteration ends when the outermost dimension wraps.
#[derive(Debug, Clone)]
pub struct BroadcastIter<'a, T> {
    stepper: Stepper<'a, T>,
    shape: Vec<usize>,
    index: Vec<usize>,
    remaining: usize,
}

impl<'a, T> BroadcastIter<'a, T> {
    pub(crate) fn new(stepper: Stepper<'a, T>, shape: &[usize]) -> Self {
        Self {
            stepper,
            shape: shape.to_vec(),
            index: vec![0; shape.len()],
            remaining: shape.iter().product(),
        }
    }

    pub(crate) fn empty(stepper: Stepper<'a, T>) -> Self {
        Self {
            stepper,
            shape: Vec::new(),
            index: Vec::new(),
            remaining: 0,
        }
    }

    /// The broadcast target shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Index in the target shape of the next element.
    pub fn index(&self) -> &[usize] {
        &self.index
    }
}

impl<T: Copy> Iterator for BroadcastIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `remaining > 0` means the stepper sits on the element at
        // `index`, which lies inside a shape validated against the view.
        let value = unsafe { self.stepper.read() };
        self.remaining -= 1;
        if !self.stepper.increment(&mut self.index, &self.shape) {
            self.remaining = 0;
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy> ExactSizeIterator for BroadcastIter<'_, T> {}

impl<T: Copy> FusedIterator for BroadcastIter<'_, T> {}
