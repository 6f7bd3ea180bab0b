//! Expression nodes: views, scalars, and lazy elementwise combinations.

use std::marker::PhantomData;

use super::{broadcast_pair, Expression};
use crate::error::{HostArrayError, Result};
use crate::storage::Element;
use crate::view::HostArray;

/// Function pointer used by the arithmetic combinators.
pub type BinaryFn<T> = fn(T, T) -> T;

impl<T: Element> Expression<T> for &HostArray<T> {
    fn shape(&self) -> Vec<usize> {
        HostArray::shape(self).to_vec()
    }

    /// # Panics
    /// If `index` has fewer dimensions than the view, or a component is out of
    /// bounds on a non-singleton axis.
    fn eval_at(&self, index: &[usize]) -> T {
        let Some(handle) = self.handle() else {
            return T::default();
        };
        let shape = handle.shape();
        let Some(lead) = index.len().checked_sub(shape.len()) else {
            panic!("{}", HostArrayError::dimension_mismatch(shape.len(), index.len()));
        };
        let axes = shape.iter().zip(handle.byte_strides()).zip(&index[lead..]);
        let mut offset = 0isize;
        for (axis, ((&n, &s), &i)) in axes.enumerate() {
            if n == 1 {
                continue;
            }
            if i >= n {
                panic!("{}", HostArrayError::index_out_of_bounds(i, n, axis));
            }
            offset += i as isize * s;
        }
        // SAFETY: every non-singleton component was checked against the shape.
        unsafe { handle.as_ptr().offset(offset).cast::<T>().read() }
    }

    fn trivial_broadcast(&self, shape: &[usize], strides: &[isize]) -> bool {
        HostArray::shape(self) == shape && self.is_trivial_broadcast(strides)
    }

    unsafe fn linear_at(&self, position: usize) -> T {
        // SAFETY: the caller's destination is dense with this view's shape and
        // strides, so this view is dense too and `position < size()`.
        unsafe { self.data().add(position).read() }
    }

    fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(HostArrayError::InvalidArray)
        }
    }
}

/// A rank-0 expression that broadcasts one value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar<T>(pub T);

impl<T: Copy> Expression<T> for Scalar<T> {
    fn shape(&self) -> Vec<usize> {
        Vec::new()
    }

    fn eval_at(&self, _index: &[usize]) -> T {
        self.0
    }

    fn trivial_broadcast(&self, _shape: &[usize], _strides: &[isize]) -> bool {
        true
    }

    unsafe fn linear_at(&self, _position: usize) -> T {
        self.0
    }
}

/// Applies a function to every element of an expression.
#[derive(Debug, Clone)]
pub struct MapExpr<E, F, A> {
    inner: E,
    f: F,
    _marker: PhantomData<fn(A)>,
}

impl<E, F, A> MapExpr<E, F, A> {
    pub fn new(inner: E, f: F) -> Self {
        Self {
            inner,
            f,
            _marker: PhantomData,
        }
    }
}

impl<E, F, A, R> Expression<R> for MapExpr<E, F, A>
where
    E: Expression<A>,
    F: Fn(A) -> R,
{
    fn shape(&self) -> Vec<usize> {
        self.inner.shape()
    }

    fn eval_at(&self, index: &[usize]) -> R {
        (self.f)(self.inner.eval_at(index))
    }

    fn trivial_broadcast(&self, shape: &[usize], strides: &[isize]) -> bool {
        self.inner.trivial_broadcast(shape, strides)
    }

    unsafe fn linear_at(&self, position: usize) -> R {
        // SAFETY: forwarded from the caller.
        (self.f)(unsafe { self.inner.linear_at(position) })
    }

    fn validate(&self) -> Result<()> {
        self.inner.validate()
    }
}

/// Combines two expressions elementwise over their broadcast shape.
#[derive(Debug, Clone)]
pub struct ZipExpr<L, R, F, A, B> {
    lhs: L,
    rhs: R,
    f: F,
    _marker: PhantomData<fn(A, B)>,
}

impl<L, R, F, A, B> ZipExpr<L, R, F, A, B> {
    pub fn new(lhs: L, rhs: R, f: F) -> Self {
        Self {
            lhs,
            rhs,
            f,
            _marker: PhantomData,
        }
    }
}

impl<L, R, F, A, B, O> Expression<O> for ZipExpr<L, R, F, A, B>
where
    L: Expression<A>,
    R: Expression<B>,
    F: Fn(A, B) -> O,
{
    /// The broadcast of both operand shapes; the larger rank wins when the
    /// shapes are incompatible, which [`Expression::validate`] reports.
    fn shape(&self) -> Vec<usize> {
        let lhs = self.lhs.shape();
        let rhs = self.rhs.shape();
        broadcast_pair(&lhs, &rhs).unwrap_or(if lhs.len() >= rhs.len() { lhs } else { rhs })
    }

    fn eval_at(&self, index: &[usize]) -> O {
        (self.f)(self.lhs.eval_at(index), self.rhs.eval_at(index))
    }

    fn trivial_broadcast(&self, shape: &[usize], strides: &[isize]) -> bool {
        self.lhs.trivial_broadcast(shape, strides) && self.rhs.trivial_broadcast(shape, strides)
    }

    unsafe fn linear_at(&self, position: usize) -> O {
        // SAFETY: both operands were asked about the same destination.
        let (lhs, rhs) = unsafe { (self.lhs.linear_at(position), self.rhs.linear_at(position)) };
        (self.f)(lhs, rhs)
    }

    fn validate(&self) -> Result<()> {
        self.lhs.validate()?;
        self.rhs.validate()?;
        broadcast_pair(&self.lhs.shape(), &self.rhs.shape()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExprExt;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_eval_at_broadcasts() {
        let a = HostArray::from_vec(vec![1.0, 2.0, 3.0], &[1, 3]).unwrap();
        let view = &a;
        assert_eq!(view.eval_at(&[0, 2]), 3.0);
        assert_eq!(view.eval_at(&[5, 3, 0, 1]), 2.0);
        assert!(view.validate().is_ok());
        assert!((&HostArray::<f64>::new()).validate().is_err());
    }

    #[test]
    fn test_zip_shape_and_values() {
        let a = HostArray::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let b = HostArray::from_vec(vec![10.0, 20.0], &[2, 1]).unwrap();
        let sum = (&a).add(&b);
        assert_eq!(sum.shape(), vec![2, 3]);
        assert_relative_eq!(sum.eval_at(&[1, 2]), 23.0);
        assert_relative_eq!(sum.eval_at(&[0, 0]), 11.0);
        assert!(sum.validate().is_ok());
    }

    #[test]
    fn test_incompatible_zip_fails_validation() {
        let a = HostArray::<i32>::from_shape(&[3]).unwrap();
        let b = HostArray::<i32>::from_shape(&[4]).unwrap();
        assert!(matches!((&a).mul(&b).validate(), Err(HostArrayError::BroadcastError(..))));
    }

    #[test]
    fn test_scalar_and_map() {
        let a = HostArray::from_vec(vec![1, 2, 3, 4], &[2, 2]).unwrap();
        let expr = (&a).map(|x: i32| x * 10).sub(Scalar(1));
        assert_eq!(expr.shape(), vec![2, 2]);
        assert_eq!(expr.eval_at(&[1, 1]), 39);
        assert!(expr.trivial_broadcast(&[2, 2], &[2, 1]));
        assert!(!expr.trivial_broadcast(&[2, 2], &[1, 2]));
        assert_eq!(unsafe { expr.linear_at(2) }, 29);
    }

    #[test]
    #[should_panic(expected = "Index out of bounds")]
    fn test_view_eval_at_rejects_out_of_range_index() {
        let a = HostArray::from_vec(vec![1, 2, 3], &[3]).unwrap();
        (&a).eval_at(&[100_000]);
    }

    #[test]
    #[should_panic(expected = "Index dimension mismatch")]
    fn test_view_eval_at_rejects_short_index() {
        let a = HostArray::<f32>::from_shape(&[2, 2]).unwrap();
        (&a).eval_at(&[0]);
    }

    #[test]
    fn test_view_eval_at_ignores_singleton_components() {
        let a = HostArray::from_vec(vec![4, 5], &[1, 2]).unwrap();
        assert_eq!((&a).eval_at(&[7, 1]), 5);
    }
}
