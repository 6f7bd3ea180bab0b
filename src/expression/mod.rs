//! Elementwise expressions that can be assigned into a [`HostArray`].
//!
//! An expression is anything that can report a shape and produce the element
//! at a multi-index of that shape. Views, scalars and lazily combined
//! map/zip nodes all qualify; [`assign`] materialises one into a view.
//!
//! [`HostArray`]: crate::HostArray

use crate::dimension;
use crate::error::Result;

mod assign;
pub mod nodes;

pub use assign::assign;
pub use nodes::{BinaryFn, MapExpr, Scalar, ZipExpr};

/// A lazily evaluated N-dimensional value.
pub trait Expression<T> {
    /// Shape of the value.
    fn shape(&self) -> Vec<usize>;

    /// Element at `index`.
    ///
    /// `index` may have a higher rank than [`Expression::shape`]; it aligns to
    /// the trailing dimensions, and dimensions of length 1 repeat. Views panic
    /// on an index outside every shape they broadcast to.
    fn eval_at(&self, index: &[usize]) -> T;

    /// Returns `true` if evaluating into a dense destination with the given
    /// shape and element strides may use [`Expression::linear_at`].
    fn trivial_broadcast(&self, shape: &[usize], strides: &[isize]) -> bool;

    /// Element at memory position `position` of a dense destination for which
    /// [`Expression::trivial_broadcast`] returned `true`.
    ///
    /// # Safety
    /// `trivial_broadcast(shape, strides)` must have returned `true` for a
    /// dense layout `shape`/`strides`, and `position` must be less than the
    /// product of `shape`.
    ///
    /// ```compile_fail
    /// use tensorust_host::{Expression, HostArray};
    ///
    /// let a = HostArray::from_vec(vec![1, 2, 3], &[3]).unwrap();
    /// let _ = (&a).linear_at(100_000);
    /// ```
    unsafe fn linear_at(&self, position: usize) -> T;

    /// Checks that the expression can be evaluated at all.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Combinators available on every expression.
pub trait ExprExt<T>: Expression<T> + Sized {
    /// Applies `f` to every element.
    fn map<R, F>(self, f: F) -> MapExpr<Self, F, T>
    where
        F: Fn(T) -> R,
    {
        MapExpr::new(self, f)
    }

    /// Combines two expressions elementwise after broadcasting their shapes.
    fn zip_with<B, R, E, F>(self, other: E, f: F) -> ZipExpr<Self, E, F, T, B>
    where
        E: Expression<B>,
        F: Fn(T, B) -> R,
    {
        ZipExpr::new(self, other, f)
    }

    fn add<E: Expression<T>>(self, rhs: E) -> ZipExpr<Self, E, BinaryFn<T>, T, T>
    where
        T: num_traits::Num,
    {
        let f: BinaryFn<T> = |a, b| a + b;
        ZipExpr::new(self, rhs, f)
    }

    fn sub<E: Expression<T>>(self, rhs: E) -> ZipExpr<Self, E, BinaryFn<T>, T, T>
    where
        T: num_traits::Num,
    {
        let f: BinaryFn<T> = |a, b| a - b;
        ZipExpr::new(self, rhs, f)
    }

    fn mul<E: Expression<T>>(self, rhs: E) -> ZipExpr<Self, E, BinaryFn<T>, T, T>
    where
        T: num_traits::Num,
    {
        let f: BinaryFn<T> = |a, b| a * b;
        ZipExpr::new(self, rhs, f)
    }

    fn div<E: Expression<T>>(self, rhs: E) -> ZipExpr<Self, E, BinaryFn<T>, T, T>
    where
        T: num_traits::Num,
    {
        let f: BinaryFn<T> = |a, b| a / b;
        ZipExpr::new(self, rhs, f)
    }
}

impl<T, E: Expression<T>> ExprExt<T> for E {}

/// Broadcast shape of two expression shapes.
pub(crate) fn broadcast_pair(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let mut shape = vec![1; lhs.len().max(rhs.len())];
    dimension::broadcast_shape(lhs, &mut shape)?;
    dimension::broadcast_shape(rhs, &mut shape)?;
    Ok(shape)
}
