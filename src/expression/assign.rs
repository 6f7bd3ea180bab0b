//! Materialising expressions into views.

use super::Expression;
use crate::error::Result;
use crate::storage::Element;
use crate::view::HostArray;

/// Evaluates `expr` into `dst`.
///
/// `dst` is reshaped to the expression's shape first (a no-op when it already
/// has it). A destination whose buffer is still shared with another view is
/// refused with
/// [`SharedBuffer`](crate::HostArrayError::SharedBuffer). A dense destination whose layout the expression can follow
/// linearly is filled in memory order; anything else is filled through a
/// stepper in row-major index order.
pub fn assign<T, E>(dst: &mut HostArray<T>, expr: &E) -> Result<()>
where
    T: Element,
    E: Expression<T> + ?Sized,
{
    expr.validate()?;
    let shape = expr.shape();
    dst.reshape(&shape)?;
    dst.exclusive_handle()?;

    let size = dst.size();
    let strides = dst.strides();
    if dst.is_contiguous() && expr.trivial_broadcast(&shape, &strides) {
        tracing::trace!(?shape, size, "linear assignment");
        let base = dst.data_mut()?;
        for position in 0..size {
            // SAFETY: a dense view covers `size` elements from its first one,
            // and `trivial_broadcast` held for its shape and strides.
            unsafe { base.add(position).write(expr.linear_at(position)) };
        }
        return Ok(());
    }

    tracing::trace!(?shape, ?strides, size, "strided assignment");
    let mut stepper = dst.stepper_begin_mut(&shape)?;
    let mut index = vec![0; shape.len()];
    for _ in 0..size {
        // SAFETY: `index` walks `shape`, so the cursor is on an element.
        unsafe { stepper.write(expr.eval_at(&index)) };
        stepper.increment(&mut index, &shape);
    }
    Ok(())
}
