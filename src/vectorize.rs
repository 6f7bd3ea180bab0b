//! Lifting scalar functions to whole host arrays.
//!
//! [`vectorize`] turns a function of one to three scalar arguments into a
//! callable that accepts host buffers, forces each into a C-contiguous array of
//! the argument type, and evaluates the function over the broadcast of their
//! shapes.
//!
//! ```
//! use std::sync::Arc;
//! use tensorust_host::{vectorize, BufferHandle, NdBuffer};
//!
//! let x: BufferHandle = Arc::new(NdBuffer::from_vec(vec![1i32, 2, 3], &[3]).unwrap());
//! let y: BufferHandle = Arc::new(NdBuffer::from_vec(vec![0.5f64], &[1]).unwrap());
//! let scaled = vectorize(|a: f64, b: f64| a * b).call(&x, &y).unwrap();
//! assert_eq!(scaled.to_vec(), vec![0.5, 1.0, 1.5]);
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{HostArrayError, Result};
use crate::expression::ExprExt;
use crate::storage::convert::ArrayFlags;
use crate::storage::{BufferHandle, Element};
use crate::view::HostArray;

/// Scalar functions that [`vectorize`] can lift.
///
/// `M` is the function-pointer signature of the scalar function; it only
/// exists to keep the arity impls apart.
pub trait Vectorize<M> {
    type Vectorized;

    fn vectorize(self) -> Self::Vectorized;
}

/// Lifts `f` to operate elementwise on host buffers.
pub fn vectorize<F, M>(f: F) -> F::Vectorized
where
    F: Vectorize<M>,
{
    f.vectorize()
}

/// Forces `handle` into a C-contiguous array of `T`.
fn force<T: Element>(handle: &BufferHandle) -> Result<HostArray<T>> {
    let array = HostArray::from_object(Some(Arc::clone(handle)), ArrayFlags::c_style_forcecast());
    if array.is_valid() {
        Ok(array)
    } else {
        Err(HostArrayError::conversion_failed(format!(
            "cannot convert {} buffer of shape {:?} to {}",
            handle.dtype(),
            handle.shape(),
            T::DTYPE
        )))
    }
}

macro_rules! vectorized {
    ($(#[$meta:meta])* $name:ident($($arg:ident: $ty:ident),+) => |$f:ident| $build:expr) => {
        $(#[$meta])*
        pub struct $name<F, $($ty,)+ R> {
            f: F,
            _marker: PhantomData<fn($($ty),+) -> R>,
        }

        impl<F, $($ty,)+ R> $name<F, $($ty,)+ R>
        where
            F: Fn($($ty),+) -> R,
            $($ty: Element,)+
            R: Element,
        {
            /// Evaluates the function over the broadcast of the arguments.
            pub fn call(&self, $($arg: &BufferHandle),+) -> Result<HostArray<R>> {
                $(let $arg = force::<$ty>($arg)?;)+
                let $f = &self.f;
                HostArray::from_expr($build)
            }

            /// The wrapped scalar function.
            pub fn inner(&self) -> &F {
                &self.f
            }
        }

        impl<F, $($ty,)+ R> Vectorize<fn($($ty),+) -> R> for F
        where
            F: Fn($($ty),+) -> R,
        {
            type Vectorized = $name<F, $($ty,)+ R>;

            fn vectorize(self) -> Self::Vectorized {
                $name {
                    f: self,
                    _marker: PhantomData,
                }
            }
        }
    };
}

vectorized! {
    /// A vectorized unary function.
    Vectorized1(a: A) => |f| (&a).map(f)
}

vectorized! {
    /// A vectorized binary function.
    Vectorized2(a: A, b: B) => |f| (&a).zip_with(&b, f)
}

vectorized! {
    /// A vectorized ternary function.
    Vectorized3(a: A, b: B, c: C) => |f| (&a)
        .zip_with(&b, |x: A, y: B| (x, y))
        .zip_with(&c, move |(x, y): (A, B), z: C| f(x, y, z))
}
