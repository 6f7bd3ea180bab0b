//! Typed strided N-dimensional views over host-owned memory.
//!
//! `tensorust-host` adapts buffer-protocol memory (a data pointer, a dtype,
//! per-dimension lengths and byte strides) into [`HostArray`], an element-
//! strided view with multi-index access, backstrides, broadcasting steppers,
//! reshape, and assignment from lazy elementwise expressions.
//!
//! ```
//! use tensorust_host::{ExprExt, HostArray, Scalar};
//!
//! let a = HostArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! assert_eq!(a.strides(), vec![2, 1]);
//! assert_eq!(a.backstrides().to_vec(), vec![2, 1]);
//! assert_eq!(a[[1, 0]], 3.0);
//!
//! let b = HostArray::from_expr((&a).mul(Scalar(10.0))).unwrap();
//! assert_eq!(b.to_vec(), vec![10.0, 20.0, 30.0, 40.0]);
//! ```

#[macro_use]
mod macros;

pub mod dimension;
pub mod error;
pub mod expression;
pub mod storage;
pub mod vectorize;
pub mod view;

pub use dimension::{Backstrides, DynamicDim, Layout, Stride, StridedLayout};
pub use error::{HostArrayError, Result};
pub use expression::{ExprExt, Expression, MapExpr, Scalar, ZipExpr};
pub use storage::convert::{ensure, ArrayFlags};
pub use storage::{BufferHandle, BufferInfo, Dtype, DtypeKind, Element, HostBuffer, NdBuffer};
#[cfg(feature = "mmap")]
pub use storage::MmapBuffer;
pub use vectorize::{vectorize, Vectorize, Vectorized1, Vectorized2, Vectorized3};
pub use view::{BroadcastIter, HostArray, Stepper, StepperMut};
