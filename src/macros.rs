//! Macros for creating host arrays with a convenient syntax.

/// Creates a dense row-major [`HostArray`](crate::HostArray) from a literal.
///
/// Evaluates to a `Result`, since ragged rows are rejected.
///
/// # Examples
/// ```
/// use tensorust_host::host_array;
///
/// let v = host_array![1.0, 2.0, 3.0].unwrap();
/// assert_eq!(v.shape(), &[3]);
///
/// let m = host_array![[1, 2, 3], [4, 5, 6]].unwrap();
/// assert_eq!(m.shape(), &[2, 3]);
/// assert_eq!(m[[1, 0]], 4);
///
/// assert!(host_array![[1, 2], [3]].is_err());
/// ```
#[macro_export]
macro_rules! host_array {
    ($([$($x:expr),* $(,)?]),+ $(,)?) => {{
        let rows = vec![$(vec![$($x),*]),+];
        let cols = rows[0].len();
        match rows.iter().position(|row| row.len() != cols) {
            Some(i) => Err($crate::HostArrayError::shape_mismatch(&[cols], &[rows[i].len()])),
            None => {
                let shape = [rows.len(), cols];
                $crate::HostArray::from_vec(rows.into_iter().flatten().collect(), &shape)
            }
        }
    }};
    ($($x:expr),+ $(,)?) => {{
        let data = vec![$($x),+];
        let shape = [data.len()];
        $crate::HostArray::from_vec(data, &shape)
    }};
}

/// Allocates a zero-filled row-major [`HostArray`](crate::HostArray).
///
/// # Examples
/// ```
/// use tensorust_host::zeros;
///
/// let z = zeros!(f32; [2, 3]).unwrap();
/// assert_eq!(z.to_vec(), vec![0.0; 6]);
/// ```
#[macro_export]
macro_rules! zeros {
    ($t:ty; [$($dim:expr),* $(,)?]) => {
        $crate::HostArray::<$t>::from_shape(&[$($dim),*])
    };
}
