//! Shape helpers: broadcasting and layout classification.

use crate::error::{HostArrayError, Result};

/// Merges `input` into the broadcast target `output`.
///
/// `input` aligns to the trailing dimensions of `output`. A target dimension
/// of length 1 takes the input's length; an input dimension of length 1
/// repeats. Returns `true` when the broadcast is trivial: equal rank and equal
/// lengths everywhere.
pub fn broadcast_shape(input: &[usize], output: &mut [usize]) -> Result<bool> {
    if input.len() > output.len() {
        return Err(HostArrayError::broadcast_error(input, output));
    }
    let offset = output.len() - input.len();
    let mut trivial = offset == 0;
    for (i, &n) in input.iter().enumerate() {
        let target = &mut output[offset + i];
        if *target == 1 {
            *target = n;
        } else if n != 1 && n != *target {
            return Err(HostArrayError::broadcast_error(input, output));
        }
        trivial = trivial && n == output[offset + i];
    }
    Ok(trivial)
}

/// Returns `true` if `strides` visit exactly the element offsets `0..size`.
///
/// Length-1 dimensions are ignored, so both reshaped layouts (stride 0 on
/// singleton axes) and permuted dense layouts qualify.
pub fn is_dense(shape: &[usize], strides: &[isize]) -> bool {
    if shape.len() != strides.len() {
        return false;
    }
    if shape.iter().any(|&n| n == 0) {
        return true;
    }
    let mut axes: Vec<(usize, isize)> = shape
        .iter()
        .zip(strides)
        .filter(|&(&n, _)| n != 1)
        .map(|(&n, &s)| (n, s))
        .collect();
    axes.sort_by_key(|&(_, s)| s);
    let mut expected = 1isize;
    for (n, s) in axes {
        if s != expected {
            return false;
        }
        expected *= n as isize;
    }
    true
}
