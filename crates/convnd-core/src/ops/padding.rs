//! Axis padding

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::{Result, Tensor, TensorError};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use num_traits::Float;

/// How values outside the input are filled when padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum PaddingMode {
    /// Fill with zeros
    #[default]
    Zeros,
    /// Mirror around the edge element, excluding it: `[1, 2, 3]` padded by 2 on the
    /// left gives `[3, 2, 1, 2, 3]`
    Reflect,
}

impl std::fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaddingMode::Zeros => write!(f, "zeros"),
            PaddingMode::Reflect => write!(f, "reflect"),
        }
    }
}

/// Pad a single axis by `before` and `after` elements
pub fn pad_axis<T: Float>(
    tensor: &Tensor<T>,
    axis: usize,
    before: usize,
    after: usize,
    mode: PaddingMode,
) -> Result<Tensor<T>> {
    let rank = tensor.rank();
    if axis >= rank {
        return Err(TensorError::invalid_axis("pad", axis, rank));
    }
    if before == 0 && after == 0 {
        return Ok(tensor.clone());
    }

    let array = tensor.array();
    let len = array.len_of(Axis(axis));
    let padded = match mode {
        PaddingMode::Zeros => {
            let mut out_shape = array.shape().to_vec();
            out_shape[axis] = len + before + after;
            let mut out = ArrayD::zeros(IxDyn(&out_shape));
            out.slice_axis_mut(Axis(axis), Slice::from(before..before + len))
                .assign(array);
            out
        }
        PaddingMode::Reflect => {
            if before >= len || after >= len {
                return Err(TensorError::invalid_shape(
                    "pad",
                    format!(
                        "reflect padding ({before}, {after}) must be smaller than axis {axis} of length {len}"
                    ),
                    array.shape(),
                ));
            }
            let indices: Vec<usize> = (1..=before)
                .rev()
                .chain(0..len)
                .chain((1..=after).map(|t| len - 1 - t))
                .collect();
            array.select(Axis(axis), &indices)
        }
    };
    Ok(Tensor::from_array_on(padded, *tensor.device()))
}

/// Pad consecutive axes starting at `first_axis`, each symmetrically
///
/// `padding[i]` elements are added on both ends of axis `first_axis + i`.
pub fn pad_axes<T: Float>(
    tensor: &Tensor<T>,
    first_axis: usize,
    padding: &[usize],
    mode: PaddingMode,
) -> Result<Tensor<T>> {
    let mut padded = tensor.clone();
    for (offset, &pad) in padding.iter().enumerate() {
        if pad > 0 {
            padded = pad_axis(&padded, first_axis + offset, pad, pad, mode)?;
        }
    }
    Ok(padded)
}
