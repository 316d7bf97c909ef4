//! Shape manipulation: selection along an axis, stacking, reshaping

use crate::{Result, Tensor, TensorError};
use ndarray::{Axis, IxDyn};
use num_traits::Float;

/// Select a single index along `axis`
///
/// The result has the axis removed, e.g. selecting along axis 2 of a
/// `[batch, channels, d0, d1]` tensor yields `[batch, channels, d1]`.
pub fn select<T: Float>(tensor: &Tensor<T>, axis: usize, index: usize) -> Result<Tensor<T>> {
    let rank = tensor.rank();
    if axis >= rank {
        return Err(TensorError::invalid_axis("select", axis, rank));
    }
    let len = tensor.shape()[axis];
    if index >= len {
        return Err(TensorError::invalid_argument_op(
            "select",
            &format!("index {index} out of range for axis {axis} of length {len}"),
        ));
    }
    let view = tensor.array().index_axis(Axis(axis), index);
    Ok(Tensor::from_array_on(view.to_owned(), *tensor.device()))
}

/// Stack same-shaped tensors along a new axis
pub fn stack<T: Float>(tensors: &[&Tensor<T>], axis: usize) -> Result<Tensor<T>> {
    let Some(first) = tensors.first() else {
        return Err(TensorError::invalid_argument_op(
            "stack",
            "cannot stack an empty tensor list",
        ));
    };

    for tensor in &tensors[1..] {
        if tensor.shape() != first.shape() {
            return Err(TensorError::shape_mismatch(
                "stack",
                &first.shape().to_string(),
                &tensor.shape().to_string(),
            ));
        }
        if tensor.device() != first.device() {
            return Err(TensorError::device_mismatch(
                "stack",
                &first.device().to_string(),
                &tensor.device().to_string(),
            ));
        }
    }

    if axis > first.rank() {
        return Err(TensorError::invalid_axis("stack", axis, first.rank() + 1));
    }

    let views: Vec<_> = tensors.iter().map(|t| t.array().view()).collect();
    let stacked = ndarray::stack(Axis(axis), &views)?;
    Ok(Tensor::from_array_on(stacked, *first.device()))
}

/// Reshape a tensor, keeping row-major element order
pub fn reshape<T: Float>(tensor: &Tensor<T>, shape: &[usize]) -> Result<Tensor<T>> {
    let size: usize = shape.iter().product();
    if size != tensor.numel() {
        return Err(TensorError::shape_mismatch(
            "reshape",
            &format!("{} elements", tensor.numel()),
            &format!("{shape:?} ({size} elements)"),
        ));
    }
    let reshaped = tensor.array().to_shape(IxDyn(shape))?.into_owned();
    Ok(Tensor::from_array_on(reshaped, *tensor.device()))
}
