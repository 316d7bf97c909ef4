//! Elementwise binary operations

use crate::{Result, Tensor, TensorError};
use ndarray::{IxDyn, Zip};
use num_traits::Float;

fn check_devices<T>(operation: &str, a: &Tensor<T>, b: &Tensor<T>) -> Result<()> {
    if a.device() != b.device() {
        return Err(TensorError::device_mismatch(
            operation,
            &a.device().to_string(),
            &b.device().to_string(),
        ));
    }
    Ok(())
}

/// Elementwise addition
///
/// `b` must be broadcastable to the shape of `a`; the result has the shape of `a`.
pub fn add<T: Float>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    check_devices("add", a, b)?;
    let lhs = a.array();
    let rhs = b.array().broadcast(lhs.raw_dim()).ok_or_else(|| {
        TensorError::shape_mismatch(
            "add",
            &a.shape().to_string(),
            &b.shape().to_string(),
        )
    })?;
    Ok(Tensor::from_array_on(lhs + &rhs, *a.device()))
}

/// In-place elementwise addition of a tensor with exactly the same shape
pub fn add_assign<T: Float>(a: &mut Tensor<T>, b: &Tensor<T>) -> Result<()> {
    check_devices("add_assign", a, b)?;
    if !a.same_shape(b) {
        return Err(TensorError::shape_mismatch(
            "add_assign",
            &a.shape().to_string(),
            &b.shape().to_string(),
        ));
    }
    Zip::from(a.array_mut())
        .and(b.array())
        .for_each(|acc, &value| *acc = *acc + value);
    Ok(())
}

/// Add `bias[c]` to every element of channel `c`
///
/// `tensor` has layout `[batch, channels, ...]` and `bias` is a vector of length
/// `channels`. The bias is broadcast over the batch and all trailing axes in one pass.
pub fn add_channel_bias<T: Float>(tensor: &Tensor<T>, bias: &Tensor<T>) -> Result<Tensor<T>> {
    check_devices("add_channel_bias", tensor, bias)?;
    let dims = tensor.shape().dims();
    if dims.len() < 2 {
        return Err(TensorError::invalid_shape(
            "add_channel_bias",
            format!("expected at least 2 dimensions [batch, channels, ...], got {}D", dims.len()),
            dims,
        ));
    }
    if bias.shape().dims() != [dims[1]] {
        return Err(TensorError::shape_mismatch(
            "add_channel_bias",
            &format!("[{}]", dims[1]),
            &bias.shape().to_string(),
        ));
    }

    let mut bias_dims = vec![1; dims.len()];
    bias_dims[1] = dims[1];
    let bias_view = bias.array().to_shape(IxDyn(&bias_dims))?;
    let broadcast = bias_view
        .broadcast(tensor.array().raw_dim())
        .ok_or_else(|| {
            TensorError::shape_mismatch(
                "add_channel_bias",
                &tensor.shape().to_string(),
                &bias.shape().to_string(),
            )
        })?;
    Ok(Tensor::from_array_on(
        tensor.array() + &broadcast,
        *tensor.device(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_same_shape() {
        let a = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let b = Tensor::<f32>::from_vec(vec![10.0, 20.0, 30.0, 40.0], &[2, 2]).unwrap();
        let c = add(&a, &b).unwrap();
        assert_eq!(c.to_vec(), vec![11.0, 22.0, 33.0, 44.0]);
    }

    #[test]
    fn test_add_rejects_incompatible_shapes() {
        let a = Tensor::<f32>::zeros(&[2, 3]);
        let b = Tensor::<f32>::zeros(&[3, 2]);
        assert!(add(&a, &b).unwrap_err().is_shape_error());
    }

    #[test]
    fn test_add_assign_accumulates() {
        let mut acc = Tensor::<f64>::ones(&[3]);
        let b = Tensor::<f64>::full(&[3], 2.0);
        add_assign(&mut acc, &b).unwrap();
        add_assign(&mut acc, &b).unwrap();
        assert_eq!(acc.to_vec(), vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_channel_bias_broadcast() {
        let x = Tensor::<f32>::zeros(&[2, 3, 2, 2]);
        let bias = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let y = add_channel_bias(&x, &bias).unwrap();
        for b in 0..2 {
            for c in 0..3 {
                for h in 0..2 {
                    for w in 0..2 {
                        assert_eq!(y.get(&[b, c, h, w]), Some((c + 1) as f32));
                    }
                }
            }
        }
    }

    #[test]
    fn test_channel_bias_wrong_length() {
        let x = Tensor::<f32>::zeros(&[1, 2, 4]);
        let bias = Tensor::<f32>::zeros(&[3]);
        assert!(add_channel_bias(&x, &bias).unwrap_err().is_shape_error());
    }
}
