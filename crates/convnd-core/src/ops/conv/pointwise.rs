//! Pointwise (rank-0) convolution
//!
//! A convolution with no spatial axes reduces to a grouped matrix product over the
//! channel axis. It is the leaf used when a recursive convolution runs out of
//! spatial axes.

use super::nd::{conv_nd, conv_transpose_nd};
use crate::ops::padding::PaddingMode;
use crate::{Result, Tensor};
use num_traits::Float;

/// Channel mixing convolution
/// Input shape: [batch, in_channels]
/// Weight shape: [out_channels, in_channels / groups]
/// Output shape: [batch, out_channels]
pub fn conv_pointwise<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_nd(input, weight, bias, &[], &[], PaddingMode::Zeros, groups)
}

/// Transposed channel mixing convolution
/// Input shape: [batch, in_channels]
/// Weight shape: [in_channels, out_channels / groups]
/// Output shape: [batch, out_channels]
pub fn conv_transpose_pointwise<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_transpose_nd(input, weight, bias, &[], &[], groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_pointwise_uses_weight_transposed() {
        let x = Tensor::<f64>::from_vec(vec![1.0, 2.0], &[1, 2]).unwrap();
        // [in=2, out=3]
        let w = Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let bias = Tensor::<f64>::from_vec(vec![1.0, 1.0, 1.0], &[3]).unwrap();
        let y = conv_transpose_pointwise(&x, &w, Some(&bias), 1).unwrap();
        assert_eq!(y.shape().dims(), &[1, 3]);
        assert_eq!(y.to_vec(), vec![10.0, 13.0, 16.0]);
    }

    #[test]
    fn test_pointwise_rejects_spatial_input() {
        let x = Tensor::<f32>::zeros(&[1, 2, 4]);
        let w = Tensor::<f32>::zeros(&[3, 2]);
        assert!(conv_pointwise(&x, &w, None, 1).unwrap_err().is_shape_error());
    }
}
