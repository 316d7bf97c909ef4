//! 1D convolution operations

use super::nd::conv_nd;
use crate::ops::padding::PaddingMode;
use crate::{Result, Tensor};
use num_traits::Float;

/// Performs 1D convolution operation
/// Input shape: [batch, in_channels, length] (NCL format)
/// Weight shape: [out_channels, in_channels / groups, kernel_length]
/// Output shape: [batch, out_channels, out_length]
pub fn conv1d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: usize,
    padding: usize,
    padding_mode: PaddingMode,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_nd(
        input,
        weight,
        bias,
        &[stride],
        &[padding],
        padding_mode,
        groups,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv1d_moving_sum() {
        let x = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0], &[1, 1, 5]).unwrap();
        let w = Tensor::<f32>::ones(&[1, 1, 3]);
        let y = conv1d(&x, &w, None, 1, 0, PaddingMode::Zeros, 1).unwrap();
        assert_eq!(y.to_vec(), vec![6.0, 9.0, 12.0]);

        let strided = conv1d(&x, &w, None, 2, 1, PaddingMode::Zeros, 1).unwrap();
        assert_eq!(strided.to_vec(), vec![3.0, 9.0, 9.0]);
    }

    #[test]
    fn test_conv1d_reflect_padding() {
        let x = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0], &[1, 1, 3]).unwrap();
        let w = Tensor::<f32>::ones(&[1, 1, 3]);
        // reflect pad 1: [2, 1, 2, 3, 2]
        let y = conv1d(&x, &w, None, 1, 1, PaddingMode::Reflect, 1).unwrap();
        assert_eq!(y.to_vec(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_conv1d_kernel_longer_than_input() {
        let x = Tensor::<f32>::zeros(&[1, 1, 2]);
        let w = Tensor::<f32>::zeros(&[1, 1, 3]);
        let err = conv1d(&x, &w, None, 1, 0, PaddingMode::Zeros, 1).unwrap_err();
        assert!(err.is_shape_error());
    }
}
