//! 2D convolution operations

use super::nd::conv_nd;
use crate::ops::padding::PaddingMode;
use crate::{Result, Tensor};
use num_traits::Float;

/// Performs 2D convolution operation
/// Input shape: [batch, in_channels, height, width] (NCHW format)
/// Weight shape: [out_channels, in_channels / groups, kernel_height, kernel_width]
/// Output shape: [batch, out_channels, out_height, out_width]
pub fn conv2d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize),
    padding: (usize, usize),
    padding_mode: PaddingMode,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_nd(
        input,
        weight,
        bias,
        &[stride.0, stride.1],
        &[padding.0, padding.1],
        padding_mode,
        groups,
    )
}
