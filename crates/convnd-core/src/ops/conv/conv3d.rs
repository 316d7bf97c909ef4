//! 3D convolution operations

use super::nd::conv_nd;
use crate::ops::padding::PaddingMode;
use crate::{Result, Tensor};
use num_traits::Float;

/// Performs 3D convolution operation
/// Input shape: [batch, in_channels, depth, height, width] (NCDHW format)
/// Weight shape: [out_channels, in_channels / groups, kernel_d, kernel_h, kernel_w]
/// Output shape: [batch, out_channels, out_d, out_h, out_w]
pub fn conv3d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize, usize),
    padding: (usize, usize, usize),
    padding_mode: PaddingMode,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_nd(
        input,
        weight,
        bias,
        &[stride.0, stride.1, stride.2],
        &[padding.0, padding.1, padding.2],
        padding_mode,
        groups,
    )
}
