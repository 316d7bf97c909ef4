//! Transpose convolution (deconvolution) operations
//!
//! Output length per spatial axis is `(in - 1) * stride - 2 * padding + kernel`.

use super::nd::conv_transpose_nd;
use crate::{Result, Tensor};
use num_traits::Float;

/// Performs 1D transposed convolution
/// Input shape: [batch, in_channels, length]
/// Weight shape: [in_channels, out_channels / groups, kernel_length]
pub fn conv_transpose1d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: usize,
    padding: usize,
    groups: usize,
) -> Result<Tensor<T>> {
    conv_transpose_nd(input, weight, bias, &[stride], &[padding], groups)
}

/// Performs 2D transposed convolution
/// Input shape: [batch, in_channels, height, width] (NCHW format)
/// Weight shape: [in_channels, out_channels / groups, kernel_height, kernel_width]
pub fn conv_transpose2d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize),
    padding: (usize, usize),
    groups: usize,
) -> Result<Tensor<T>> {
    conv_transpose_nd(
        input,
        weight,
        bias,
        &[stride.0, stride.1],
        &[padding.0, padding.1],
        groups,
    )
}

/// Performs 3D transposed convolution
/// Input shape: [batch, in_channels, depth, height, width]
/// Weight shape: [in_channels, out_channels / groups, kernel_d, kernel_h, kernel_w]
pub fn conv_transpose3d<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: (usize, usize, usize),
    padding: (usize, usize, usize),
    groups: usize,
) -> Result<Tensor<T>> {
    conv_transpose_nd(
        input,
        weight,
        bias,
        &[stride.0, stride.1, stride.2],
        &[padding.0, padding.1, padding.2],
        groups,
    )
}
