//! Rank-generic direct convolution kernels
//!
//! Both kernels work on row-major flat slices. The number of spatial axes is taken
//! from the length of `stride`, so the same code serves the pointwise (0 spatial
//! axes), 1D, 2D and 3D entry points.

use crate::ops::padding::{pad_axes, PaddingMode};
use crate::{Result, Tensor, TensorError};
use num_traits::Float;

/// Row-major strides for `dims`
pub(crate) fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

/// Convert a flat row-major index into per-axis coordinates
pub(crate) fn unravel(mut flat: usize, dims: &[usize], coords: &mut [usize]) {
    for axis in (0..dims.len()).rev() {
        coords[axis] = flat % dims[axis];
        flat /= dims[axis];
    }
}

fn check_layout<T>(
    operation: &str,
    input: &Tensor<T>,
    weight: &Tensor<T>,
    stride: &[usize],
    padding: &[usize],
) -> Result<()> {
    let spatial = stride.len();
    if padding.len() != spatial {
        return Err(TensorError::invalid_argument_op(
            operation,
            &format!(
                "stride has {} entries but padding has {}",
                spatial,
                padding.len()
            ),
        ));
    }
    if stride.iter().any(|&s| s == 0) {
        return Err(TensorError::invalid_argument_op(
            operation,
            "stride must be positive",
        ));
    }
    if input.rank() != spatial + 2 {
        return Err(TensorError::invalid_shape(
            operation,
            format!(
                "expected {}D input [batch, channels, {} spatial], got {}D",
                spatial + 2,
                spatial,
                input.rank()
            ),
            input.shape().dims(),
        ));
    }
    if weight.rank() != spatial + 2 {
        return Err(TensorError::invalid_shape(
            operation,
            format!(
                "expected {}D weight, got {}D",
                spatial + 2,
                weight.rank()
            ),
            weight.shape().dims(),
        ));
    }
    if input.device() != weight.device() {
        return Err(TensorError::device_mismatch(
            operation,
            &input.device().to_string(),
            &weight.device().to_string(),
        ));
    }
    Ok(())
}

fn check_bias<T>(operation: &str, bias: Option<&Tensor<T>>, out_channels: usize) -> Result<()> {
    if let Some(bias) = bias {
        if bias.shape().dims() != [out_channels] {
            return Err(TensorError::shape_mismatch(
                operation,
                &format!("bias [{out_channels}]"),
                &bias.shape().to_string(),
            ));
        }
    }
    Ok(())
}

fn contiguous<'a, T>(operation: &str, tensor: &'a Tensor<T>) -> Result<&'a [T]> {
    tensor.as_slice().ok_or_else(|| {
        TensorError::invalid_argument_op(operation, "tensor storage is not contiguous")
    })
}

/// Convolution over `stride.len()` spatial axes
///
/// Input layout `[batch, in_channels, s_0, ..]`, weight layout
/// `[out_channels, in_channels / groups, k_0, ..]`. Every spatial axis is padded by
/// `padding[axis]` on both ends using `padding_mode` before the valid convolution.
/// Output length per axis is `(in + 2 * pad - k) / stride + 1`.
pub fn conv_nd<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: &[usize],
    padding: &[usize],
    padding_mode: PaddingMode,
    groups: usize,
) -> Result<Tensor<T>> {
    let operation = "conv_nd";
    check_layout(operation, input, weight, stride, padding)?;

    let in_dims = input.shape().dims();
    let w_dims = weight.shape().dims();
    let (batch, in_channels) = (in_dims[0], in_dims[1]);
    let (out_channels, in_per_group) = (w_dims[0], w_dims[1]);

    if groups == 0 || out_channels % groups != 0 {
        return Err(TensorError::invalid_argument_op(
            operation,
            &format!("out_channels ({out_channels}) must be divisible by groups ({groups})"),
        ));
    }
    if in_channels != in_per_group * groups {
        return Err(TensorError::shape_mismatch(
            operation,
            &format!("{} input channels ({in_per_group} per group x {groups} groups)", in_per_group * groups),
            &format!("{in_channels} input channels"),
        ));
    }
    check_bias(operation, bias, out_channels)?;

    let padded = pad_axes(input, 2, padding, padding_mode)?;
    let in_spatial = padded.shape().dims()[2..].to_vec();
    let k_spatial = &w_dims[2..];

    let mut out_spatial = Vec::with_capacity(stride.len());
    for axis in 0..stride.len() {
        if in_spatial[axis] < k_spatial[axis] {
            return Err(TensorError::invalid_shape(
                operation,
                format!(
                    "padded input length {} on spatial axis {axis} is smaller than kernel length {}",
                    in_spatial[axis], k_spatial[axis]
                ),
                in_dims,
            ));
        }
        out_spatial.push((in_spatial[axis] - k_spatial[axis]) / stride[axis] + 1);
    }

    let in_strides = row_major_strides(&in_spatial);
    let in_size: usize = in_spatial.iter().product();
    let k_size: usize = k_spatial.iter().product();
    let out_size: usize = out_spatial.iter().product();
    let out_per_group = out_channels / groups;

    // Offset of each kernel tap relative to the top-left input element of a window
    let mut coords = vec![0; stride.len()];
    let tap_offsets: Vec<usize> = (0..k_size)
        .map(|tap| {
            unravel(tap, k_spatial, &mut coords);
            coords
                .iter()
                .zip(&in_strides)
                .map(|(c, s)| c * s)
                .sum()
        })
        .collect();
    let window_origins: Vec<usize> = (0..out_size)
        .map(|pos| {
            unravel(pos, &out_spatial, &mut coords);
            coords
                .iter()
                .zip(stride)
                .zip(&in_strides)
                .map(|((c, st), s)| c * st * s)
                .sum()
        })
        .collect();

    let x = contiguous(operation, &padded)?;
    let w = contiguous(operation, weight)?;
    let bias_data = match bias {
        Some(b) => Some(contiguous(operation, b)?),
        None => None,
    };

    let mut out = vec![T::zero(); batch * out_channels * out_size];
    for b in 0..batch {
        for oc in 0..out_channels {
            let group = oc / out_per_group;
            let bias_value = bias_data.map_or(T::zero(), |data| data[oc]);
            let out_base = (b * out_channels + oc) * out_size;
            for (pos, origin) in window_origins.iter().enumerate() {
                let mut sum = T::zero();
                for icg in 0..in_per_group {
                    let ic = group * in_per_group + icg;
                    let x_base = (b * in_channels + ic) * in_size + origin;
                    let w_base = (oc * in_per_group + icg) * k_size;
                    for (tap, offset) in tap_offsets.iter().enumerate() {
                        sum = sum + x[x_base + offset] * w[w_base + tap];
                    }
                }
                out[out_base + pos] = sum + bias_value;
            }
        }
    }

    let mut out_dims = vec![batch, out_channels];
    out_dims.extend_from_slice(&out_spatial);
    tracing::trace!(input = ?in_dims, output = ?out_dims, groups, "conv_nd");
    let array = ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&out_dims), out)?;
    Ok(Tensor::from_array_on(array, *input.device()))
}

/// Transposed convolution over `stride.len()` spatial axes
///
/// Input layout `[batch, in_channels, s_0, ..]`, weight layout
/// `[in_channels, out_channels / groups, k_0, ..]`. Input position `p` with kernel
/// tap `t` lands on output position `p * stride + t - padding`; positions falling
/// outside the output are dropped. Output length per axis is
/// `(in - 1) * stride - 2 * pad + k`.
pub fn conv_transpose_nd<T: Float>(
    input: &Tensor<T>,
    weight: &Tensor<T>,
    bias: Option<&Tensor<T>>,
    stride: &[usize],
    padding: &[usize],
    groups: usize,
) -> Result<Tensor<T>> {
    let operation = "conv_transpose_nd";
    check_layout(operation, input, weight, stride, padding)?;

    let in_dims = input.shape().dims();
    let w_dims = weight.shape().dims();
    let (batch, in_channels) = (in_dims[0], in_dims[1]);
    let (weight_in_channels, out_per_group) = (w_dims[0], w_dims[1]);

    if in_channels != weight_in_channels {
        return Err(TensorError::shape_mismatch(
            operation,
            &format!("{weight_in_channels} input channels"),
            &format!("{in_channels} input channels"),
        ));
    }
    if groups == 0 || in_channels % groups != 0 {
        return Err(TensorError::invalid_argument_op(
            operation,
            &format!("in_channels ({in_channels}) must be divisible by groups ({groups})"),
        ));
    }
    let out_channels = out_per_group * groups;
    check_bias(operation, bias, out_channels)?;

    let in_spatial = &in_dims[2..];
    let k_spatial = &w_dims[2..];
    let spatial = stride.len();

    let mut out_spatial = Vec::with_capacity(spatial);
    for axis in 0..spatial {
        let full = in_spatial[axis].saturating_sub(1) * stride[axis] + k_spatial[axis];
        if in_spatial[axis] == 0 || full <= 2 * padding[axis] {
            return Err(TensorError::invalid_shape(
                operation,
                format!(
                    "output length on spatial axis {axis} would be empty (input {}, kernel {}, stride {}, padding {})",
                    in_spatial[axis], k_spatial[axis], stride[axis], padding[axis]
                ),
                in_dims,
            ));
        }
        out_spatial.push(full - 2 * padding[axis]);
    }

    let in_size: usize = in_spatial.iter().product();
    let k_size: usize = k_spatial.iter().product();
    let out_size: usize = out_spatial.iter().product();
    let out_strides = row_major_strides(&out_spatial);
    let in_per_group = in_channels / groups;

    // For every (input position, kernel tap) pair, the flat output offset it hits
    let mut in_coords = vec![0; spatial];
    let mut k_coords = vec![0; spatial];
    let mut scatter: Vec<Vec<Option<usize>>> = Vec::with_capacity(in_size);
    for pos in 0..in_size {
        unravel(pos, in_spatial, &mut in_coords);
        let targets = (0..k_size)
            .map(|tap| {
                unravel(tap, k_spatial, &mut k_coords);
                let mut flat = 0;
                for axis in 0..spatial {
                    let raw = in_coords[axis] * stride[axis] + k_coords[axis];
                    if raw < padding[axis] || raw - padding[axis] >= out_spatial[axis] {
                        return None;
                    }
                    flat += (raw - padding[axis]) * out_strides[axis];
                }
                Some(flat)
            })
            .collect();
        scatter.push(targets);
    }

    let x = contiguous(operation, input)?;
    let w = contiguous(operation, weight)?;

    let mut out = vec![T::zero(); batch * out_channels * out_size];
    for b in 0..batch {
        for ic in 0..in_channels {
            let group = ic / in_per_group;
            let x_base = (b * in_channels + ic) * in_size;
            for ocg in 0..out_per_group {
                let oc = group * out_per_group + ocg;
                let out_base = (b * out_channels + oc) * out_size;
                let w_base = (ic * out_per_group + ocg) * k_size;
                for (pos, targets) in scatter.iter().enumerate() {
                    let value = x[x_base + pos];
                    for (tap, target) in targets.iter().enumerate() {
                        if let Some(offset) = target {
                            let idx = out_base + offset;
                            out[idx] = out[idx] + value * w[w_base + tap];
                        }
                    }
                }
            }
        }
    }

    if let Some(bias) = bias {
        let bias_data = contiguous(operation, bias)?;
        for (chunk_index, chunk) in out.chunks_mut(out_size.max(1)).enumerate() {
            let value = bias_data[chunk_index % out_channels];
            for v in chunk.iter_mut() {
                *v = *v + value;
            }
        }
    }

    let mut out_dims = vec![batch, out_channels];
    out_dims.extend_from_slice(&out_spatial);
    tracing::trace!(input = ?in_dims, output = ?out_dims, groups, "conv_transpose_nd");
    let array = ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&out_dims), out)?;
    Ok(Tensor::from_array_on(array, *input.device()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_and_unravel() {
        let dims = [2, 3, 4];
        assert_eq!(row_major_strides(&dims), vec![12, 4, 1]);
        let mut coords = [0; 3];
        unravel(17, &dims, &mut coords);
        assert_eq!(coords, [1, 1, 1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_pointwise_is_channel_mixing() {
        // [batch=1, in=2] -> [batch=1, out=3] with weight [3, 2]
        let x = Tensor::<f32>::from_vec(vec![1.0, 2.0], &[1, 2]).unwrap();
        let w = Tensor::<f32>::from_vec(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2]).unwrap();
        let y = conv_nd(&x, &w, None, &[], &[], PaddingMode::Zeros, 1).unwrap();
        assert_eq!(y.shape().dims(), &[1, 3]);
        assert_eq!(y.to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_grouped_conv() {
        // Two groups, each a 1x1 identity on its own channel pair member
        let x = Tensor::<f32>::from_vec(vec![1.0, 2.0, 10.0, 20.0], &[1, 2, 2]).unwrap();
        let w = Tensor::<f32>::from_vec(vec![2.0, 3.0], &[2, 1, 1]).unwrap();
        let y = conv_nd(&x, &w, None, &[1], &[0], PaddingMode::Zeros, 2).unwrap();
        assert_eq!(y.to_vec(), vec![2.0, 4.0, 30.0, 60.0]);
    }

    #[test]
    fn test_transpose_scatter() {
        // 1D, stride 2, kernel 3: each input spreads [1, 1, 1] starting at 2 * p
        let x = Tensor::<f32>::from_vec(vec![1.0, 10.0], &[1, 1, 2]).unwrap();
        let w = Tensor::<f32>::ones(&[1, 1, 3]);
        let y = conv_transpose_nd(&x, &w, None, &[2], &[0], 1).unwrap();
        assert_eq!(y.shape().dims(), &[1, 1, 5]);
        assert_eq!(y.to_vec(), vec![1.0, 1.0, 11.0, 10.0, 10.0]);

        let cropped = conv_transpose_nd(&x, &w, None, &[2], &[1], 1).unwrap();
        assert_eq!(cropped.to_vec(), vec![1.0, 11.0, 10.0]);
    }

    #[test]
    fn test_transpose_bias() {
        let x = Tensor::<f32>::zeros(&[2, 1, 2]);
        let w = Tensor::<f32>::ones(&[1, 2, 2]);
        let bias = Tensor::<f32>::from_vec(vec![0.5, -1.0], &[2]).unwrap();
        let y = conv_transpose_nd(&x, &w, Some(&bias), &[1], &[0], 1).unwrap();
        assert_eq!(y.shape().dims(), &[2, 2, 3]);
        assert_eq!(
            y.to_vec(),
            vec![0.5, 0.5, 0.5, -1.0, -1.0, -1.0, 0.5, 0.5, 0.5, -1.0, -1.0, -1.0]
        );
    }

    #[test]
    fn test_channel_mismatch_is_shape_error() {
        let x = Tensor::<f32>::zeros(&[1, 3, 5]);
        let w = Tensor::<f32>::zeros(&[2, 2, 3]);
        let err = conv_nd(&x, &w, None, &[1], &[0], PaddingMode::Zeros, 1).unwrap_err();
        assert!(err.is_shape_error());
    }
}
