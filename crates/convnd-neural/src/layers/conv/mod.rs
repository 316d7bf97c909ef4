//! Convolution layers
//!
//! Base layers (`PointwiseConv`, `Conv1D`..`Conv3D` and the transposed variants) run
//! a single kernel call. `ConvNd` and `ConvTransposeNd` handle any number of spatial
//! axes by splitting off the leading axis recursively until at most three remain,
//! then delegating to base layers.

pub mod config;
pub mod conv1d;
pub mod conv2d;
pub mod conv3d;
pub mod convnd;
pub mod frames;
pub mod pointwise;
pub mod transpose;
pub mod transpose_nd;

pub use config::ConvNdConfig;
pub use conv1d::Conv1D;
pub use conv2d::Conv2D;
pub use conv3d::Conv3D;
pub use convnd::ConvNd;
pub use frames::{FrameAccumulator, FrameConv};
pub use pointwise::PointwiseConv;
pub use transpose::{ConvTranspose1D, ConvTranspose2D, ConvTranspose3D};
pub use transpose_nd::ConvTransposeNd;

use crate::layers::Layer;
use convnd_core::{Result, TensorError};
use num_traits::Float;

pub(crate) fn check_groups(
    component: &str,
    in_channels: usize,
    out_channels: usize,
    groups: usize,
) -> Result<()> {
    if groups == 0 || in_channels % groups != 0 || out_channels % groups != 0 {
        return Err(TensorError::invalid_configuration(
            component,
            format!(
                "groups ({groups}) must divide in_channels ({in_channels}) and out_channels ({out_channels})"
            ),
        ));
    }
    Ok(())
}

/// Base convolution covering all axes of `config` in one call
pub(crate) fn base_conv<T>(config: &ConvNdConfig) -> Result<Box<dyn Layer<T>>>
where
    T: Float + Send + Sync + 'static,
{
    let (cin, cout, k, s, p) = (
        config.in_channels,
        config.out_channels,
        &config.kernel_size,
        &config.stride,
        &config.padding,
    );
    let layer: Box<dyn Layer<T>> = match config.num_dims {
        0 => Box::new(PointwiseConv::new(cin, cout, config.use_bias).with_groups(config.groups)?),
        1 => Box::new(
            Conv1D::new(cin, cout, k[0], s[0], p[0], config.use_bias)
                .with_padding_mode(config.padding_mode)
                .with_groups(config.groups)?,
        ),
        2 => Box::new(
            Conv2D::new(cin, cout, (k[0], k[1]), (s[0], s[1]), (p[0], p[1]), config.use_bias)
                .with_padding_mode(config.padding_mode)
                .with_groups(config.groups)?,
        ),
        3 => Box::new(
            Conv3D::new(
                cin,
                cout,
                (k[0], k[1], k[2]),
                (s[0], s[1], s[2]),
                (p[0], p[1], p[2]),
                config.use_bias,
            )
            .with_padding_mode(config.padding_mode)
            .with_groups(config.groups)?,
        ),
        n => {
            return Err(TensorError::invalid_configuration(
                "ConvNd",
                format!("no base convolution for {n} spatial dimensions"),
            ))
        }
    };
    Ok(layer)
}

/// Base transposed convolution covering all axes of `config` in one call
pub(crate) fn base_conv_transpose<T>(config: &ConvNdConfig) -> Result<Box<dyn Layer<T>>>
where
    T: Float + Send + Sync + 'static,
{
    let (cin, cout, k, s, p) = (
        config.in_channels,
        config.out_channels,
        &config.kernel_size,
        &config.stride,
        &config.padding,
    );
    let layer: Box<dyn Layer<T>> = match config.num_dims {
        0 => Box::new(
            PointwiseConv::new_transposed(cin, cout, config.use_bias).with_groups(config.groups)?,
        ),
        1 => Box::new(
            ConvTranspose1D::new(cin, cout, k[0], s[0], p[0], config.use_bias)
                .with_groups(config.groups)?,
        ),
        2 => Box::new(
            ConvTranspose2D::new(
                cin,
                cout,
                (k[0], k[1]),
                (s[0], s[1]),
                (p[0], p[1]),
                config.use_bias,
            )
            .with_groups(config.groups)?,
        ),
        3 => Box::new(
            ConvTranspose3D::new(
                cin,
                cout,
                (k[0], k[1], k[2]),
                (s[0], s[1], s[2]),
                (p[0], p[1], p[2]),
                config.use_bias,
            )
            .with_groups(config.groups)?,
        ),
        n => {
            return Err(TensorError::invalid_configuration(
                "ConvTransposeNd",
                format!("no base transposed convolution for {n} spatial dimensions"),
            ))
        }
    };
    Ok(layer)
}
