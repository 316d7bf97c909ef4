//! Tensor operations
//!
//! - **binary**: elementwise addition and per-channel bias broadcast
//! - **activation**: ReLU
//! - **manipulation**: axis selection, stacking and reshaping
//! - **padding**: zero and reflect padding along an axis
//! - **conv**: N-d convolution and transposed convolution kernels

pub mod activation;
pub mod binary;
pub mod conv;
pub mod manipulation;
pub mod padding;

pub use activation::relu;
pub use binary::{add, add_assign, add_channel_bias};
pub use conv::{
    conv1d, conv2d, conv3d, conv_nd, conv_pointwise, conv_transpose1d, conv_transpose2d,
    conv_transpose3d, conv_transpose_nd, conv_transpose_pointwise,
};
pub use manipulation::{reshape, select, stack};
pub use padding::{pad_axes, pad_axis, PaddingMode};
