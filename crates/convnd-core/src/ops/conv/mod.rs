//! Convolution operations
//!
//! All entry points share the rank-generic kernels in [`nd`]:
//! - pointwise (channel mixing, no spatial axes)
//! - 1D, 2D and 3D convolutions with zero or reflect padding and groups
//! - the matching transposed convolutions

pub mod conv1d;
pub mod conv2d;
pub mod conv3d;
pub mod nd;
pub mod pointwise;
pub mod transpose;

pub use conv1d::conv1d;
pub use conv2d::conv2d;
pub use conv3d::conv3d;
pub use nd::{conv_nd, conv_transpose_nd};
pub use pointwise::{conv_pointwise, conv_transpose_pointwise};
pub use transpose::{conv_transpose1d, conv_transpose2d, conv_transpose3d};
