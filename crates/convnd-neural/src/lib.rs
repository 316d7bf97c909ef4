//! N-dimensional convolution layers
//!
//! [`ConvNd`] and [`ConvTransposeNd`] accept any number of spatial axes. They are
//! built as trees of lower-rank operators, one child per tap of the leading kernel
//! axis, bottoming out in the base 1D/2D/3D layers backed by `convnd-core`
//! kernels. [`DenseBlock`] is a residual block assembled from 2D [`ConvNd`]s.
//!
//! ```no_run
//! use convnd_core::Tensor;
//! use convnd_neural::{ConvNd, ConvNdConfig, Layer};
//!
//! let conv = ConvNd::<f32>::new(ConvNdConfig::uniform(1, 4, 4, 3, 1, 1))?;
//! let y = conv.forward(&Tensor::ones(&[2, 1, 5, 5, 5, 5]))?;
//! assert_eq!(y.shape().dims(), &[2, 4, 5, 5, 5, 5]);
//! # Ok::<(), convnd_core::TensorError>(())
//! ```

#![allow(clippy::result_large_err)]

pub mod initializers;
pub mod layers;

pub use initializers::Initializers;
pub use layers::{
    Conv1D, Conv2D, Conv3D, ConvNd, ConvNdConfig, ConvTranspose1D, ConvTranspose2D,
    ConvTranspose3D, ConvTransposeNd, DenseBlock, FrameAccumulator, FrameConv, Layer, LayerType,
    PointwiseConv, ReLU,
};
