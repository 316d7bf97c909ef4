//! Tensor engine for the convnd layers
//!
//! Provides a dense N-d [`Tensor`] backed by `ndarray`, the padding, selection and
//! stacking primitives the recursive convolution layers are assembled from, and
//! direct pointwise/1D/2D/3D convolution kernels (plus their transposes).

#![allow(clippy::result_large_err)]

pub mod device;
pub mod error;
pub mod ops;
pub mod shape;
pub mod tensor;

pub use device::Device;
pub use error::{Result, TensorError};
pub use ops::PaddingMode;
pub use shape::Shape;
pub use tensor::{Tensor, TensorStorage};
