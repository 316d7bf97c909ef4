//! Tensor method forms of the operations in [`crate::ops`]

use super::core::Tensor;
use crate::ops::{self, PaddingMode};
use crate::Result;
use num_traits::Float;

impl<T: Float> Tensor<T> {
    /// Elementwise addition (shapes must broadcast to `self`)
    pub fn add(&self, other: &Self) -> Result<Self> {
        ops::add(self, other)
    }

    /// In-place elementwise addition of a same-shaped tensor
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        ops::add_assign(self, other)
    }

    /// Rectified linear unit
    pub fn relu(&self) -> Self {
        ops::relu(self)
    }

    /// Select index `index` along `axis`, removing that axis
    pub fn select(&self, axis: usize, index: usize) -> Result<Self> {
        ops::select(self, axis, index)
    }

    /// Pad one axis on both ends
    pub fn pad_axis(
        &self,
        axis: usize,
        before: usize,
        after: usize,
        mode: PaddingMode,
    ) -> Result<Self> {
        ops::pad_axis(self, axis, before, after, mode)
    }

    /// Reshape into `shape` (element count must match)
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        ops::reshape(self, shape)
    }

    /// Multiply every element by `scalar`
    pub fn scalar_mul(&self, scalar: T) -> Self {
        Self::from_array_on(self.array().mapv(|x| x * scalar), *self.device())
    }
}
