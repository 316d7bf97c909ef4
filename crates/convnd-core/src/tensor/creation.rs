//! Tensor Creation and Construction

use super::core::{Tensor, TensorStorage};
use crate::{Device, Result, Shape, TensorError};
use ndarray::{ArrayD, IxDyn};
use num_traits::{One, Zero};

impl<T: Clone> Tensor<T> {
    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self
    where
        T: Zero,
    {
        Self::zeros_on(shape, Device::Cpu)
    }

    /// Create a zero-filled tensor on a specific device
    pub fn zeros_on(shape: &[usize], device: Device) -> Self
    where
        T: Zero,
    {
        Self::from_array_on(ArrayD::zeros(IxDyn(shape)), device)
    }

    /// Create a tensor filled with ones
    pub fn ones(shape: &[usize]) -> Self
    where
        T: One,
    {
        Self::from_array(ArrayD::ones(IxDyn(shape)))
    }

    /// Create a tensor filled with a specific value
    pub fn full(shape: &[usize], value: T) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Create a scalar tensor from a single value
    pub fn from_scalar(value: T) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Create a tensor from a vector of data with specified shape
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_size: usize = shape.iter().product();
        if data.len() != total_size {
            return Err(TensorError::invalid_shape_simple(format!(
                "Data length {} doesn't match shape {:?} (size {})",
                data.len(),
                shape,
                total_size
            )));
        }

        let array = ArrayD::from_shape_vec(IxDyn(shape), data)?;
        Ok(Self::from_array(array))
    }

    /// Create a tensor from an existing ndarray
    pub fn from_array(array: ArrayD<T>) -> Self {
        Self::from_array_on(array, Device::Cpu)
    }

    /// Create a tensor from an existing ndarray, placed on `device`
    pub fn from_array_on(array: ArrayD<T>, device: Device) -> Self {
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let shape = Shape::from_slice(array.shape());
        Self {
            storage: TensorStorage::Cpu(array),
            shape,
            device,
        }
    }

    /// Create a zero-filled tensor with the shape and device of `self`
    pub fn zeros_like(&self) -> Self
    where
        T: Zero,
    {
        Self::zeros_on(self.shape.dims(), self.device)
    }
}
