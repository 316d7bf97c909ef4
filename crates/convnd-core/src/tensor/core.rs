//! Core Tensor Structure and Properties
//!
//! The tensor owns its storage, its shape and the device the storage lives on.
//! Storage is an `ndarray::ArrayD` kept in standard (row-major) layout so kernels can
//! work on flat slices.

use crate::{Device, Shape};
use ndarray::ArrayD;

/// Core tensor structure that holds data and metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub storage: TensorStorage<T>,
    pub(in crate::tensor) shape: Shape,
    pub(in crate::tensor) device: Device,
}

/// Storage abstraction for different device types
#[derive(Debug, Clone, PartialEq)]
pub enum TensorStorage<T> {
    Cpu(ArrayD<T>),
}

impl<T> Tensor<T> {
    /// Get the shape of the tensor
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the device where the tensor is located
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Borrow the underlying array
    pub fn array(&self) -> &ArrayD<T> {
        let TensorStorage::Cpu(array) = &self.storage;
        array
    }

    /// Mutably borrow the underlying array
    ///
    /// The shape of the array must not be changed through this borrow.
    pub fn array_mut(&mut self) -> &mut ArrayD<T> {
        let TensorStorage::Cpu(array) = &mut self.storage;
        array
    }

    /// Consume the tensor and return its array
    pub fn into_array(self) -> ArrayD<T> {
        let TensorStorage::Cpu(array) = self.storage;
        array
    }

    /// Get the value at a specific index
    pub fn get(&self, index: &[usize]) -> Option<T>
    where
        T: Clone,
    {
        let array = self.array();
        if index.len() != array.ndim() {
            return None;
        }
        array.get(index).cloned()
    }

    /// Get the underlying data as a contiguous slice
    pub fn as_slice(&self) -> Option<&[T]> {
        self.array().as_slice()
    }

    /// Get the underlying data as a mutable contiguous slice
    pub fn as_slice_mut(&mut self) -> Option<&mut [T]> {
        self.array_mut().as_slice_mut()
    }

    /// Copy the elements out in row-major order
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.array().iter().cloned().collect()
    }

    /// Check if tensor is empty (has no elements)
    pub fn is_empty(&self) -> bool {
        self.shape.size() == 0
    }

    /// Check if two tensors have the same shape
    pub fn same_shape(&self, other: &Self) -> bool {
        self.shape == other.shape
    }

    /// Get the total number of elements
    pub fn numel(&self) -> usize {
        self.shape.size()
    }

    /// Get the number of dimensions (rank)
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Get the number of dimensions (alias for rank)
    pub fn ndim(&self) -> usize {
        self.shape.rank()
    }

    /// Check if tensor is a scalar (0-dimensional)
    pub fn is_scalar(&self) -> bool {
        self.shape.rank() == 0
    }

    /// Get tensor summary as a formatted string
    pub fn summary(&self) -> String {
        format!(
            "Tensor<{}>: shape={}, device={}, numel={}",
            std::any::type_name::<T>(),
            self.shape,
            self.device,
            self.numel(),
        )
    }
}
