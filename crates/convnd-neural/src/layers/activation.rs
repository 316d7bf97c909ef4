//! Activation layers

use crate::layers::{Layer, LayerType};
use convnd_core::{Result, Tensor};
use num_traits::Float;

/// Rectified linear unit, `max(x, 0)` elementwise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReLU;

impl<T> Layer<T> for ReLU
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        Ok(convnd_core::ops::relu(input))
    }

    fn parameters(&self) -> Vec<&Tensor<T>> {
        vec![]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>> {
        vec![]
    }

    fn set_training(&mut self, _training: bool) {}

    fn clone_box(&self) -> Box<dyn Layer<T>> {
        Box::new(*self)
    }

    fn layer_type(&self) -> LayerType {
        LayerType::Activation
    }
}
