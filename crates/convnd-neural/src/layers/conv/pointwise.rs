//! Pointwise (channel mixing) convolution layer
//!
//! The rank-0 leaf of a decomposed convolution: input `[batch, in_channels]`,
//! output `[batch, out_channels]`, no spatial axes.

use super::check_groups;
use crate::layers::{replace_parameter, Layer, LayerType};
use convnd_core::{Result, Tensor};
use num_traits::Float;

#[derive(Debug, Clone)]
pub struct PointwiseConv<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    groups: usize,
    transposed: bool,
    training: bool,
}

impl<T> PointwiseConv<T>
where
    T: Float + Send + Sync + 'static,
{
    /// Weight layout `[out_channels, in_channels / groups]`
    pub fn new(in_channels: usize, out_channels: usize, use_bias: bool) -> Self {
        Self {
            weight: Tensor::zeros(&[out_channels, in_channels]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            groups: 1,
            transposed: false,
            training: false,
        }
    }

    /// Transposed variant, weight layout `[in_channels, out_channels / groups]`
    pub fn new_transposed(in_channels: usize, out_channels: usize, use_bias: bool) -> Self {
        Self {
            weight: Tensor::zeros(&[in_channels, out_channels]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            groups: 1,
            transposed: true,
            training: false,
        }
    }

    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        let dims = self.weight.shape().to_vec();
        let (in_channels, out_channels) = if self.transposed {
            (dims[0], dims[1] * self.groups)
        } else {
            (dims[1] * self.groups, dims[0])
        };
        check_groups("PointwiseConv", in_channels, out_channels, groups)?;
        self.weight = if self.transposed {
            Tensor::zeros(&[in_channels, out_channels / groups])
        } else {
            Tensor::zeros(&[out_channels, in_channels / groups])
        };
        self.groups = groups;
        Ok(self)
    }

    pub fn weight(&self) -> &Tensor<T> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }
}

impl<T> Layer<T> for PointwiseConv<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        if self.transposed {
            convnd_core::ops::conv_transpose_pointwise(
                input,
                &self.weight,
                self.bias.as_ref(),
                self.groups,
            )
        } else {
            convnd_core::ops::conv_pointwise(input, &self.weight, self.bias.as_ref(), self.groups)
        }
    }

    fn parameters(&self) -> Vec<&Tensor<T>> {
        let mut params = vec![&self.weight];
        if let Some(ref bias) = self.bias {
            params.push(bias);
        }
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>> {
        let mut params = vec![&mut self.weight];
        if let Some(ref mut bias) = self.bias {
            params.push(bias);
        }
        params
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn clone_box(&self) -> Box<dyn Layer<T>> {
        Box::new(self.clone())
    }

    fn layer_type(&self) -> LayerType {
        LayerType::PointwiseConv
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("PointwiseConv", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("PointwiseConv", slot, bias),
            (slot, bias) => {
                *slot = bias;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointwise_weight_layouts() {
        let forward = PointwiseConv::<f32>::new(6, 4, false).with_groups(2).unwrap();
        assert_eq!(forward.weight().shape().dims(), &[4, 3]);

        let transposed = PointwiseConv::<f32>::new_transposed(6, 4, false)
            .with_groups(2)
            .unwrap();
        assert_eq!(transposed.weight().shape().dims(), &[6, 2]);
        assert!(transposed.is_transposed());
    }

    #[test]
    fn test_pointwise_forward() {
        let mut layer = PointwiseConv::<f32>::new(2, 1, false);
        layer
            .set_weight(Tensor::from_vec(vec![2.0, -1.0], &[1, 2]).unwrap())
            .unwrap();
        let x = Tensor::from_vec(vec![3.0, 1.0, 0.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(layer.forward(&x).unwrap().to_vec(), vec![5.0, -4.0]);
    }
}
