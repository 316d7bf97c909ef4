//! 1D Convolution Layer Implementation

use super::check_groups;
use crate::layers::{replace_parameter, Layer, LayerType};
use convnd_core::{PaddingMode, Result, Tensor};
use num_traits::Float;

/// 1D Convolutional layer for sequence data
///
/// Input layout `[batch, in_channels, length]`, weight layout
/// `[out_channels, in_channels / groups, kernel_size]`.
#[derive(Debug, Clone)]
pub struct Conv1D<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    stride: usize,
    padding: usize,
    padding_mode: PaddingMode,
    groups: usize,
    training: bool,
}

impl<T> Conv1D<T>
where
    T: Float + Send + Sync + 'static,
{
    /// Creates a new Conv1D layer with zero padding and a single group
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        use_bias: bool,
    ) -> Self {
        Self {
            weight: Tensor::zeros(&[out_channels, in_channels, kernel_size]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            stride,
            padding,
            padding_mode: PaddingMode::Zeros,
            groups: 1,
            training: false,
        }
    }

    pub fn with_padding_mode(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }

    /// Split the channels into `groups` independent convolutions
    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        let dims = self.weight.shape().to_vec();
        let (out_channels, in_channels) = (dims[0], dims[1] * self.groups);
        check_groups("Conv1D", in_channels, out_channels, groups)?;
        self.weight = Tensor::zeros(&[out_channels, in_channels / groups, dims[2]]);
        self.groups = groups;
        Ok(self)
    }

    pub fn weight(&self) -> &Tensor<T> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn padding_mode(&self) -> PaddingMode {
        self.padding_mode
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl<T> Layer<T> for Conv1D<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        convnd_core::ops::conv1d(
            input,
            &self.weight,
            self.bias.as_ref(),
            self.stride,
            self.padding,
            self.padding_mode,
            self.groups,
        )
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
        LayerType::Conv1D
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("Conv1D", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("Conv1D", slot, bias),
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
    fn test_conv1d_layer_forward() {
        let mut layer = Conv1D::<f32>::new(1, 2, 3, 1, 1, true);
        layer.set_weight(Tensor::ones(&[2, 1, 3])).unwrap();
        layer
            .set_bias(Some(Tensor::from_vec(vec![0.0, 10.0], &[2]).unwrap()))
            .unwrap();
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[1, 1, 3]).unwrap();
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.shape().dims(), &[1, 2, 3]);
        assert_eq!(y.to_vec(), vec![3.0, 6.0, 5.0, 13.0, 16.0, 15.0]);
    }

    #[test]
    fn test_conv1d_groups_reshape_weight() {
        let layer = Conv1D::<f32>::new(4, 6, 3, 1, 0, false)
            .with_groups(2)
            .unwrap();
        assert_eq!(layer.weight().shape().dims(), &[6, 2, 3]);
        assert!(Conv1D::<f32>::new(4, 6, 3, 1, 0, false)
            .with_groups(4)
            .unwrap_err()
            .is_configuration_error());
    }

    #[test]
    fn test_set_weight_rejects_wrong_shape() {
        let mut layer = Conv1D::<f32>::new(1, 1, 3, 1, 0, false);
        assert!(layer.set_weight(Tensor::ones(&[1, 1, 2])).is_err());
    }
}
