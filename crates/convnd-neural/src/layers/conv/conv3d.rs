//! 3D Convolution Layer Implementation

use super::check_groups;
use crate::layers::{replace_parameter, Layer, LayerType};
use convnd_core::{PaddingMode, Result, Tensor};
use num_traits::Float;

/// 3D Convolutional layer for volumetric data
///
/// Input layout `[batch, in_channels, depth, height, width]`, weight layout
/// `[out_channels, in_channels / groups, kernel_d, kernel_h, kernel_w]`.
#[derive(Debug, Clone)]
pub struct Conv3D<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    stride: (usize, usize, usize),
    padding: (usize, usize, usize),
    padding_mode: PaddingMode,
    groups: usize,
    training: bool,
}

impl<T> Conv3D<T>
where
    T: Float + Send + Sync + 'static,
{
    /// Creates a new Conv3D layer with zero padding and a single group
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize, usize),
        stride: (usize, usize, usize),
        padding: (usize, usize, usize),
        use_bias: bool,
    ) -> Self {
        Self {
            weight: Tensor::zeros(&[
                out_channels,
                in_channels,
                kernel_size.0,
                kernel_size.1,
                kernel_size.2,
            ]),
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
        check_groups("Conv3D", in_channels, out_channels, groups)?;
        self.weight = Tensor::zeros(&[
            out_channels,
            in_channels / groups,
            dims[2],
            dims[3],
            dims[4],
        ]);
        self.groups = groups;
        Ok(self)
    }

    pub fn weight(&self) -> &Tensor<T> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn stride(&self) -> (usize, usize, usize) {
        self.stride
    }

    pub fn padding(&self) -> (usize, usize, usize) {
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

impl<T> Layer<T> for Conv3D<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        convnd_core::ops::conv3d(
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
        LayerType::Conv3D
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("Conv3D", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("Conv3D", slot, bias),
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
    fn test_conv3d_layer_reflect() {
        let mut layer =
            Conv3D::<f64>::new(1, 1, (3, 3, 3), (1, 1, 1), (1, 1, 1), false)
                .with_padding_mode(PaddingMode::Reflect);
        layer.set_weight(Tensor::ones(&[1, 1, 3, 3, 3])).unwrap();
        // A constant volume stays constant under reflection, so every output sees 27 ones
        let y = layer.forward(&Tensor::ones(&[1, 1, 3, 4, 5])).unwrap();
        assert_eq!(y.shape().dims(), &[1, 1, 3, 4, 5]);
        assert!(y.to_vec().iter().all(|&v| v == 27.0));
    }
}
