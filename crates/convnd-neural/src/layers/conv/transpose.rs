//! Transposed convolution layers
//!
//! Transposed convolutions scatter every input position through the kernel, so the
//! output grows with the stride: `(in - 1) * stride - 2 * padding + kernel` per axis.
//! Weight layout is `[in_channels, out_channels / groups, k..]`. Padding crops the
//! output and is always zero-filled.

use super::check_groups;
use crate::layers::{replace_parameter, Layer, LayerType};
use convnd_core::{Result, Tensor};
use num_traits::Float;

/// 1D transposed convolution (deconvolution)
///
/// Input layout `[batch, in_channels, length]`.
#[derive(Debug, Clone)]
pub struct ConvTranspose1D<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    stride: usize,
    padding: usize,
    groups: usize,
    training: bool,
}

impl<T> ConvTranspose1D<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        use_bias: bool,
    ) -> Self {
        Self {
            weight: Tensor::zeros(&[in_channels, out_channels, kernel_size]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            stride,
            padding,
            groups: 1,
            training: false,
        }
    }

    /// Split the channels into `groups` independent convolutions
    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        let dims = self.weight.shape().to_vec();
        let (in_channels, out_channels) = (dims[0], dims[1] * self.groups);
        check_groups("ConvTranspose1D", in_channels, out_channels, groups)?;
        self.weight = Tensor::zeros(&[in_channels, out_channels / groups, dims[2]]);
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

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl<T> Layer<T> for ConvTranspose1D<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        convnd_core::ops::conv_transpose1d(
            input,
            &self.weight,
            self.bias.as_ref(),
            self.stride,
            self.padding,
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
        LayerType::ConvTranspose1D
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("ConvTranspose1D", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("ConvTranspose1D", slot, bias),
            (slot, bias) => {
                *slot = bias;
                Ok(())
            }
        }
    }
}

/// 2D transposed convolution (deconvolution)
///
/// Input layout `[batch, in_channels, height, width]`.
#[derive(Debug, Clone)]
pub struct ConvTranspose2D<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    stride: (usize, usize),
    padding: (usize, usize),
    groups: usize,
    training: bool,
}

impl<T> ConvTranspose2D<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        use_bias: bool,
    ) -> Self {
        Self {
            weight: Tensor::zeros(&[in_channels, out_channels, kernel_size.0, kernel_size.1]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            stride,
            padding,
            groups: 1,
            training: false,
        }
    }

    /// Split the channels into `groups` independent convolutions
    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        let dims = self.weight.shape().to_vec();
        let (in_channels, out_channels) = (dims[0], dims[1] * self.groups);
        check_groups("ConvTranspose2D", in_channels, out_channels, groups)?;
        self.weight = Tensor::zeros(&[in_channels, out_channels / groups, dims[2], dims[3]]);
        self.groups = groups;
        Ok(self)
    }

    pub fn weight(&self) -> &Tensor<T> {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn stride(&self) -> (usize, usize) {
        self.stride
    }

    pub fn padding(&self) -> (usize, usize) {
        self.padding
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl<T> Layer<T> for ConvTranspose2D<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        convnd_core::ops::conv_transpose2d(
            input,
            &self.weight,
            self.bias.as_ref(),
            self.stride,
            self.padding,
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
        LayerType::ConvTranspose2D
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("ConvTranspose2D", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("ConvTranspose2D", slot, bias),
            (slot, bias) => {
                *slot = bias;
                Ok(())
            }
        }
    }
}

/// 3D transposed convolution (deconvolution)
///
/// Input layout `[batch, in_channels, depth, height, width]`.
#[derive(Debug, Clone)]
pub struct ConvTranspose3D<T> {
    weight: Tensor<T>,
    bias: Option<Tensor<T>>,
    stride: (usize, usize, usize),
    padding: (usize, usize, usize),
    groups: usize,
    training: bool,
}

impl<T> ConvTranspose3D<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize, usize),
        stride: (usize, usize, usize),
        padding: (usize, usize, usize),
        use_bias: bool,
    ) -> Self {
        Self {
            weight: Tensor::zeros(&[in_channels, out_channels, kernel_size.0, kernel_size.1, kernel_size.2]),
            bias: use_bias.then(|| Tensor::zeros(&[out_channels])),
            stride,
            padding,
            groups: 1,
            training: false,
        }
    }

    /// Split the channels into `groups` independent convolutions
    pub fn with_groups(mut self, groups: usize) -> Result<Self> {
        let dims = self.weight.shape().to_vec();
        let (in_channels, out_channels) = (dims[0], dims[1] * self.groups);
        check_groups("ConvTranspose3D", in_channels, out_channels, groups)?;
        self.weight = Tensor::zeros(&[in_channels, out_channels / groups, dims[2], dims[3], dims[4]]);
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

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn is_training(&self) -> bool {
        self.training
    }
}

impl<T> Layer<T> for ConvTranspose3D<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        convnd_core::ops::conv_transpose3d(
            input,
            &self.weight,
            self.bias.as_ref(),
            self.stride,
            self.padding,
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
        LayerType::ConvTranspose3D
    }

    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        Some(&mut self.weight)
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        replace_parameter("ConvTranspose3D", &mut self.weight, weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        match (&mut self.bias, bias) {
            (Some(slot), Some(bias)) => replace_parameter("ConvTranspose3D", slot, bias),
            (slot, bias) => {
                *slot = bias;
                Ok(())
            }
        }
    }
}
