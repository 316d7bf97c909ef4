//! Residual dense block built from 2D decomposed convolutions

use crate::initializers::Initializers;
use crate::layers::{ConvNd, ConvNdConfig, Layer, LayerType, ReLU};
use convnd_core::{Result, Tensor, TensorError};
use num_traits::Float;

/// Three same-size convolutions with cumulative skip connections
///
/// ```text
/// x1 = relu(conv1(x))
/// x2 = relu(conv2(x + x1))
/// x3 = relu(conv3(x + x1 + x2))
/// out = x + conv_out(x + x1 + x2 + x3)
/// ```
///
/// `conv1`..`conv3` use `kernel_size` with `kernel_size / 2` padding so the spatial
/// shape is preserved, `conv_out` is 1x1. All four carry a bias.
#[derive(Clone)]
pub struct DenseBlock<T> {
    convs: [ConvNd<T>; 3],
    conv_out: ConvNd<T>,
    activation: ReLU,
    training: bool,
}

impl<T> DenseBlock<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(channels: usize, kernel_size: usize) -> Result<Self> {
        Self::with_initializers(channels, kernel_size, Initializers::default())
    }

    pub fn with_initializers(
        channels: usize,
        kernel_size: usize,
        init: Initializers<'_, T>,
    ) -> Result<Self> {
        if kernel_size % 2 == 0 {
            return Err(TensorError::invalid_configuration(
                "DenseBlock",
                format!("kernel_size must be odd to preserve the spatial shape, got {kernel_size}"),
            ));
        }
        let same = ConvNdConfig::uniform(channels, channels, 2, kernel_size, 1, kernel_size / 2);
        let convs = [
            ConvNd::with_initializers(same.clone(), init)?,
            ConvNd::with_initializers(same.clone(), init)?,
            ConvNd::with_initializers(same, init)?,
        ];
        let conv_out =
            ConvNd::with_initializers(ConvNdConfig::uniform(channels, channels, 2, 1, 1, 0), init)?;
        Ok(Self {
            convs,
            conv_out,
            activation: ReLU,
            training: false,
        })
    }

    pub fn convs(&self) -> &[ConvNd<T>; 3] {
        &self.convs
    }

    pub fn conv_out(&self) -> &ConvNd<T> {
        &self.conv_out
    }

    pub fn convs_mut(&mut self) -> &mut [ConvNd<T>; 3] {
        &mut self.convs
    }

    pub fn conv_out_mut(&mut self) -> &mut ConvNd<T> {
        &mut self.conv_out
    }
}

impl<T> Layer<T> for DenseBlock<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        let mut running = input.clone();
        for conv in &self.convs {
            let features = self.activation.forward(&conv.apply(&running)?)?;
            running.add_assign(&features)?;
        }
        let out = self.conv_out.apply(&running)?;
        input.add(&out)
    }

    fn parameters(&self) -> Vec<&Tensor<T>> {
        self.convs
            .iter()
            .chain(std::iter::once(&self.conv_out))
            .flat_map(|conv| conv.parameters())
            .collect()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>> {
        self.convs
            .iter_mut()
            .chain(std::iter::once(&mut self.conv_out))
            .flat_map(|conv| conv.parameters_mut())
            .collect()
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        for conv in self.convs.iter_mut().chain(std::iter::once(&mut self.conv_out)) {
            conv.set_training(training);
        }
    }

    fn clone_box(&self) -> Box<dyn Layer<T>> {
        Box::new(self.clone())
    }

    fn layer_type(&self) -> LayerType {
        LayerType::DenseBlock
    }
}
