pub mod activation;
pub mod conv;
pub mod dense_block;

pub use activation::ReLU;
pub use conv::{
    Conv1D, Conv2D, Conv3D, ConvNd, ConvNdConfig, ConvTranspose1D, ConvTranspose2D,
    ConvTranspose3D, ConvTransposeNd, FrameAccumulator, FrameConv, PointwiseConv,
};
pub use dense_block::DenseBlock;

use convnd_core::{Result, Tensor};

/// Kind of a layer, for introspection of built operator trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    PointwiseConv,
    Conv1D,
    Conv2D,
    Conv3D,
    ConvTranspose1D,
    ConvTranspose2D,
    ConvTranspose3D,
    ConvNd,
    ConvTransposeNd,
    Activation,
    DenseBlock,
    Unknown,
}

pub trait Layer<T> {
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>>;
    fn parameters(&self) -> Vec<&Tensor<T>>;
    fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>>;
    fn set_training(&mut self, training: bool);
    fn clone_box(&self) -> Box<dyn Layer<T>>;

    /// Returns the kind of this layer
    fn layer_type(&self) -> LayerType {
        LayerType::Unknown
    }

    /// Mutable access to the kernel weight, for layers owning exactly one
    fn weight_mut(&mut self) -> Option<&mut Tensor<T>> {
        None
    }

    /// Set weight tensor for layers that support weights
    /// Default implementation returns an error
    fn set_weight(&mut self, _weight: Tensor<T>) -> Result<()> {
        Err(convnd_core::TensorError::unsupported_operation_simple(
            "This layer type does not support weight setting".to_string(),
        ))
    }

    /// Set bias tensor for layers that support bias
    /// Default implementation returns an error
    fn set_bias(&mut self, _bias: Option<Tensor<T>>) -> Result<()> {
        Err(convnd_core::TensorError::unsupported_operation_simple(
            "This layer type does not support bias setting".to_string(),
        ))
    }
}

impl<T> Clone for Box<dyn Layer<T>> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Replace `slot` with `value` if the shapes agree
pub(crate) fn replace_parameter<T>(
    layer: &str,
    slot: &mut Tensor<T>,
    value: Tensor<T>,
) -> Result<()> {
    if slot.shape() != value.shape() {
        return Err(convnd_core::TensorError::shape_mismatch(
            layer,
            &slot.shape().to_string(),
            &value.shape().to_string(),
        ));
    }
    *slot = value;
    Ok(())
}
