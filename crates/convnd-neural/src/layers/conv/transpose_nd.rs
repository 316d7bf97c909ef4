//! N-dimensional transposed convolution by recursive decomposition
//!
//! Mirrors [`super::ConvNd`]: one child of rank `D - 1` per tap of the leading kernel
//! axis, ending in base `ConvTranspose1D`/`2D`/`3D` layers. Every input slice is
//! scattered through every child; slice `j` under tap `i` lands on output frame
//! `j * stride + i - padding`, and frames outside the output are dropped. Each level
//! crops its own leading axis, so no input padding happens anywhere.

use super::base_conv_transpose;
use super::config::{transposed_length, ConvNdConfig};
use super::frames::{transposed_frame, FrameAccumulator, FrameConv};
use crate::initializers::Initializers;
use crate::layers::{Layer, LayerType};
use convnd_core::{ops, PaddingMode, Result, Tensor, TensorError};
use num_traits::Float;

/// Decomposed N-d transposed convolution
///
/// Input layout `[batch, in_channels, s_0, .., s_{D-1}]`. The equivalent dense kernel
/// has layout `[in_channels, out_channels / groups, k_0, .., k_{D-1}]`.
#[derive(Clone)]
pub struct ConvTransposeNd<T> {
    config: ConvNdConfig,
    rank: i32,
    children: Vec<FrameConv<T, ConvTransposeNd<T>>>,
    bias: Option<Tensor<T>>,
    training: bool,
}

impl<T> ConvTransposeNd<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(config: ConvNdConfig) -> Result<Self> {
        Self::with_initializers(config, Initializers::default())
    }

    /// Build the operator tree, running `init.kernel` on every base layer weight and
    /// `init.bias` on the bias
    pub fn with_initializers(config: ConvNdConfig, init: Initializers<'_, T>) -> Result<Self> {
        config.validate("ConvTransposeNd")?;
        if config.padding_mode != PaddingMode::Zeros {
            return Err(TensorError::invalid_configuration(
                "ConvTransposeNd",
                format!(
                    "only zeros padding is supported for transposed convolutions, got {}",
                    config.padding_mode
                ),
            ));
        }
        Self::build(config, 0, init)
    }

    fn build(config: ConvNdConfig, rank: i32, init: Initializers<'_, T>) -> Result<Self> {
        let child_config = config.tail();
        let child_init = init.kernel_only();

        let children = (0..config.kernel_size[0])
            .map(|_| {
                if config.has_leaf_children() {
                    let mut leaf = base_conv_transpose::<T>(&child_config)?;
                    if let Some(weight) = leaf.weight_mut() {
                        init.init_kernel(weight);
                    }
                    Ok(FrameConv::Base(leaf))
                } else {
                    let nested = Self::build(child_config.clone(), rank - 1, child_init)?;
                    Ok(FrameConv::Nested(Box::new(nested)))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let bias = if config.use_bias {
            let mut bias = Tensor::zeros(&[config.out_channels]);
            init.init_bias(&mut bias);
            Some(bias)
        } else {
            None
        };

        tracing::debug!(
            num_dims = config.num_dims,
            rank,
            children = children.len(),
            leaf_rank = config.leaf_rank(),
            use_bias = config.use_bias,
            "built ConvTransposeNd level"
        );

        Ok(Self {
            config,
            rank,
            children,
            bias,
            training: false,
        })
    }

    pub fn config(&self) -> &ConvNdConfig {
        &self.config
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn children(&self) -> &[FrameConv<T, ConvTransposeNd<T>>] {
        &self.children
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        self.check_input_rank(input_shape)?;
        let mut shape = vec![input_shape[0], self.config.out_channels];
        shape.extend(self.config.transposed_output_spatial(&input_shape[2..])?);
        Ok(shape)
    }

    /// Transposed-convolve `input`
    pub fn apply(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        let dims = input.shape().dims();
        self.check_input_rank(dims)?;

        let in_len = dims[2];
        let (kernel, stride, padding) = (
            self.config.kernel_size[0],
            self.config.stride[0],
            self.config.padding[0],
        );
        let num_frames = transposed_length(in_len, kernel, stride, padding).ok_or_else(|| {
            TensorError::invalid_shape(
                "ConvTransposeNd",
                format!(
                    "leading axis of length {in_len} yields an empty output (kernel {kernel}, stride {stride}, padding {padding})"
                ),
                dims,
            )
        })?;

        let mut frame_shape = vec![dims[0], self.config.out_channels];
        frame_shape.extend(self.config.tail().transposed_output_spatial(&dims[3..])?);

        let mut frames = FrameAccumulator::new(num_frames);
        let mut contributions = 0usize;
        for position in 0..in_len {
            let slice = ops::select(input, 2, position)?;
            for (tap, child) in self.children.iter().enumerate() {
                if let Some(frame) = transposed_frame(position, tap, stride, padding, num_frames) {
                    frames.record(frame, child.apply(&slice)?)?;
                    contributions += 1;
                }
            }
        }

        tracing::trace!(
            rank = self.rank,
            input = ?dims,
            frames = num_frames,
            contributions,
            "ConvTransposeNd overlap-add"
        );
        let output = frames.finish(&frame_shape, *input.device())?;
        match &self.bias {
            Some(bias) => ops::add_channel_bias(&output, bias),
            None => Ok(output),
        }
    }

    fn check_input_rank(&self, dims: &[usize]) -> Result<()> {
        let expected = self.config.num_dims + 2;
        if dims.len() != expected {
            return Err(TensorError::invalid_shape(
                "ConvTransposeNd",
                format!(
                    "expected {expected}D input [batch, channels, {} spatial], got {}D",
                    self.config.num_dims,
                    dims.len()
                ),
                dims,
            ));
        }
        Ok(())
    }

    /// Shape of the equivalent dense kernel
    pub fn kernel_shape(&self) -> Vec<usize> {
        let mut shape = vec![
            self.config.in_channels,
            self.config.out_channels / self.config.groups,
        ];
        shape.extend_from_slice(&self.config.kernel_size);
        shape
    }

    /// Assemble the equivalent dense kernel from the base layer weights
    pub fn kernel(&self) -> Result<Tensor<T>> {
        let taps = self
            .children
            .iter()
            .map(|child| match child {
                FrameConv::Nested(op) => op.kernel(),
                FrameConv::Base(layer) => match layer.parameters().first() {
                    Some(weight) => Ok((*weight).clone()),
                    None => Err(TensorError::invalid_argument_op(
                        "ConvTransposeNd::kernel",
                        "base layer has no weight",
                    )),
                },
            })
            .collect::<Result<Vec<_>>>()?;
        let taps: Vec<&Tensor<T>> = taps.iter().collect();
        ops::stack(&taps, 2)
    }

    /// Distribute a dense kernel over the base layers
    pub fn set_kernel(&mut self, weight: &Tensor<T>) -> Result<()> {
        let expected = self.kernel_shape();
        if weight.shape().dims() != expected.as_slice() {
            return Err(TensorError::shape_mismatch(
                "ConvTransposeNd::set_kernel",
                &format!("{expected:?}"),
                &weight.shape().to_string(),
            ));
        }
        for (tap, child) in self.children.iter_mut().enumerate() {
            let slice = ops::select(weight, 2, tap)?;
            match child {
                FrameConv::Nested(op) => op.set_kernel(&slice)?,
                FrameConv::Base(layer) => layer.set_weight(slice)?,
            }
        }
        Ok(())
    }
}

impl<T> Layer<T> for ConvTransposeNd<T>
where
    T: Float + Send + Sync + 'static,
{
    fn forward(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        self.apply(input)
    }

    fn parameters(&self) -> Vec<&Tensor<T>> {
        let mut params: Vec<&Tensor<T>> = self
            .children
            .iter()
            .flat_map(|child| child.parameters())
            .collect();
        if let Some(ref bias) = self.bias {
            params.push(bias);
        }
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>> {
        let mut params: Vec<&mut Tensor<T>> = self
            .children
            .iter_mut()
            .flat_map(|child| child.parameters_mut())
            .collect();
        if let Some(ref mut bias) = self.bias {
            params.push(bias);
        }
        params
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
        for child in &mut self.children {
            child.set_training(training);
        }
    }

    fn clone_box(&self) -> Box<dyn Layer<T>> {
        Box::new(self.clone())
    }

    fn layer_type(&self) -> LayerType {
        LayerType::ConvTransposeNd
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        self.set_kernel(&weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        if let Some(ref bias) = bias {
            if bias.shape().dims() != [self.config.out_channels] {
                return Err(TensorError::shape_mismatch(
                    "ConvTransposeNd::set_bias",
                    &format!("[{}]", self.config.out_channels),
                    &bias.shape().to_string(),
                ));
            }
        }
        self.bias = bias;
        Ok(())
    }
}
