//! N-dimensional convolution by recursive decomposition
//!
//! A convolution over `D` spatial axes is evaluated as `kernel_size[0]` convolutions
//! over `D - 1` axes, one per tap of the leading kernel axis. Child `i` is applied to
//! every slice of the input along the leading axis, and its result is overlap-added
//! into the output frame whose window covers that slice at tap `i`. Recursion stops
//! once at most three axes remain, where base `Conv1D`/`Conv2D`/`Conv3D` layers take
//! over (a one-axis convolution bottoms out in pointwise channel mixing).

use super::config::{forward_length, ConvNdConfig};
use super::frames::{forward_frame, FrameAccumulator, FrameConv};
use super::base_conv;
use crate::initializers::Initializers;
use crate::layers::{Layer, LayerType};
use convnd_core::{ops, Result, Tensor, TensorError};
use num_traits::Float;

/// Decomposed N-d convolution
///
/// Input layout `[batch, in_channels, s_0, .., s_{D-1}]`. The equivalent dense kernel
/// has layout `[out_channels, in_channels / groups, k_0, .., k_{D-1}]` and is spread
/// over the base layers of the tree: see [`ConvNd::kernel`] and [`ConvNd::set_kernel`].
///
/// The bias lives on the top-level instance only and is added once, after all
/// frames have been assembled.
#[derive(Clone)]
pub struct ConvNd<T> {
    config: ConvNdConfig,
    rank: i32,
    children: Vec<FrameConv<T, ConvNd<T>>>,
    bias: Option<Tensor<T>>,
    training: bool,
}

impl<T> ConvNd<T>
where
    T: Float + Send + Sync + 'static,
{
    pub fn new(config: ConvNdConfig) -> Result<Self> {
        Self::with_initializers(config, Initializers::default())
    }

    /// Build the operator tree, running `init.kernel` on every base layer weight and
    /// `init.bias` on the bias
    ///
    /// The bias starts at zero when no bias initializer is given.
    pub fn with_initializers(config: ConvNdConfig, init: Initializers<'_, T>) -> Result<Self> {
        config.validate("ConvNd")?;
        Self::build(config, 0, init)
    }

    fn build(config: ConvNdConfig, rank: i32, init: Initializers<'_, T>) -> Result<Self> {
        let child_config = config.tail();
        let child_init = init.kernel_only();

        let children = (0..config.kernel_size[0])
            .map(|_| {
                if config.has_leaf_children() {
                    let mut leaf = base_conv::<T>(&child_config)?;
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
            "built ConvNd level"
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

    /// Depth in the tree: 0 at the top, decreasing by one per level
    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn children(&self) -> &[FrameConv<T, ConvNd<T>>] {
        &self.children
    }

    pub fn bias(&self) -> Option<&Tensor<T>> {
        self.bias.as_ref()
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Output shape for an input of shape `input_shape`
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        self.check_input_rank(input_shape)?;
        let mut shape = vec![input_shape[0], self.config.out_channels];
        shape.extend(self.config.output_spatial(&input_shape[2..])?);
        Ok(shape)
    }

    /// Convolve `input`
    pub fn apply(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_input_rank(input.shape().dims())?;

        // The top level pads every axis the recursion consumes, once. Base layers
        // pad their own axes.
        let padded;
        let input = if self.rank == 0 {
            let axes = self.config.recursive_axes();
            padded = ops::pad_axes(
                input,
                2,
                &self.config.padding[..axes],
                self.config.padding_mode,
            )?;
            &padded
        } else {
            input
        };

        let output = self.overlap_add(input)?;
        match &self.bias {
            Some(bias) => ops::add_channel_bias(&output, bias),
            None => Ok(output),
        }
    }

    fn overlap_add(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        let dims = input.shape().dims();
        let in_len = dims[2];
        let (kernel, stride) = (self.config.kernel_size[0], self.config.stride[0]);
        let num_frames = forward_length(in_len, kernel, stride, 0).ok_or_else(|| {
            TensorError::invalid_shape(
                "ConvNd",
                format!("padded leading axis of length {in_len} is shorter than kernel {kernel}"),
                dims,
            )
        })?;

        let mut frame_shape = vec![dims[0], self.config.out_channels];
        frame_shape.extend(self.frame_spatial(&dims[3..])?);

        let slices = (0..in_len)
            .map(|position| ops::select(input, 2, position))
            .collect::<Result<Vec<_>>>()?;

        let mut frames = FrameAccumulator::new(num_frames);
        let mut contributions = 0usize;
        for (tap, child) in self.children.iter().enumerate() {
            for (position, slice) in slices.iter().enumerate() {
                if let Some(frame) = forward_frame(position, tap, stride, num_frames) {
                    frames.record(frame, child.apply(slice)?)?;
                    contributions += 1;
                }
            }
        }

        tracing::trace!(
            rank = self.rank,
            input = ?dims,
            frames = num_frames,
            contributions,
            "ConvNd overlap-add"
        );
        frames.finish(&frame_shape, *input.device())
    }

    /// Spatial shape of one output frame, given the trailing input axes
    ///
    /// Axes still handled by the recursion arrive padded, the leaf axes are padded
    /// by the base layers.
    fn frame_spatial(&self, trailing: &[usize]) -> Result<Vec<usize>> {
        let recursive_axes = self.config.recursive_axes();
        trailing
            .iter()
            .enumerate()
            .map(|(offset, &len)| {
                let axis = offset + 1;
                let padding = if axis < recursive_axes {
                    0
                } else {
                    self.config.padding[axis]
                };
                forward_length(
                    len,
                    self.config.kernel_size[axis],
                    self.config.stride[axis],
                    padding,
                )
                .ok_or_else(|| {
                    TensorError::invalid_shape(
                        "ConvNd",
                        format!(
                            "spatial axis {axis} of length {len} is shorter than kernel {}",
                            self.config.kernel_size[axis]
                        ),
                        trailing,
                    )
                })
            })
            .collect()
    }

    fn check_input_rank(&self, dims: &[usize]) -> Result<()> {
        let expected = self.config.num_dims + 2;
        if dims.len() != expected {
            return Err(TensorError::invalid_shape(
                "ConvNd",
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
            self.config.out_channels,
            self.config.in_channels / self.config.groups,
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
                        "ConvNd::kernel",
                        "base layer has no weight",
                    )),
                },
            })
            .collect::<Result<Vec<_>>>()?;
        let taps: Vec<&Tensor<T>> = taps.iter().collect();
        ops::stack(&taps, 2)
    }

    /// Distribute a dense kernel over the base layers
    ///
    /// The tree is left untouched if `weight` has the wrong shape.
    pub fn set_kernel(&mut self, weight: &Tensor<T>) -> Result<()> {
        let expected = self.kernel_shape();
        if weight.shape().dims() != expected.as_slice() {
            return Err(TensorError::shape_mismatch(
                "ConvNd::set_kernel",
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

impl<T> Layer<T> for ConvNd<T>
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
        LayerType::ConvNd
    }

    fn set_weight(&mut self, weight: Tensor<T>) -> Result<()> {
        self.set_kernel(&weight)
    }

    fn set_bias(&mut self, bias: Option<Tensor<T>>) -> Result<()> {
        if let Some(ref bias) = bias {
            if bias.shape().dims() != [self.config.out_channels] {
                return Err(TensorError::shape_mismatch(
                    "ConvNd::set_bias",
                    &format!("[{}]", self.config.out_channels),
                    &bias.shape().to_string(),
                ));
            }
        }
        self.bias = bias;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers;

    #[test]
    fn test_tree_structure() {
        let config = ConvNdConfig::new(2, 3, 5, vec![2, 3, 1, 1, 1], vec![1; 5], vec![0; 5]);
        let conv = ConvNd::<f32>::new(config).unwrap();
        assert_eq!(conv.rank(), 0);
        assert_eq!(conv.children().len(), 2);
        for child in conv.children() {
            let FrameConv::Nested(nested) = child else {
                panic!("five axes should nest once");
            };
            assert_eq!(nested.rank(), -1);
            assert!(nested.bias().is_none());
            assert_eq!(nested.children().len(), 3);
            assert!(nested.children().iter().all(FrameConv::is_leaf));
        }
        // 2 * 3 leaf weights, then the bias
        assert_eq!(conv.parameters().len(), 7);
        assert_eq!(conv.parameters().last().unwrap().shape().dims(), &[3]);
    }

    #[test]
    fn test_kernel_initializer_reaches_every_leaf() {
        let init = initializers::constant(0.5f32);
        let bias_init = initializers::constant(2.0f32);
        let conv = ConvNd::with_initializers(
            ConvNdConfig::uniform(1, 1, 4, 2, 1, 0),
            Initializers::new().with_kernel(&init).with_bias(&bias_init),
        )
        .unwrap();
        let params = conv.parameters();
        let (bias, weights) = params.split_last().unwrap();
        assert_eq!(weights.len(), 2);
        assert!(weights
            .iter()
            .all(|w| w.to_vec().iter().all(|&v| v == 0.5)));
        assert_eq!(bias.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_kernel_round_trip() {
        let config = ConvNdConfig::new(2, 2, 4, vec![2, 1, 2, 3], vec![1; 4], vec![0; 4]);
        let mut conv = ConvNd::<f64>::new(config).unwrap();
        let numel: usize = conv.kernel_shape().iter().product();
        let weight = Tensor::from_vec(
            (0..numel).map(|v| v as f64).collect(),
            &conv.kernel_shape(),
        )
        .unwrap();
        conv.set_kernel(&weight).unwrap();
        assert_eq!(conv.kernel().unwrap(), weight);

        let wrong = Tensor::zeros(&[2, 2, 2, 1, 2, 2]);
        assert!(conv.set_kernel(&wrong).unwrap_err().is_shape_error());
        assert_eq!(conv.kernel().unwrap(), weight);
    }

    #[test]
    fn test_rank_mismatch_is_shape_error() {
        let conv = ConvNd::<f32>::new(ConvNdConfig::uniform(1, 1, 2, 1, 1, 0)).unwrap();
        let err = conv.apply(&Tensor::zeros(&[1, 1, 4])).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_set_training_propagates() {
        let mut conv = ConvNd::<f32>::new(ConvNdConfig::uniform(1, 1, 5, 1, 1, 0)).unwrap();
        conv.set_training(true);
        assert!(conv.is_training());
        let FrameConv::Nested(nested) = &conv.children()[0] else {
            panic!("expected a nested level");
        };
        assert!(nested.is_training());
    }
}
