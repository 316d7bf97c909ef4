//! Configuration of decomposed N-d convolutions

use convnd_core::{PaddingMode, Result, TensorError};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Highest spatial rank handled by a single base convolution
pub const MAX_LEAF_RANK: usize = 3;

#[cfg(feature = "serialize")]
fn default_one() -> usize {
    1
}

#[cfg(feature = "serialize")]
fn default_true() -> bool {
    true
}

/// Hyperparameters of an N-d convolution or transposed convolution
///
/// `kernel_size`, `stride` and `padding` hold one entry per spatial axis and must all
/// have `num_dims` entries. A config describes one level of the decomposition;
/// [`ConvNdConfig::tail`] yields the config of the level below.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ConvNdConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub num_dims: usize,
    pub kernel_size: Vec<usize>,
    pub stride: Vec<usize>,
    pub padding: Vec<usize>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub padding_mode: PaddingMode,
    #[cfg_attr(feature = "serialize", serde(default = "default_one"))]
    pub dilation: usize,
    #[cfg_attr(feature = "serialize", serde(default = "default_one"))]
    pub groups: usize,
    #[cfg_attr(feature = "serialize", serde(default = "default_true"))]
    pub use_bias: bool,
}

impl ConvNdConfig {
    /// Config with explicit per-axis kernel, stride and padding
    ///
    /// Defaults to zero padding mode, dilation 1, one group and a bias.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        num_dims: usize,
        kernel_size: Vec<usize>,
        stride: Vec<usize>,
        padding: Vec<usize>,
    ) -> Self {
        Self {
            in_channels,
            out_channels,
            num_dims,
            kernel_size,
            stride,
            padding,
            padding_mode: PaddingMode::Zeros,
            dilation: 1,
            groups: 1,
            use_bias: true,
        }
    }

    /// Config repeating the same kernel, stride and padding on every axis
    pub fn uniform(
        in_channels: usize,
        out_channels: usize,
        num_dims: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        Self::new(
            in_channels,
            out_channels,
            num_dims,
            vec![kernel_size; num_dims],
            vec![stride; num_dims],
            vec![padding; num_dims],
        )
    }

    pub fn with_padding_mode(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }

    pub fn with_dilation(mut self, dilation: usize) -> Self {
        self.dilation = dilation;
        self
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_bias(mut self, use_bias: bool) -> Self {
        self.use_bias = use_bias;
        self
    }

    /// Check the config before any layer is built from it
    pub fn validate(&self, component: &str) -> Result<()> {
        let fail = |reason: String| Err(TensorError::invalid_configuration(component, reason));

        if self.num_dims == 0 {
            return fail("num_dims must be at least 1".to_string());
        }
        for (name, values) in [
            ("kernel_size", &self.kernel_size),
            ("stride", &self.stride),
            ("padding", &self.padding),
        ] {
            if values.len() != self.num_dims {
                return fail(format!(
                    "{name} has {} entries but num_dims is {}",
                    values.len(),
                    self.num_dims
                ));
            }
        }
        if self.kernel_size.contains(&0) {
            return fail(format!("kernel_size must be positive, got {:?}", self.kernel_size));
        }
        if self.stride.contains(&0) {
            return fail(format!("stride must be positive, got {:?}", self.stride));
        }
        if self.dilation != 1 {
            return fail(format!("dilation {} is not supported, only 1", self.dilation));
        }
        if self.in_channels == 0 || self.out_channels == 0 {
            return fail("channel counts must be positive".to_string());
        }
        if self.groups == 0
            || self.in_channels % self.groups != 0
            || self.out_channels % self.groups != 0
        {
            return fail(format!(
                "groups ({}) must divide in_channels ({}) and out_channels ({})",
                self.groups, self.in_channels, self.out_channels
            ));
        }
        Ok(())
    }

    /// Spatial rank of the base convolutions at the bottom of the decomposition
    pub fn leaf_rank(&self) -> usize {
        self.num_dims.saturating_sub(1).min(MAX_LEAF_RANK)
    }

    /// Number of leading axes consumed by the recursion rather than by a leaf
    pub fn recursive_axes(&self) -> usize {
        self.num_dims - self.leaf_rank()
    }

    /// True when the children of this level are base convolutions
    pub fn has_leaf_children(&self) -> bool {
        self.num_dims <= MAX_LEAF_RANK + 1
    }

    /// Config of the children: the leading axis removed and no bias
    pub fn tail(&self) -> Self {
        Self {
            num_dims: self.num_dims.saturating_sub(1),
            kernel_size: self.kernel_size.iter().skip(1).copied().collect(),
            stride: self.stride.iter().skip(1).copied().collect(),
            padding: self.padding.iter().skip(1).copied().collect(),
            use_bias: false,
            ..self.clone()
        }
    }

    /// Output spatial shape of the forward convolution
    ///
    /// `(in + 2 * padding - kernel) / stride + 1` on every axis.
    pub fn output_spatial(&self, input_spatial: &[usize]) -> Result<Vec<usize>> {
        self.check_spatial("ConvNd", input_spatial)?;
        (0..self.num_dims)
            .map(|axis| {
                forward_length(
                    input_spatial[axis],
                    self.kernel_size[axis],
                    self.stride[axis],
                    self.padding[axis],
                )
                .ok_or_else(|| self.empty_axis("ConvNd", axis, input_spatial))
            })
            .collect()
    }

    /// Output spatial shape of the transposed convolution
    ///
    /// `(in - 1) * stride - 2 * padding + kernel` on every axis.
    pub fn transposed_output_spatial(&self, input_spatial: &[usize]) -> Result<Vec<usize>> {
        self.check_spatial("ConvTransposeNd", input_spatial)?;
        (0..self.num_dims)
            .map(|axis| {
                transposed_length(
                    input_spatial[axis],
                    self.kernel_size[axis],
                    self.stride[axis],
                    self.padding[axis],
                )
                .ok_or_else(|| self.empty_axis("ConvTransposeNd", axis, input_spatial))
            })
            .collect()
    }

    fn check_spatial(&self, operation: &str, input_spatial: &[usize]) -> Result<()> {
        if input_spatial.len() != self.num_dims {
            return Err(TensorError::invalid_shape(
                operation,
                format!(
                    "expected {} spatial dimensions, got {}",
                    self.num_dims,
                    input_spatial.len()
                ),
                input_spatial,
            ));
        }
        Ok(())
    }

    fn empty_axis(&self, operation: &str, axis: usize, input_spatial: &[usize]) -> TensorError {
        TensorError::invalid_shape(
            operation,
            format!(
                "spatial axis {axis} yields an empty output (kernel {}, stride {}, padding {})",
                self.kernel_size[axis], self.stride[axis], self.padding[axis]
            ),
            input_spatial,
        )
    }
}

/// Forward output length, `None` when the padded input is shorter than the kernel
pub(crate) fn forward_length(len: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = len + 2 * padding;
    (padded >= kernel && stride > 0).then(|| (padded - kernel) / stride + 1)
}

/// Transposed output length, `None` when it would not be positive
pub(crate) fn transposed_length(
    len: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
) -> Option<usize> {
    let full = len.checked_sub(1)? * stride + kernel;
    (full > 2 * padding).then(|| full - 2 * padding)
}
