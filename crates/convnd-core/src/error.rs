use thiserror::Error;

/// Errors raised by tensor operations and layer construction
///
/// Two families matter to callers of the convolution layers:
/// configuration errors ([`TensorError::InvalidConfiguration`]) are raised eagerly
/// when a layer is built, and shape errors ([`TensorError::InvalidShape`],
/// [`TensorError::ShapeMismatch`]) are raised by the kernels at forward time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("Shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    #[error("Invalid shape in operation '{operation}': {reason}")]
    InvalidShape {
        operation: String,
        reason: String,
        shape: Option<Vec<usize>>,
    },

    #[error("Invalid axis {axis} in operation '{operation}' for tensor with {ndim} dimensions")]
    InvalidAxis {
        operation: String,
        axis: usize,
        ndim: usize,
    },

    #[error("Invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Invalid configuration for '{component}': {reason}")]
    InvalidConfiguration { component: String, reason: String },

    #[error("Incompatible devices in operation '{operation}': {device1} and {device2}")]
    DeviceMismatch {
        operation: String,
        device1: String,
        device2: String,
    },

    #[error("Operation '{operation}' not supported: {reason}")]
    UnsupportedOperation { operation: String, reason: String },
}

impl TensorError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(operation: &str, expected: &str, got: &str) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Create an invalid shape error for a named operation
    pub fn invalid_shape(operation: &str, reason: String, shape: &[usize]) -> Self {
        Self::InvalidShape {
            operation: operation.to_string(),
            reason,
            shape: Some(shape.to_vec()),
        }
    }

    /// Create an invalid shape error without operation context
    pub fn invalid_shape_simple(reason: String) -> Self {
        Self::InvalidShape {
            operation: "unknown".to_string(),
            reason,
            shape: None,
        }
    }

    /// Create an invalid axis error
    pub fn invalid_axis(operation: &str, axis: usize, ndim: usize) -> Self {
        Self::InvalidAxis {
            operation: operation.to_string(),
            axis,
            ndim,
        }
    }

    /// Create an invalid argument error without operation context
    pub fn invalid_argument(reason: String) -> Self {
        Self::InvalidArgument {
            operation: "unknown".to_string(),
            reason,
        }
    }

    /// Create an invalid argument error for a named operation
    pub fn invalid_argument_op(operation: &str, reason: &str) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error for a layer or operator
    pub fn invalid_configuration(component: &str, reason: String) -> Self {
        Self::InvalidConfiguration {
            component: component.to_string(),
            reason,
        }
    }

    pub fn device_mismatch(operation: &str, device1: &str, device2: &str) -> Self {
        Self::DeviceMismatch {
            operation: operation.to_string(),
            device1: device1.to_string(),
            device2: device2.to_string(),
        }
    }

    pub fn unsupported_operation_simple(reason: String) -> Self {
        Self::UnsupportedOperation {
            operation: "unknown".to_string(),
            reason,
        }
    }

    /// Operation (or component) name associated with this error
    pub fn operation(&self) -> &str {
        match self {
            Self::ShapeMismatch { operation, .. }
            | Self::InvalidShape { operation, .. }
            | Self::InvalidAxis { operation, .. }
            | Self::InvalidArgument { operation, .. }
            | Self::DeviceMismatch { operation, .. }
            | Self::UnsupportedOperation { operation, .. } => operation,
            Self::InvalidConfiguration { component, .. } => component,
        }
    }

    /// True for errors raised while validating a layer configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// True for errors caused by tensor shapes not fitting an operation
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidShape { .. } | Self::ShapeMismatch { .. } | Self::InvalidAxis { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;

impl From<ndarray::ShapeError> for TensorError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::InvalidShape {
            operation: "tensor_creation".to_string(),
            reason: format!("Shape error: {err}"),
            shape: None,
        }
    }
}
