//! Activation functions

use crate::Tensor;
use num_traits::Float;

/// Rectified linear unit, `max(x, 0)`
pub fn relu<T: Float>(x: &Tensor<T>) -> Tensor<T> {
    let zero = T::zero();
    Tensor::from_array_on(
        x.array().mapv(|v| if v > zero { v } else { zero }),
        *x.device(),
    )
}
