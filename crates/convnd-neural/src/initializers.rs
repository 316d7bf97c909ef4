//! Parameter initializers
//!
//! An initializer is any `Fn(&mut Tensor<T>)`. The decomposed convolutions call the
//! kernel initializer on the weight of every base layer in the tree and the bias
//! initializer once on the top-level bias. The functions here build common ones;
//! random initializers are seeded and keep their generator across calls, so
//! successive leaves receive different draws.

use convnd_core::Tensor;
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Optional initializers applied while a layer tree is being built
pub struct Initializers<'a, T> {
    pub kernel: Option<&'a dyn Fn(&mut Tensor<T>)>,
    pub bias: Option<&'a dyn Fn(&mut Tensor<T>)>,
}

impl<'a, T> Initializers<'a, T> {
    pub fn new() -> Self {
        Self {
            kernel: None,
            bias: None,
        }
    }

    pub fn with_kernel(mut self, kernel: &'a dyn Fn(&mut Tensor<T>)) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn with_bias(mut self, bias: &'a dyn Fn(&mut Tensor<T>)) -> Self {
        self.bias = Some(bias);
        self
    }

    /// The initializers handed to child levels, which own no bias
    pub fn kernel_only(&self) -> Self {
        Self {
            kernel: self.kernel,
            bias: None,
        }
    }

    pub(crate) fn init_kernel(&self, weight: &mut Tensor<T>) {
        if let Some(kernel) = self.kernel {
            kernel(weight);
        }
    }

    pub(crate) fn init_bias(&self, bias: &mut Tensor<T>) {
        if let Some(init) = self.bias {
            init(bias);
        }
    }
}

impl<T> Default for Initializers<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Initializers<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Initializers<'_, T> {}

/// Fan-in and fan-out of a convolution weight `[out, in, k..]`
pub fn fan_in_fan_out(shape: &[usize]) -> (usize, usize) {
    match shape.len() {
        0 => (1, 1),
        1 => (shape[0], shape[0]),
        _ => {
            let receptive: usize = shape[2..].iter().product();
            (shape[1] * receptive, shape[0] * receptive)
        }
    }
}

fn fill_with<T: Float>(tensor: &mut Tensor<T>, mut sample: impl FnMut() -> f64) {
    tensor
        .array_mut()
        .mapv_inplace(|_| T::from(sample()).unwrap_or_else(T::zero));
}

/// Set every element to `value`
pub fn constant<T: Float>(value: T) -> impl Fn(&mut Tensor<T>) {
    move |tensor| tensor.array_mut().fill(value)
}

pub fn zeros<T: Float>() -> impl Fn(&mut Tensor<T>) {
    constant(T::zero())
}

pub fn ones<T: Float>() -> impl Fn(&mut Tensor<T>) {
    constant(T::one())
}

/// Uniform samples in `[low, high)`
pub fn uniform<T: Float>(low: f64, high: f64, seed: u64) -> impl Fn(&mut Tensor<T>) {
    let rng = RefCell::new(StdRng::seed_from_u64(seed));
    move |tensor| {
        let mut rng = rng.borrow_mut();
        fill_with(tensor, || rng.gen_range(low..high));
    }
}

/// Glorot uniform, bound `sqrt(6 / (fan_in + fan_out))`
pub fn xavier_uniform<T: Float>(seed: u64) -> impl Fn(&mut Tensor<T>) {
    let rng = RefCell::new(StdRng::seed_from_u64(seed));
    move |tensor| {
        let (fan_in, fan_out) = fan_in_fan_out(tensor.shape().dims());
        let bound = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
        let mut rng = rng.borrow_mut();
        fill_with(tensor, || rng.gen_range(-bound..bound));
    }
}

/// He normal, standard deviation `sqrt(2 / fan_in)`, sampled with Box-Muller
pub fn he_normal<T: Float>(seed: u64) -> impl Fn(&mut Tensor<T>) {
    let rng = RefCell::new(StdRng::seed_from_u64(seed));
    move |tensor| {
        let (fan_in, _) = fan_in_fan_out(tensor.shape().dims());
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        let mut rng = rng.borrow_mut();
        fill_with(tensor, || {
            let u1: f64 = rng.gen::<f64>().max(1e-10);
            let u2: f64 = rng.gen();
            std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        });
    }
}
