//! Tensor Module
//!
//! - **core**: tensor structure, storage and property access
//! - **creation**: constructors
//! - **ops**: method forms of the free functions in [`crate::ops`]

pub mod core;
pub mod creation;
pub mod ops;

pub use core::{Tensor, TensorStorage};
