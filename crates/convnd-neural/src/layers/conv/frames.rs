//! Leading-axis bookkeeping shared by the decomposed convolutions
//!
//! A decomposed convolution evaluates one lower-rank child per kernel tap on every
//! slice of its leading spatial axis and overlap-adds the results into output
//! frames. This module holds the child type, the frame accumulator and the two
//! position mappings.

use crate::layers::Layer;
use convnd_core::{ops, Device, Result, Tensor, TensorError};
use num_traits::Float;

/// Child of a decomposed convolution: a lower-rank decomposition or a base layer
pub enum FrameConv<T, Op> {
    Nested(Box<Op>),
    Base(Box<dyn Layer<T>>),
}

impl<T, Op> FrameConv<T, Op>
where
    T: Float + Send + Sync + 'static,
    Op: Layer<T>,
{
    pub fn apply(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
        match self {
            FrameConv::Nested(op) => op.forward(input),
            FrameConv::Base(layer) => layer.forward(input),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FrameConv::Base(_))
    }

    pub fn parameters(&self) -> Vec<&Tensor<T>> {
        match self {
            FrameConv::Nested(op) => op.parameters(),
            FrameConv::Base(layer) => layer.parameters(),
        }
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor<T>> {
        match self {
            FrameConv::Nested(op) => op.parameters_mut(),
            FrameConv::Base(layer) => layer.parameters_mut(),
        }
    }

    pub fn set_training(&mut self, training: bool) {
        match self {
            FrameConv::Nested(op) => op.set_training(training),
            FrameConv::Base(layer) => layer.set_training(training),
        }
    }
}

impl<T, Op: Clone> Clone for FrameConv<T, Op> {
    fn clone(&self) -> Self {
        match self {
            FrameConv::Nested(op) => FrameConv::Nested(op.clone()),
            FrameConv::Base(layer) => FrameConv::Base(layer.clone_box()),
        }
    }
}

/// Overlap-add accumulator for the output frames of one decomposition level
///
/// The first value recorded for a frame is stored as is, later ones are added to
/// it. Frames that never receive a value come out as zeros.
#[derive(Debug, Clone)]
pub struct FrameAccumulator<T> {
    frames: Vec<Option<Tensor<T>>>,
}

impl<T> FrameAccumulator<T>
where
    T: Float,
{
    pub fn new(num_frames: usize) -> Self {
        Self {
            frames: vec![None; num_frames],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_recorded(&self, frame: usize) -> bool {
        matches!(self.frames.get(frame), Some(Some(_)))
    }

    /// Add `value` into frame `frame`
    pub fn record(&mut self, frame: usize, value: Tensor<T>) -> Result<()> {
        let num_frames = self.frames.len();
        let slot = self.frames.get_mut(frame).ok_or_else(|| {
            TensorError::invalid_argument_op(
                "FrameAccumulator::record",
                &format!("frame {frame} out of range for {num_frames} frames"),
            )
        })?;
        match slot {
            Some(acc) => acc.add_assign(&value),
            None => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    /// Stack all frames along axis 2
    ///
    /// `frame_shape` is the `[batch, channels, ..]` shape of a single frame, used for
    /// the frames nothing was recorded into.
    pub fn finish(self, frame_shape: &[usize], device: Device) -> Result<Tensor<T>> {
        if self.frames.is_empty() {
            return Err(TensorError::invalid_shape(
                "FrameAccumulator::finish",
                "no output frames".to_string(),
                frame_shape,
            ));
        }
        let frames: Vec<Tensor<T>> = self
            .frames
            .into_iter()
            .map(|frame| frame.unwrap_or_else(|| Tensor::zeros_on(frame_shape, device)))
            .collect();
        let views: Vec<&Tensor<T>> = frames.iter().collect();
        ops::stack(&views, 2)
    }
}

/// Output frame fed by input position `position` through kernel tap `tap`
///
/// The input is already padded along the leading axis, so the window of output
/// frame `o` starts at `o * stride` and its tap `tap` reads position
/// `o * stride + tap`. Positions off the stride grid contribute nothing.
pub fn forward_frame(position: usize, tap: usize, stride: usize, num_frames: usize) -> Option<usize> {
    let offset = position.checked_sub(tap)?;
    if offset % stride != 0 {
        return None;
    }
    let frame = offset / stride;
    (frame < num_frames).then_some(frame)
}

/// Output frame written by input position `position` through kernel tap `tap` in a
/// transposed convolution, `position * stride + tap - padding`
pub fn transposed_frame(
    position: usize,
    tap: usize,
    stride: usize,
    padding: usize,
    num_frames: usize,
) -> Option<usize> {
    let frame = (position * stride + tap).checked_sub(padding)?;
    (frame < num_frames).then_some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_frame_mapping() {
        // padded length 5, kernel 3, stride 2 -> frames 0 and 1
        assert_eq!(forward_frame(0, 0, 2, 2), Some(0));
        assert_eq!(forward_frame(2, 2, 2, 2), Some(0));
        assert_eq!(forward_frame(2, 0, 2, 2), Some(1));
        assert_eq!(forward_frame(3, 0, 2, 2), None);
        assert_eq!(forward_frame(1, 2, 2, 2), None);
        assert_eq!(forward_frame(4, 0, 2, 2), None);
        assert_eq!(forward_frame(4, 2, 2, 2), Some(1));
    }

    #[test]
    fn test_every_forward_frame_gets_every_tap() {
        let (len, kernel, stride) = (9, 3, 2);
        let frames = (len - kernel) / stride + 1;
        let mut hits = vec![0; frames];
        for tap in 0..kernel {
            for position in 0..len {
                if let Some(frame) = forward_frame(position, tap, stride, frames) {
                    hits[frame] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&h| h == kernel));
    }

    #[test]
    fn test_transposed_frame_mapping() {
        assert_eq!(transposed_frame(0, 0, 1, 0, 4), Some(0));
        assert_eq!(transposed_frame(1, 2, 2, 1, 6), Some(3));
        assert_eq!(transposed_frame(0, 0, 2, 1, 6), None);
        assert_eq!(transposed_frame(2, 2, 2, 0, 6), None);
    }

    #[test]
    fn test_accumulator_assign_then_add() {
        let mut acc = FrameAccumulator::<f32>::new(3);
        acc.record(1, Tensor::ones(&[1, 2])).unwrap();
        acc.record(1, Tensor::full(&[1, 2], 2.0)).unwrap();
        acc.record(2, Tensor::full(&[1, 2], 5.0)).unwrap();
        assert!(acc.is_recorded(1));
        assert!(!acc.is_recorded(0));
        assert!(acc.record(3, Tensor::ones(&[1, 2])).is_err());

        let out = acc.finish(&[1, 2], Device::Cpu).unwrap();
        assert_eq!(out.shape().dims(), &[1, 2, 3]);
        assert_eq!(out.to_vec(), vec![0.0, 3.0, 5.0, 0.0, 3.0, 5.0]);
    }

    #[test]
    fn test_accumulator_rejects_shape_change() {
        let mut acc = FrameAccumulator::<f32>::new(1);
        acc.record(0, Tensor::ones(&[1, 2])).unwrap();
        assert!(acc.record(0, Tensor::ones(&[1, 3])).is_err());
    }
}
