#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Dimensions of a tensor, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    pub fn from_slice(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Shape with `axis` removed, as produced by selecting a single index
    pub fn without_axis(&self, axis: usize) -> Option<Self> {
        if axis >= self.rank() {
            return None;
        }
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Some(Self::new(dims))
    }

    /// Shape with a new axis of length `len` inserted at `axis`
    pub fn with_axis(&self, axis: usize, len: usize) -> Option<Self> {
        if axis > self.rank() {
            return None;
        }
        let mut dims = self.dims.clone();
        dims.insert(axis, len);
        Some(Self::new(dims))
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.dims.clone()
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}
