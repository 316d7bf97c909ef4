#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Placement of tensor storage
///
/// Only host memory is implemented. Operations that allocate new tensors take the
/// device from their inputs instead of assuming one, so additional placements can be
/// added without touching the layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Device {
    #[default]
    Cpu,
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    pub fn id(&self) -> usize {
        match self {
            Device::Cpu => 0,
        }
    }

    /// Parse a device string such as "cpu"
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        let s = s.trim().to_lowercase();
        if s == "cpu" {
            return Ok(Device::Cpu);
        }
        Err(format!("Invalid device string: {s}"))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}
