//! Convenient re-exports for downstream crates.

pub use crate::config::{GrowthRatio, ReservationSize, VecConfig};
pub use crate::error::{Error, Result};
pub use crate::memory::{Protection, VirtualMemory};
