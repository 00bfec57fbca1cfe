//! vmvec-core: errors, configuration, and the virtual-memory interface.
//!
//! The container itself lives in `vmvec-mem`; this crate only carries the types
//! every layer shares so a caller can configure and match on errors without
//! depending on the mapping code.

pub mod config;
pub mod error;
pub mod memory;
pub mod prelude;

pub use config::{GrowthRatio, ReservationSize, VecConfig};
pub use error::{Error, Result};
pub use memory::{Protection, VirtualMemory};
