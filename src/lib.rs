//! vmvec: a growable array that reserves its address space once and commits
//! pages as it grows, so elements never move.
//!
//! ```no_run
//! use vmvec::VmVec;
//!
//! let mut v = VmVec::<u64>::with_bytes(1 << 30)?;
//! v.push(7)?;
//! let first = &v[0] as *const u64;
//! for i in 0..1_000_000 {
//!     v.push(i)?;
//! }
//! assert_eq!(first, &v[0] as *const u64);
//! # Ok::<(), vmvec::Error>(())
//! ```

pub use vmvec_core::prelude::*;
pub use vmvec_mem::{
    page_size, AutoErase, CloneErase, EraseStrategy, ErasePolicy, GrowthStats, MoveErase,
    OsMemory, RelocateErase, Reservation, VmVec,
};
