//! vmvec-mem: reserve-then-commit storage and the `VmVec` container.
//!
//! Layers, leaf first:
//! - `os`: `VirtualMemory` over anonymous `mmap`/`mprotect`/`munmap`.
//! - `reservation`: one fixed address range and its growing committed prefix.
//! - `storage`: typed construct/destroy and the compile-time erase strategies.
//! - `vec`: the growable-array facade.
//!
//! Single-threaded by construction: no locks, no atomics on any hot path.
#![deny(unsafe_op_in_unsafe_fn)]

pub mod os;
pub mod reservation;
pub mod storage;
pub mod tracking;
pub mod vec;

pub use os::{page_size, OsMemory};
pub use reservation::Reservation;
pub use storage::{AutoErase, CloneErase, EraseStrategy, ErasePolicy, MoveErase, RelocateErase};
pub use tracking::GrowthStats;
pub use vec::VmVec;

pub use vmvec_core::{Error, GrowthRatio, Protection, ReservationSize, Result, VecConfig, VirtualMemory};
