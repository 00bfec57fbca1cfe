//! Abstract virtual-memory interface.
//!
//! The concrete implementation lives in `vmvec-mem`. We keep only the trait here
//! so the container logic can be exercised against any backend (including test
//! doubles that refuse protection changes) without pulling `libc` into core.

use std::io;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

/// Access mode applied to a prefix of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protection {
    /// Reserved only: any access faults.
    None,
    ReadOnly,
    ReadWrite,
}

/// The OS collaborator behind a reservation.
///
/// Implementations hand out page-aligned address ranges with no access rights
/// and later change the protection of page-granular prefixes of them. They hold
/// no per-reservation state: the caller owns the address and the length.
pub trait VirtualMemory {
    /// Granularity of `protect`, in bytes. Must be a power of two.
    fn page_size(&self) -> usize;

    /// Reserve `bytes` of inaccessible address space without physical backing.
    fn reserve(&self, bytes: usize) -> io::Result<NonNull<u8>>;

    /// Change the access mode of `[addr, addr + bytes)`.
    ///
    /// # Safety
    /// `addr` must be the base of a live reservation obtained from `reserve` on
    /// this backend, and `bytes` must not exceed that reservation's length.
    /// Revoking write access to memory that is later written through a live
    /// reference faults the process.
    unsafe fn protect(&self, addr: NonNull<u8>, bytes: usize, mode: Protection) -> io::Result<()>;

    /// Give the whole reservation back to the OS.
    ///
    /// # Safety
    /// `addr`/`bytes` must describe exactly one live reservation from `reserve`,
    /// and nothing may touch the range afterwards. Called once per reservation.
    unsafe fn release(&self, addr: NonNull<u8>, bytes: usize);
}

// NOTE: Do *not* add a blanket impl that hands out heap memory here; the commit
// protocol relies on the backend actually faulting outside the committed prefix.
