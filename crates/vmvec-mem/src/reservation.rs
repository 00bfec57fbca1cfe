//! Reservation + commit controller.
//!
//! A `Reservation` owns one address range from a `VirtualMemory` backend. The
//! range never moves or resizes; only the accessible prefix grows. Dropping the
//! reservation returns the whole range to the backend exactly once.

use std::ptr::NonNull;

use vmvec_core::error::{Error, Result};
use vmvec_core::memory::{Protection, VirtualMemory};

use crate::os::OsMemory;
use crate::tracking::GrowthStats;

pub struct Reservation<M: VirtualMemory = OsMemory> {
    memory: M,
    base: NonNull<u8>,
    mapping_size: usize,
    committed: usize,
    /// Mode of the committed prefix. Later commits extend it with the same mode.
    mode: Protection,
    stats: GrowthStats,
}

impl<M: VirtualMemory> Reservation<M> {
    /// Reserve `mapping_size` bytes of inaccessible address space.
    pub fn new(memory: M, mapping_size: usize) -> Result<Self> {
        let base = memory
            .reserve(mapping_size)
            .map_err(|source| Error::Allocation {
                bytes: mapping_size,
                source,
            })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            mapping_size,
            base = ?base,
            page_size = memory.page_size(),
            "reserved address range"
        );

        Ok(Self {
            memory,
            base,
            mapping_size,
            committed: 0,
            mode: Protection::ReadWrite,
            stats: GrowthStats::new(),
        })
    }

    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    pub fn mapping_size(&self) -> usize {
        self.mapping_size
    }

    pub fn committed_bytes(&self) -> usize {
        self.committed
    }

    pub fn page_size(&self) -> usize {
        self.memory.page_size()
    }

    pub fn protection(&self) -> Protection {
        self.mode
    }

    pub fn stats(&self) -> &GrowthStats {
        &self.stats
    }

    /// Make `[0, new_bytes)` accessible in the current mode.
    ///
    /// The committed prefix never shrinks: a target at or below the current
    /// prefix is a no-op. Fails without touching state if the target is past
    /// the reservation or the backend refuses the protection change.
    pub fn commit(&mut self, new_bytes: usize) -> Result<()> {
        if new_bytes > self.mapping_size {
            return Err(Error::CapacityExceeded {
                requested: new_bytes,
                mapping_size: self.mapping_size,
            });
        }
        if new_bytes <= self.committed {
            return Ok(());
        }

        // SAFETY: `base` came from `reserve` on this backend and
        // `new_bytes <= mapping_size`.
        unsafe { self.memory.protect(self.base, new_bytes, self.mode) }.map_err(|source| {
            #[cfg(feature = "tracing")]
            tracing::warn!(new_bytes, error = %source, "commit refused");
            Error::Protection {
                op: "commit",
                bytes: new_bytes,
                source,
            }
        })?;

        self.stats.record_commit(self.committed, new_bytes);
        self.committed = new_bytes;
        Ok(())
    }

    /// Change the mode of the committed prefix without changing its length.
    /// `op` names the caller in the error.
    pub fn set_protection(&mut self, mode: Protection, op: &'static str) -> Result<()> {
        // SAFETY: same reservation, `committed <= mapping_size`.
        unsafe { self.memory.protect(self.base, self.committed, mode) }.map_err(|source| {
            #[cfg(feature = "tracing")]
            tracing::warn!(op, bytes = self.committed, error = %source, "protection change refused");
            Error::Protection {
                op,
                bytes: self.committed,
                source,
            }
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(op, bytes = self.committed, ?mode, "protection changed");

        self.mode = mode;
        Ok(())
    }
}

impl<M: VirtualMemory> Drop for Reservation<M> {
    fn drop(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            mapping_size = self.mapping_size,
            committed = self.committed,
            "releasing address range"
        );
        // SAFETY: the reservation is released once, here, and `base` is not
        // reachable after drop.
        unsafe { self.memory.release(self.base, self.mapping_size) };
    }
}

// SAFETY: the reservation is uniquely owned; moving it to another thread moves
// the only handle to the range.
unsafe impl<M: VirtualMemory + Send> Send for Reservation<M> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::page_size;

    #[test]
    fn commit_grows_and_never_shrinks() {
        let mut r = Reservation::new(OsMemory, 8 * page_size()).unwrap();
        assert_eq!(r.committed_bytes(), 0);

        r.commit(page_size()).unwrap();
        r.commit(3 * page_size()).unwrap();
        r.commit(page_size()).unwrap();
        assert_eq!(r.committed_bytes(), 3 * page_size());
        assert_eq!(r.stats().commits, 2);
        assert_eq!(r.stats().growth_events, 1);
    }

    #[test]
    fn commit_past_ceiling_is_refused() {
        let mut r = Reservation::new(OsMemory, 2 * page_size()).unwrap();
        r.commit(page_size()).unwrap();

        let err = r.commit(2 * page_size() + 1).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded { requested, mapping_size }
                if requested == 2 * page_size() + 1 && mapping_size == 2 * page_size()
        ));
        assert_eq!(r.committed_bytes(), page_size());
    }

    #[test]
    fn committed_prefix_is_writable_and_stays_put() {
        let mut r = Reservation::new(OsMemory, 4 * page_size()).unwrap();
        r.commit(page_size()).unwrap();
        let base = r.base();
        unsafe { base.as_ptr().write(7) };

        r.commit(4 * page_size()).unwrap();
        assert_eq!(r.base(), base);
        unsafe {
            assert_eq!(base.as_ptr().read(), 7);
            base.as_ptr().add(4 * page_size() - 1).write(9);
        }
    }

    #[test]
    fn protection_round_trip() {
        let mut r = Reservation::new(OsMemory, page_size()).unwrap();
        r.commit(page_size()).unwrap();
        r.set_protection(Protection::ReadOnly, "freeze").unwrap();
        assert_eq!(r.protection(), Protection::ReadOnly);
        r.set_protection(Protection::ReadWrite, "unfreeze").unwrap();
        unsafe { r.base().as_ptr().write(1) };
    }

    #[test]
    fn oversized_reservation_reports_allocation_error() {
        let err = Reservation::new(OsMemory, usize::MAX - page_size()).err().unwrap();
        assert!(matches!(err, Error::Allocation { .. }));
    }
}
