//! `VmVec`: a growable array that never moves its elements.
//!
//! The whole address range is reserved up front; growth only widens the
//! accessible prefix, so `&v[k]` keeps the same address for as long as element
//! `k` lives.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Bound, Deref, DerefMut, RangeBounds};
use std::ptr::NonNull;
use std::slice;

use vmvec_core::config::{GrowthRatio, ReservationSize, VecConfig};
use vmvec_core::error::{Error, Result};
use vmvec_core::memory::{Protection, VirtualMemory};

use crate::os::OsMemory;
use crate::reservation::Reservation;
use crate::storage::{self, AutoErase, ErasePolicy, EraseStrategy};
use crate::tracking::GrowthStats;

pub struct VmVec<T, E: ErasePolicy<T> = AutoErase, M: VirtualMemory = OsMemory> {
    region: Reservation<M>,
    start: NonNull<T>,
    len: usize,
    capacity: usize,
    growth: GrowthRatio,
    _marker: PhantomData<(T, fn() -> E)>,
}

impl<T> VmVec<T> {
    /// Reserve `reservation` worth of address space and commit the first page.
    pub fn new(reservation: ReservationSize) -> Result<Self> {
        Self::with_config(&VecConfig {
            reservation,
            ..VecConfig::default()
        })
    }

    pub fn with_bytes(bytes: usize) -> Result<Self> {
        Self::new(ReservationSize::Bytes(bytes))
    }

    pub fn with_elements(count: usize) -> Result<Self> {
        Self::new(ReservationSize::Elements(count))
    }

    pub fn with_config(config: &VecConfig) -> Result<Self> {
        Self::with_memory(config, OsMemory)
    }
}

impl<T, E: ErasePolicy<T>> VmVec<T, E> {
    /// Like [`VmVec::with_config`] with an explicit erase policy.
    pub fn with_policy(config: &VecConfig) -> Result<Self> {
        Self::with_memory(config, OsMemory)
    }
}

impl<T, E: ErasePolicy<T>, M: VirtualMemory> VmVec<T, E, M> {
    /// Build on an arbitrary virtual-memory backend.
    pub fn with_memory(config: &VecConfig, memory: M) -> Result<Self> {
        let elem = mem::size_of::<T>();
        let page = memory.page_size();
        if elem == 0 {
            return Err(Error::Precondition(
                "zero-sized elements have no storage to commit".into(),
            ));
        }
        if elem >= page {
            return Err(Error::Precondition(format!(
                "element of {elem} bytes does not fit several times into a {page}-byte page"
            )));
        }
        config.validate()?;

        let mapping_size = config.reservation.bytes_for(elem)?;
        let mut region = Reservation::new(memory, mapping_size)?;

        // One page worth of elements, or the whole reservation if it is smaller.
        let initial = (page / elem).min(mapping_size / elem);
        region.commit(initial * elem)?;

        let start = region.base().cast::<T>();
        Ok(Self {
            region,
            start,
            len: 0,
            capacity: initial,
            growth: config.growth,
            _marker: PhantomData,
        })
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements that fit in the committed prefix.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements that fit in the whole reservation.
    pub fn max_capacity(&self) -> usize {
        self.region.mapping_size() / mem::size_of::<T>()
    }

    pub fn mapping_size(&self) -> usize {
        self.region.mapping_size()
    }

    pub fn committed_bytes(&self) -> usize {
        self.capacity * mem::size_of::<T>()
    }

    pub fn growth_ratio(&self) -> GrowthRatio {
        self.growth
    }

    pub fn growth_stats(&self) -> &GrowthStats {
        self.region.stats()
    }

    pub fn erase_strategy(&self) -> EraseStrategy {
        E::STRATEGY
    }

    pub fn is_frozen(&self) -> bool {
        self.region.protection() == Protection::ReadOnly
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.start.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.start.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is live and `start` is page aligned, which
        // satisfies `align_of::<T>() <= size_of::<T>() < page_size`.
        unsafe { slice::from_raw_parts(self.start.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.start.as_ptr(), self.len) }
    }

    /// Checked indexing.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Append `value`, committing more of the reservation first if full.
    ///
    /// On error nothing changes and `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.reserve_slot()?;
        // SAFETY: `len < capacity`, so the slot is committed and raw.
        unsafe { storage::construct_at(self.start.as_ptr(), self.len, value) };
        self.len += 1;
        Ok(())
    }

    /// Append the value produced by `make`, constructed directly in its slot.
    ///
    /// Capacity is secured before `make` runs, so a failed commit never calls it.
    pub fn emplace_back<F>(&mut self, make: F) -> Result<&mut T>
    where
        F: FnOnce() -> T,
    {
        self.reserve_slot()?;
        let index = self.len;
        // SAFETY: as in `push`.
        unsafe { storage::construct_at(self.start.as_ptr(), index, make()) };
        self.len += 1;
        // SAFETY: just constructed.
        Ok(unsafe { &mut *self.start.as_ptr().add(index) })
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was live and is now past `len`, so it is read once.
        Some(unsafe { self.start.as_ptr().add(self.len).read() })
    }

    /// Remove `[first, last)`, shifting the tail down.
    pub fn erase(&mut self, first: usize, last: usize) -> Result<()> {
        let len = self.len;
        if first > last {
            return Err(Error::OutOfRange { index: first, len });
        }
        if last > len {
            return Err(Error::OutOfRange { index: last, len });
        }
        if first == last {
            return Ok(());
        }

        // A panicking drop or clone leaks the tail instead of double-dropping it.
        self.len = first;
        // SAFETY: `[0, len)` is live and `first < last <= len`.
        unsafe { E::erase(self.start.as_ptr(), first, last, len) };
        self.len = len - (last - first);
        Ok(())
    }

    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<()> {
        let first = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let last = match range.end_bound() {
            Bound::Included(&i) => i.saturating_add(1),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => self.len,
        };
        self.erase(first, last)
    }

    pub fn erase_at(&mut self, index: usize) -> Result<()> {
        self.erase(index, index.saturating_add(1))
    }

    /// Drop every element. Capacity is kept.
    pub fn clear(&mut self) {
        let len = self.len;
        self.len = 0;
        // SAFETY: `[0, len)` was live and is no longer reachable.
        unsafe { storage::destroy_range(self.start.as_ptr(), 0, len) };
    }

    /// Make the committed prefix read-only. Writes fault until [`unfreeze`].
    ///
    /// [`unfreeze`]: VmVec::unfreeze
    pub fn freeze(&mut self) -> Result<()> {
        self.region.set_protection(Protection::ReadOnly, "freeze")
    }

    pub fn unfreeze(&mut self) -> Result<()> {
        self.region.set_protection(Protection::ReadWrite, "unfreeze")
    }

    fn reserve_slot(&mut self) -> Result<()> {
        if self.len == self.capacity {
            self.grow()?;
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let elem = mem::size_of::<T>();
        let ceiling = self.max_capacity();
        let target = (self.growth.next_bytes(self.capacity, elem) / elem).max(self.capacity + 1);
        if self.capacity >= ceiling {
            return Err(Error::CapacityExceeded {
                requested: target.saturating_mul(elem),
                mapping_size: self.region.mapping_size(),
            });
        }

        let target = target.min(ceiling);
        self.region.commit(target * elem)?;
        self.capacity = target;
        Ok(())
    }
}

impl<T: Clone, E: ErasePolicy<T>, M: VirtualMemory> VmVec<T, E, M> {
    /// Clone-append every element of `items`. Stops at the first failure;
    /// elements appended before it stay.
    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<()> {
        for item in items {
            self.push(item.clone())?;
        }
        Ok(())
    }
}

impl<T, E: ErasePolicy<T>, M: VirtualMemory> Drop for VmVec<T, E, M> {
    fn drop(&mut self) {
        if mem::needs_drop::<T>() && self.is_frozen() {
            if let Err(_err) = self.unfreeze() {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, len = self.len, "cannot unfreeze; leaking elements");
                return;
            }
        }
        self.clear();
        // `region` releases the reservation after this.
    }
}

impl<T, E: ErasePolicy<T>, M: VirtualMemory> Deref for VmVec<T, E, M> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, E: ErasePolicy<T>, M: VirtualMemory> DerefMut for VmVec<T, E, M> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T, E: ErasePolicy<T>, M: VirtualMemory> IntoIterator for &'a VmVec<T, E, M> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, E: ErasePolicy<T>, M: VirtualMemory> IntoIterator for &'a mut VmVec<T, E, M> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, E: ErasePolicy<T>, M: VirtualMemory> fmt::Debug for VmVec<T, E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SAFETY: the container owns its elements and its reservation outright, like
// `Vec<T>`; it has no shared interior state.
unsafe impl<T: Send, E: ErasePolicy<T>, M: VirtualMemory + Send> Send for VmVec<T, E, M> {}
