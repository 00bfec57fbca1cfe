//! Typed view over committed bytes: placement construction, destruction and
//! gap-closing erase.
//!
//! Everything here works on raw slot pointers. The container decides which
//! slots are live; these functions only move, write and drop what they are
//! told to.
//!
//! The erase strategy is chosen per element type at compile time through
//! [`ErasePolicy`]. All strategies produce the same observable result: the
//! erased elements are dropped exactly once, the tail keeps its order, and no
//! live duplicate is left past the new length.

use std::mem;
use std::ptr;

/// How an erase closes the gap it leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseStrategy {
    /// Drop the erased range, then `memmove` the tail down.
    Relocate,
    /// Swap the tail down one slot at a time, then drop the displaced
    /// elements that ended up past the new length.
    MoveAssign,
    /// `clone_from` the tail down, then drop the trailing duplicates.
    CloneAssign,
}

/// Compile-time selection of an [`EraseStrategy`] for element type `T`.
pub trait ErasePolicy<T> {
    const STRATEGY: EraseStrategy;

    /// Remove `[first, last)` from the live range `[0, len)`.
    ///
    /// # Safety
    /// `base` must point at `len` live, contiguous elements and
    /// `first <= last <= len`. On return `[0, len - (last - first))` is live
    /// and every slot past it is raw memory.
    unsafe fn erase(base: *mut T, first: usize, last: usize, len: usize);
}

/// Relocate when `T` has no drop glue, move-assign otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoErase;

#[derive(Debug, Clone, Copy, Default)]
pub struct RelocateErase;

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveErase;

/// Copy-assignment fallback; only available for `T: Clone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneErase;

impl<T> ErasePolicy<T> for AutoErase {
    const STRATEGY: EraseStrategy = if mem::needs_drop::<T>() {
        EraseStrategy::MoveAssign
    } else {
        EraseStrategy::Relocate
    };

    unsafe fn erase(base: *mut T, first: usize, last: usize, len: usize) {
        // SAFETY: forwarded caller contract.
        unsafe {
            if mem::needs_drop::<T>() {
                move_erase(base, first, last, len)
            } else {
                relocate_erase(base, first, last, len)
            }
        }
    }
}

impl<T> ErasePolicy<T> for RelocateErase {
    const STRATEGY: EraseStrategy = EraseStrategy::Relocate;

    unsafe fn erase(base: *mut T, first: usize, last: usize, len: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { relocate_erase(base, first, last, len) }
    }
}

impl<T> ErasePolicy<T> for MoveErase {
    const STRATEGY: EraseStrategy = EraseStrategy::MoveAssign;

    unsafe fn erase(base: *mut T, first: usize, last: usize, len: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { move_erase(base, first, last, len) }
    }
}

impl<T: Clone> ErasePolicy<T> for CloneErase {
    const STRATEGY: EraseStrategy = EraseStrategy::CloneAssign;

    unsafe fn erase(base: *mut T, first: usize, last: usize, len: usize) {
        // SAFETY: forwarded caller contract.
        unsafe { clone_erase(base, first, last, len) }
    }
}

/// Placement-construct `value` in slot `index`.
///
/// # Safety
/// The slot must be committed, writable and not hold a live element.
#[inline]
pub unsafe fn construct_at<T>(base: *mut T, index: usize, value: T) {
    // SAFETY: caller guarantees the slot is raw committed memory.
    unsafe { ptr::write(base.add(index), value) }
}

/// Drop the elements in `[first, last)`. No-op for types without drop glue.
///
/// # Safety
/// Every slot in the range must hold a live element; afterwards none do.
#[inline]
pub unsafe fn destroy_range<T>(base: *mut T, first: usize, last: usize) {
    if mem::needs_drop::<T>() && first < last {
        // SAFETY: caller guarantees `[first, last)` is live.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(first), last - first)) }
    }
}

/// # Safety
/// See [`ErasePolicy::erase`].
pub unsafe fn relocate_erase<T>(base: *mut T, first: usize, last: usize, len: usize) {
    if first == last {
        return;
    }
    // SAFETY: `[first, last)` is live; the tail `[last, len)` is moved bitwise
    // and its old slots become raw memory, so nothing is dropped twice.
    unsafe {
        destroy_range(base, first, last);
        ptr::copy(base.add(last), base.add(first), len - last);
    }
}

/// # Safety
/// See [`ErasePolicy::erase`].
pub unsafe fn move_erase<T>(base: *mut T, first: usize, last: usize, len: usize) {
    if first == last {
        return;
    }
    let removed = last - first;
    // SAFETY: both slots of every swap are live; after the loop the erased
    // elements sit in `[len - removed, len)` and are dropped there.
    unsafe {
        for src in last..len {
            ptr::swap(base.add(src - removed), base.add(src));
        }
        destroy_range(base, len - removed, len);
    }
}

/// # Safety
/// See [`ErasePolicy::erase`].
pub unsafe fn clone_erase<T: Clone>(base: *mut T, first: usize, last: usize, len: usize) {
    if first == last {
        return;
    }
    let removed = last - first;
    // SAFETY: destinations are live so `clone_from` drops what it overwrites;
    // the trailing `removed` slots still hold live values (tail originals or
    // erased elements nothing overwrote) and are dropped last.
    unsafe {
        for src in last..len {
            (*base.add(src - removed)).clone_from(&*base.add(src));
        }
        destroy_range(base, len - removed, len);
    }
}
