//! Raw storage management: one owned block, its capacity, and growth.
//!
//! [`RawBuf`] answers "is there room" and performs reallocation when
//! there is not. It never constructs or destroys elements — it only
//! moves the bytes of the live prefix the caller tells it about. All
//! `unsafe` in this module is confined to the allocate/copy/free dance,
//! each block with a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem;
use std::ptr::{self, NonNull};

use loam_alloc::RawAlloc;

use crate::error::ArrayError;

/// Growth multiplier for amortized appends. Doubling keeps the
/// reallocation count logarithmic in the final length; a factor of 1
/// would degenerate to one reallocation per append.
const GROWTH_FACTOR: usize = 2;

/// An owned block of raw storage for `cap` slots of `T`.
///
/// Invariants: `cap == 0` means no allocation (dangling, well-aligned
/// pointer); `cap > 0` means `ptr` is a live allocation of exactly
/// `cap * size_of::<T>()` bytes from `alloc`. Zero-sized `T` never
/// allocates and reports unbounded capacity.
pub(crate) struct RawBuf<T, A: RawAlloc> {
    ptr: NonNull<T>,
    cap: usize,
    alloc: A,
}

impl<T, A: RawAlloc> RawBuf<T, A> {
    const ELEM: usize = mem::size_of::<T>();

    /// Empty buffer, no allocation.
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            alloc,
        }
    }

    /// Buffer with exactly `cap` slots allocated up front.
    pub(crate) fn try_with_capacity_in(cap: usize, alloc: A) -> Result<Self, ArrayError> {
        let mut buf = Self::new_in(alloc);
        buf.grow_to(cap, 0)?;
        Ok(buf)
    }

    pub(crate) fn ptr(&self) -> NonNull<T> {
        self.ptr
    }

    pub(crate) fn alloc(&self) -> &A {
        &self.alloc
    }

    /// Slots currently backed by storage.
    pub(crate) fn capacity(&self) -> usize {
        if Self::ELEM == 0 {
            usize::MAX
        } else {
            self.cap
        }
    }

    /// Largest slot count a single allocation from `alloc` can back.
    pub(crate) fn max_slots(&self) -> usize {
        if Self::ELEM == 0 {
            usize::MAX
        } else {
            self.alloc.max_size() / Self::ELEM
        }
    }

    /// Reserve semantics: grow to at least `min_cap` slots, relocating
    /// the `len` live elements. Never shrinks. The relocation is a
    /// bitwise move, which cannot fail, so on error the buffer is
    /// exactly as it was (strong guarantee).
    pub(crate) fn grow_to(&mut self, min_cap: usize, len: usize) -> Result<(), ArrayError> {
        if min_cap <= self.capacity() {
            return Ok(());
        }
        // Zero-sized T reports unbounded capacity, so only sized T gets here.
        let max_slots = self.max_slots();
        if min_cap > max_slots {
            return Err(ArrayError::CapacityExceeded {
                requested: min_cap,
                max_slots,
            });
        }
        self.reallocate(min_cap, len)
    }

    /// Amortized growth for appends: target capacity is
    /// `max(cap * GROWTH_FACTOR, len + additional)`, clamped to
    /// [`max_slots`](RawBuf::max_slots).
    pub(crate) fn grow_amortized(&mut self, len: usize, additional: usize) -> Result<(), ArrayError> {
        let max_slots = self.max_slots();
        let needed = match len.checked_add(additional) {
            Some(n) => n,
            None => {
                return Err(ArrayError::CapacityExceeded {
                    requested: usize::MAX,
                    max_slots,
                })
            }
        };
        if needed <= self.capacity() {
            return Ok(());
        }
        if needed > max_slots {
            return Err(ArrayError::CapacityExceeded {
                requested: needed,
                max_slots,
            });
        }
        let target = needed
            .max(self.cap.saturating_mul(GROWTH_FACTOR))
            .min(max_slots);
        self.reallocate(target, len)
    }

    /// Best-effort shrink to exactly `len` slots. Keeps the old block if
    /// the smaller allocation cannot be had; never fails for that reason.
    pub(crate) fn shrink_to(&mut self, len: usize) {
        debug_assert!(len <= self.cap || Self::ELEM == 0);
        if Self::ELEM == 0 || len == self.cap {
            return;
        }
        if len == 0 {
            self.release();
        } else {
            let _ = self.reallocate(len, len);
        }
    }

    /// Allocate `new_cap` slots, move the `len`-element live prefix over,
    /// free the old block.
    fn reallocate(&mut self, new_cap: usize, len: usize) -> Result<(), ArrayError> {
        debug_assert!(new_cap > 0 && len <= new_cap);
        let layout = Layout::array::<T>(new_cap).map_err(|_| ArrayError::CapacityExceeded {
            requested: new_cap,
            max_slots: self.max_slots(),
        })?;
        let new_ptr = self.alloc.allocate(layout)?.cast::<T>();
        // SAFETY: the new block is disjoint from the old one and holds at
        // least `len` slots; the old prefix is live per the caller.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
        }
        self.release();
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Free the current block, if any, and return to the empty state.
    fn release(&mut self) {
        if Self::ELEM == 0 || self.cap == 0 {
            return;
        }
        // SAFETY: cap > 0 means `ptr` came from `allocate` with exactly
        // this layout, which was validated by `Layout::array` at the time.
        unsafe {
            let layout =
                Layout::from_size_align_unchecked(Self::ELEM * self.cap, mem::align_of::<T>());
            self.alloc.deallocate(self.ptr.cast::<u8>(), layout);
        }
        self.ptr = NonNull::dangling();
        self.cap = 0;
    }
}

impl<T, A: RawAlloc> Drop for RawBuf<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_alloc::{Counting, Heap, Quota};

    #[test]
    fn new_buffer_has_no_allocation() {
        let alloc = Counting::new(Heap);
        let buf = RawBuf::<u64, _>::new_in(alloc.clone());
        assert_eq!(buf.capacity(), 0);
        assert_eq!(alloc.stats().allocations, 0);
    }

    #[test]
    fn with_capacity_allocates_exactly() {
        let alloc = Counting::new(Heap);
        let buf = RawBuf::<u64, _>::try_with_capacity_in(10, alloc.clone()).unwrap();
        assert_eq!(buf.capacity(), 10);
        assert_eq!(alloc.stats().live_bytes, 80);
    }

    #[test]
    fn grow_to_is_a_no_op_at_or_below_capacity() {
        let alloc = Counting::new(Heap);
        let mut buf = RawBuf::<u32, _>::try_with_capacity_in(8, alloc.clone()).unwrap();
        buf.grow_to(8, 0).unwrap();
        buf.grow_to(3, 0).unwrap();
        assert_eq!(buf.capacity(), 8);
        assert_eq!(alloc.stats().allocations, 1);
    }

    #[test]
    fn amortized_growth_doubles() {
        let mut buf = RawBuf::<u8, _>::new_in(Heap);
        let mut caps = Vec::new();
        for len in 0..9 {
            buf.grow_amortized(len, 1).unwrap();
            caps.push(buf.capacity());
        }
        assert_eq!(caps, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn growth_past_quota_is_capacity_exceeded() {
        // 64-byte quota = 8 slots of u64.
        let mut buf = RawBuf::<u64, _>::new_in(Quota::new(Heap, 64));
        buf.grow_to(8, 0).unwrap();
        let err = buf.grow_to(9, 0).unwrap_err();
        assert_eq!(
            err,
            ArrayError::CapacityExceeded {
                requested: 9,
                max_slots: 8
            }
        );
        // Strong guarantee: the old block is untouched.
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn amortized_growth_clamps_to_max_slots() {
        let mut buf = RawBuf::<u64, _>::new_in(Quota::new(Heap, 64));
        buf.grow_to(5, 0).unwrap();
        // Doubling would want 10 slots; the quota allows 8.
        buf.grow_amortized(5, 1).unwrap();
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn shrink_to_zero_releases_the_block() {
        let alloc = Counting::new(Heap);
        let mut buf = RawBuf::<u64, _>::try_with_capacity_in(16, alloc.clone()).unwrap();
        buf.shrink_to(0);
        assert_eq!(buf.capacity(), 0);
        assert_eq!(alloc.stats().live_bytes, 0);
    }

    #[test]
    fn shrink_reallocates_to_exact_size() {
        let alloc = Counting::new(Heap);
        let mut buf = RawBuf::<u64, _>::try_with_capacity_in(16, alloc.clone()).unwrap();
        buf.shrink_to(3);
        assert_eq!(buf.capacity(), 3);
        assert_eq!(alloc.stats().live_bytes, 24);
    }

    #[test]
    fn drop_returns_storage_to_the_allocator() {
        let alloc = Counting::new(Heap);
        {
            let _buf = RawBuf::<u64, _>::try_with_capacity_in(32, alloc.clone()).unwrap();
            assert_eq!(alloc.stats().live_bytes, 256);
        }
        assert_eq!(alloc.stats().live_bytes, 0);
        assert_eq!(alloc.stats().deallocations, 1);
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        let alloc = Counting::new(Heap);
        let mut buf = RawBuf::<(), _>::new_in(alloc.clone());
        assert_eq!(buf.capacity(), usize::MAX);
        buf.grow_amortized(1000, 1).unwrap();
        buf.grow_to(1 << 40, 1000).unwrap();
        assert_eq!(alloc.stats().allocations, 0);
    }
}
