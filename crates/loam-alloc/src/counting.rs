//! Allocation-counting decorator.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::AllocError;
use crate::raw_alloc::{Propagation, RawAlloc};

/// Running totals for a [`Counting`] allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Number of successful `allocate` calls.
    pub allocations: usize,
    /// Number of `deallocate` calls.
    pub deallocations: usize,
    /// Bytes currently outstanding.
    pub live_bytes: usize,
}

/// Decorator that counts allocations through an inner allocator.
///
/// Clones share the same counters, so the statistics describe the pool,
/// not the handle. Tests use this to verify the amortized-growth
/// property (O(log N) reallocations over N appends) and that every
/// container tears down to zero live bytes.
#[derive(Clone, Debug)]
pub struct Counting<A> {
    inner: A,
    stats: Rc<Cell<AllocStats>>,
}

impl<A> Counting<A> {
    /// Wrap `inner`, starting all counters at zero.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            stats: Rc::new(Cell::new(AllocStats::default())),
        }
    }

    /// Snapshot of the current counters.
    pub fn stats(&self) -> AllocStats {
        self.stats.get()
    }
}

// SAFETY: allocation and deallocation are delegated unchanged to the
// inner allocator; only bookkeeping is added.
unsafe impl<A: RawAlloc> RawAlloc for Counting<A> {
    const PROPAGATION: Propagation = A::PROPAGATION;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.inner.allocate(layout)?;
        let mut stats = self.stats.get();
        stats.allocations += 1;
        stats.live_bytes += layout.size();
        self.stats.set(stats);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: same contract as the caller's, delegated verbatim.
        unsafe { self.inner.deallocate(ptr, layout) };
        let mut stats = self.stats.get();
        stats.deallocations += 1;
        stats.live_bytes -= layout.size();
        self.stats.set(stats);
    }

    fn max_size(&self) -> usize {
        self.inner.max_size()
    }

    fn shares_pool(&self, other: &Self) -> bool {
        self.inner.shares_pool(&other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn counters_track_alloc_and_free() {
        let alloc = Counting::new(Heap);
        let layout = Layout::from_size_align(128, 8).unwrap();
        let ptr = alloc.allocate(layout).unwrap();
        assert_eq!(
            alloc.stats(),
            AllocStats {
                allocations: 1,
                deallocations: 0,
                live_bytes: 128
            }
        );
        // SAFETY: just allocated with this layout.
        unsafe { alloc.deallocate(ptr, layout) };
        let stats = alloc.stats();
        assert_eq!(stats.deallocations, 1);
        assert_eq!(stats.live_bytes, 0);
    }

    #[test]
    fn clones_share_counters() {
        let alloc = Counting::new(Heap);
        let other = alloc.clone();
        let layout = Layout::from_size_align(16, 8).unwrap();
        let ptr = alloc.allocate(layout).unwrap();
        assert_eq!(other.stats().allocations, 1);
        // SAFETY: just allocated with this layout; clones share the pool.
        unsafe { other.deallocate(ptr, layout) };
        assert_eq!(alloc.stats().live_bytes, 0);
    }

    #[test]
    fn propagation_mirrors_inner() {
        assert_eq!(Counting::<Heap>::PROPAGATION, Heap::PROPAGATION);
    }
}
