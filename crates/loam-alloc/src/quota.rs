//! Size-capping decorator.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::raw_alloc::{Propagation, RawAlloc};

/// Decorator that caps the size of any single allocation.
///
/// `max_size` reports the cap, and `allocate` rejects anything larger
/// even if the inner allocator could satisfy it. Containers consult
/// `max_size` before growing, so a `Quota` drives their
/// capacity-exceeded error paths deterministically — no need to exhaust
/// real memory in a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota<A> {
    inner: A,
    max_bytes: usize,
}

impl<A> Quota<A> {
    /// Cap single allocations through `inner` at `max_bytes`.
    pub fn new(inner: A, max_bytes: usize) -> Self {
        Self { inner, max_bytes }
    }
}

// SAFETY: allocation and deallocation are delegated to the inner
// allocator; the cap only rejects requests, never alters blocks.
unsafe impl<A: RawAlloc> RawAlloc for Quota<A> {
    const PROPAGATION: Propagation = A::PROPAGATION;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() > self.max_bytes {
            return Err(AllocError { layout });
        }
        self.inner.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: same contract as the caller's, delegated verbatim.
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    fn max_size(&self) -> usize {
        self.max_bytes.min(self.inner.max_size())
    }

    fn shares_pool(&self, other: &Self) -> bool {
        self.inner.shares_pool(&other.inner)
    }
}
