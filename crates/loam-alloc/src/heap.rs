//! System-heap allocator.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;
use crate::raw_alloc::{Propagation, RawAlloc};

/// The system heap, via `std::alloc`.
///
/// Zero-sized and stateless: every `Heap` is interchangeable with every
/// other, so it propagates freely on clone and swap. This is the default
/// allocator parameter for the loam containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap;

// SAFETY: blocks come from the global allocator and remain valid until
// `dealloc` is called with the same layout; `Heap` is stateless so any
// instance may free any other's blocks.
unsafe impl RawAlloc for Heap {
    const PROPAGATION: Propagation = Propagation::FULL;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() > 0, "zero-size allocation request");
        // SAFETY: callers uphold the trait contract that layout is non-zero.
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr/layout came from `allocate` above.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
