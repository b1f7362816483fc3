//! Fixed-capacity bump allocator.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::error::AllocError;
use crate::raw_alloc::{Propagation, RawAlloc};

/// A fixed pre-allocated region with bump allocation.
///
/// The region is acquired once at construction and never grows. Each
/// allocation advances a cursor; individual blocks are not reclaimed,
/// except that freeing the most recent block rewinds the cursor. The
/// trailing rewind lets a dropped or shrunk container hand its block
/// back for reuse instead of stranding it at the end of the region.
///
/// `Bump` is a cheap handle: clones share the region via `Rc`, and
/// [`shares_pool`](RawAlloc::shares_pool) is true exactly for handles to
/// the same region. The propagation policy is
/// [`Propagation::PINNED`] — containers with handles to *different*
/// regions refuse to exchange buffers.
#[derive(Clone, Debug)]
pub struct Bump {
    inner: Rc<BumpInner>,
}

#[derive(Debug)]
struct BumpInner {
    /// Backing region. `Cell<u8>` so shared handles may write through
    /// `&self` without aliasing violations.
    storage: Box<[Cell<u8>]>,
    /// Next free byte offset.
    cursor: Cell<usize>,
}

impl Bump {
    /// Create a bump region of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(BumpInner {
                storage: vec![Cell::new(0u8); capacity].into_boxed_slice(),
                cursor: Cell::new(0),
            }),
        }
    }

    /// Total region capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.storage.len()
    }

    /// Bytes consumed so far (including alignment padding).
    pub fn used(&self) -> usize {
        self.inner.cursor.get()
    }

    /// Bytes still available at the end of the region.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    fn base(&self) -> *mut u8 {
        self.inner.storage.as_ptr() as *mut u8
    }
}

// SAFETY: blocks are carved out of a region owned by the Rc'd inner,
// which outlives every handle; the cursor never hands out overlapping
// live blocks, and `shares_pool` is true only for handles to the same
// region, so cross-pool frees are rejected by the container layer.
unsafe impl RawAlloc for Bump {
    const PROPAGATION: Propagation = Propagation::PINNED;

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() > 0, "zero-size allocation request");
        let base_addr = self.base() as usize;
        let start = self.inner.cursor.get();
        // Round the cursor up to the requested alignment.
        let misalign = (base_addr + start) % layout.align();
        let offset = if misalign == 0 {
            start
        } else {
            start + (layout.align() - misalign)
        };
        let end = match offset.checked_add(layout.size()) {
            Some(end) if end <= self.capacity() => end,
            _ => return Err(AllocError { layout }),
        };
        self.inner.cursor.set(end);
        // SAFETY: offset + size <= capacity, so the pointer is within the
        // region and non-null.
        Ok(unsafe { NonNull::new_unchecked(self.base().add(offset)) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let offset = ptr.as_ptr() as usize - self.base() as usize;
        // Rewind only if this was the most recent allocation.
        if offset + layout.size() == self.inner.cursor.get() {
            self.inner.cursor.set(offset);
        }
    }

    fn max_size(&self) -> usize {
        self.capacity()
    }

    fn shares_pool(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_allocations_advance_cursor() {
        let bump = Bump::with_capacity(1024);
        let layout = Layout::from_size_align(100, 1).unwrap();
        let a = bump.allocate(layout).unwrap();
        let b = bump.allocate(layout).unwrap();
        assert_ne!(a, b);
        assert_eq!(bump.used(), 200);
    }

    #[test]
    fn allocation_respects_alignment() {
        let bump = Bump::with_capacity(1024);
        bump.allocate(Layout::from_size_align(1, 1).unwrap()).unwrap();
        let ptr = bump.allocate(Layout::from_size_align(64, 16).unwrap()).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn exhausted_region_returns_error() {
        let bump = Bump::with_capacity(64);
        let layout = Layout::from_size_align(64, 1).unwrap();
        bump.allocate(layout).unwrap();
        assert!(bump.allocate(Layout::from_size_align(1, 1).unwrap()).is_err());
    }

    #[test]
    fn freeing_last_block_rewinds() {
        let bump = Bump::with_capacity(64);
        let layout = Layout::from_size_align(32, 1).unwrap();
        let ptr = bump.allocate(layout).unwrap();
        // SAFETY: just allocated with this layout.
        unsafe { bump.deallocate(ptr, layout) };
        assert_eq!(bump.used(), 0);
        assert!(bump.allocate(Layout::from_size_align(64, 1).unwrap()).is_ok());
    }

    #[test]
    fn freeing_earlier_block_is_a_no_op() {
        let bump = Bump::with_capacity(64);
        let layout = Layout::from_size_align(16, 1).unwrap();
        let first = bump.allocate(layout).unwrap();
        bump.allocate(layout).unwrap();
        // SAFETY: just allocated with this layout.
        unsafe { bump.deallocate(first, layout) };
        assert_eq!(bump.used(), 32);
    }

    #[test]
    fn clones_share_the_pool() {
        let bump = Bump::with_capacity(64);
        let other = bump.clone();
        assert!(bump.shares_pool(&other));
        bump.allocate(Layout::from_size_align(8, 1).unwrap()).unwrap();
        assert_eq!(other.used(), 8);
    }

    #[test]
    fn distinct_regions_do_not_share() {
        let a = Bump::with_capacity(64);
        let b = Bump::with_capacity(64);
        assert!(!a.shares_pool(&b));
    }

    #[test]
    fn max_size_is_region_capacity() {
        assert_eq!(Bump::with_capacity(512).max_size(), 512);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Live blocks handed out by one region never overlap.
            #[test]
            fn blocks_never_overlap(sizes in proptest::collection::vec(1usize..64, 1..20)) {
                let bump = Bump::with_capacity(4096);
                let mut blocks = Vec::new();
                for size in sizes {
                    let layout = Layout::from_size_align(size, 8).unwrap();
                    match bump.allocate(layout) {
                        Ok(ptr) => blocks.push((ptr.as_ptr() as usize, size)),
                        Err(_) => break,
                    }
                }
                for (i, &(a, a_size)) in blocks.iter().enumerate() {
                    for &(b, b_size) in &blocks[i + 1..] {
                        prop_assert!(a + a_size <= b || b + b_size <= a);
                    }
                }
            }

            /// The cursor never runs past the region.
            #[test]
            fn used_never_exceeds_capacity(sizes in proptest::collection::vec(1usize..128, 0..40)) {
                let bump = Bump::with_capacity(1024);
                for size in sizes {
                    let _ = bump.allocate(Layout::from_size_align(size, 4).unwrap());
                    prop_assert!(bump.used() <= bump.capacity());
                }
            }
        }
    }
}
