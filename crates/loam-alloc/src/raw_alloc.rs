//! The allocator capability trait and its propagation policy table.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;

/// What a container does with its allocator on clone and swap.
///
/// C++-style allocator propagation, reduced to the seams Rust actually
/// has. Native moves always transfer the allocator wholesale together
/// with the buffer it allocated, so `on_move` is recorded for
/// completeness but only consulted indirectly (a moved container never
/// separates buffer from allocator). `on_clone` is consulted by
/// `clone_from`; `on_swap` by the container's O(1) swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Propagation {
    /// `clone_from` replaces the destination's allocator with a clone of
    /// the source's.
    pub on_clone: bool,
    /// The allocator travels with the contents on move (always true in
    /// practice for native moves).
    pub on_move: bool,
    /// Swap may exchange the two allocators along with the buffers.
    pub on_swap: bool,
    /// Any two instances can free each other's blocks, so propagation
    /// questions are moot.
    pub always_equal: bool,
}

impl Propagation {
    /// Full propagation: stateless, interchangeable allocators.
    pub const FULL: Self = Self {
        on_clone: true,
        on_move: true,
        on_swap: true,
        always_equal: true,
    };

    /// No propagation: the allocator is pinned to its container and only
    /// same-pool instances may exchange buffers.
    pub const PINNED: Self = Self {
        on_clone: false,
        on_move: true,
        on_swap: false,
        always_equal: false,
    };
}

/// Capability contract for raw storage providers.
///
/// Implementations hand out blocks of raw, uninitialised bytes. They
/// never construct or destroy typed values — that is the container's
/// job, performed with `ptr::write`/`drop_in_place` into storage obtained
/// here.
///
/// # Contract
///
/// - `allocate` is never called with a zero-size layout; containers
///   represent the empty state without an allocation.
/// - A block returned by `allocate` is freed exactly once, with the same
///   layout, through `deallocate` on the same instance or one for which
///   [`shares_pool`](RawAlloc::shares_pool) returns `true`.
/// - `max_size` bounds the size in bytes of any single allocation this
///   instance will ever satisfy; `allocate` may fail earlier, but never
///   succeeds beyond it.
///
/// # Safety
///
/// A successful `allocate` must return a pointer that is valid for reads
/// and writes of `layout.size()` bytes at `layout.align()` alignment,
/// and that stays valid until the matching `deallocate` — including
/// across clones and moves of the allocator value itself.
pub unsafe trait RawAlloc {
    /// Propagation policy consulted by container clone and swap.
    const PROPAGATION: Propagation;

    /// Acquire a block of raw storage for `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Release a block previously returned by [`allocate`](RawAlloc::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must denote a block allocated by this pool with exactly
    /// `layout`, not yet deallocated.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Largest single allocation, in bytes, this instance can satisfy.
    fn max_size(&self) -> usize {
        isize::MAX as usize
    }

    /// Whether `other` may free blocks allocated by `self`.
    fn shares_pool(&self, _other: &Self) -> bool {
        Self::PROPAGATION.always_equal
    }
}
