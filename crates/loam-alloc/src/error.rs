//! Allocator-specific error types.

use std::alloc::Layout;
use std::error::Error;
use std::fmt;

/// Raw storage acquisition failed.
///
/// Returned by [`RawAlloc::allocate`](crate::RawAlloc::allocate) when the
/// underlying pool cannot satisfy the request — the system heap is
/// exhausted, a [`Bump`](crate::Bump) region is full, or a
/// [`Quota`](crate::Quota) budget is exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// The layout that could not be satisfied.
    pub layout: Layout,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocation failed: {} bytes (align {})",
            self.layout.size(),
            self.layout.align()
        )
    }
}

impl Error for AllocError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_size_and_align() {
        let err = AllocError {
            layout: Layout::from_size_align(64, 8).unwrap(),
        };
        assert_eq!(err.to_string(), "allocation failed: 64 bytes (align 8)");
    }
}
