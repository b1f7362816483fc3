//! Container-specific error types.

use std::error::Error;
use std::fmt;

use loam_alloc::AllocError;

/// Errors surfaced by [`DynArray`](crate::DynArray) operations.
///
/// Every failure leaves the container in its pre-call state; no
/// operation retries internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// A growth request exceeded what the allocator can provide in a
    /// single block.
    CapacityExceeded {
        /// Requested capacity, in element slots.
        requested: usize,
        /// Largest slot count the allocator's `max_size` permits.
        max_slots: usize,
    },
    /// A checked access used an index at or past the live length.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Live element count at the time of the call.
        len: usize,
    },
    /// The allocator refused a request that was within `max_size`
    /// (e.g. the heap is exhausted or a bump region is full).
    AllocFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
    },
    /// An O(1) buffer exchange was requested between containers whose
    /// allocators neither propagate on swap nor share a pool.
    AllocatorMismatch,
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                max_slots,
            } => {
                write!(
                    f,
                    "capacity exceeded: requested {requested} slots, allocator limit {max_slots}"
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::AllocFailed { bytes } => write!(f, "allocation of {bytes} bytes failed"),
            Self::AllocatorMismatch => {
                write!(f, "allocators do not share a pool and do not propagate on swap")
            }
        }
    }
}

impl Error for ArrayError {}

impl From<AllocError> for ArrayError {
    fn from(err: AllocError) -> Self {
        Self::AllocFailed {
            bytes: err.layout.size(),
        }
    }
}
