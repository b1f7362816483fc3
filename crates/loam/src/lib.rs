//! loam: a contiguous growable array parameterized over its allocator.
//!
//! [`DynArray<T, A>`] is a dynamic array that never calls a system
//! memory function directly — all raw storage comes from the
//! [`RawAlloc`](loam_alloc::RawAlloc) capability (see `loam-alloc`),
//! and all element construction/destruction goes through one small
//! lifecycle module, so liveness bookkeeping has a single seam.
//!
//! # Architecture
//!
//! ```text
//! DynArray<T, A> (sequence operations, owns `len`)
//! ├── RawBuf<T, A>   storage manager: one block, capacity, growth
//! │   └── A: RawAlloc   allocator capability (loam-alloc)
//! └── lifecycle       construct_at / destroy_range / relocate
//! ```
//!
//! `unsafe` is confined to the storage, lifecycle, array, and iterator
//! modules; every block carries a `// SAFETY:` comment.
//!
//! # Quick start
//!
//! ```rust
//! use loam::{array, DynArray};
//!
//! let mut arr: DynArray<i32> = array![1, 2, 3];
//! arr.insert(1, 9);
//! assert_eq!(arr, [1, 9, 2, 3]);
//! arr.remove(0);
//! assert_eq!(arr, [9, 2, 3]);
//!
//! // Storage can come from a fixed region instead of the heap.
//! let bump = loam_alloc::Bump::with_capacity(1024);
//! let mut pinned = DynArray::new_in(bump);
//! pinned.push(7u64);
//! assert_eq!(pinned.back(), Some(&7));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod error;
pub mod iter;
mod lifecycle;
mod raw;

// Public re-exports for the primary API surface.
pub use array::{swap, DynArray};
pub use error::ArrayError;
pub use iter::IntoIter;

/// Create a [`DynArray`] from a list of elements, or from an element and
/// a count.
///
/// ```
/// use loam::{array, DynArray};
///
/// let a: DynArray<i32> = array![1, 2, 3];
/// assert_eq!(a, [1, 2, 3]);
///
/// let b: DynArray<&str> = array!["x"; 4];
/// assert_eq!(b.len(), 4);
/// ```
#[macro_export]
macro_rules! array {
    (@count $($elem:expr),*) => {
        <[()]>::len(&[$($crate::array!(@unit $elem)),*])
    };
    (@unit $elem:expr) => { () };
    () => {
        $crate::DynArray::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::DynArray::from_elem($n, $elem)
    };
    ($($elem:expr),+ $(,)?) => {{
        let mut arr = $crate::DynArray::with_capacity($crate::array!(@count $($elem),+));
        $(arr.push($elem);)+
        arr
    }};
}
