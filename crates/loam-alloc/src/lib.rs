//! Allocator capability contract for the loam containers.
//!
//! Containers in this workspace never call a system memory function
//! directly. They consume the [`RawAlloc`] capability: raw storage
//! acquisition and release, a reportable maximum allocation size, and a
//! [`Propagation`] policy table that tells the container what to do with
//! the allocator on clone and swap.
//!
//! # Architecture
//!
//! ```text
//! RawAlloc (capability trait)
//! ├── Heap          system heap, always interchangeable
//! ├── Bump          fixed pre-allocated region, Rc-shared, region-pinned
//! ├── Counting<A>   decorator: allocation/deallocation statistics
//! └── Quota<A>      decorator: caps max_size for capacity-limit testing
//! ```
//!
//! Typed construction and destruction of elements is not part of this
//! contract. Rust separates placement (`ptr::write`, `drop_in_place`)
//! from allocation at the language level, so the containers own the
//! element-lifecycle side and this crate owns only raw bytes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bump;
pub mod counting;
pub mod error;
pub mod heap;
pub mod quota;
mod raw_alloc;

// Public re-exports for the primary API surface.
pub use bump::Bump;
pub use counting::{AllocStats, Counting};
pub use error::AllocError;
pub use heap::Heap;
pub use quota::Quota;
pub use raw_alloc::{Propagation, RawAlloc};
