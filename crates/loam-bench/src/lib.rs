//! Benchmark profiles and utilities for the loam containers.
//!
//! Provides deterministic input builders shared by the criterion benches
//! so push/insert/clone runs measure container work, not input setup.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Deterministic pseudo-random values for benchmark inputs.
///
/// A fixed-seed xorshift keeps runs comparable without pulling in an RNG
/// dependency for the one place that needs noise.
pub fn scrambled_values(len: usize) -> Vec<u64> {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}
