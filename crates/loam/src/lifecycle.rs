//! Element-lifecycle primitives over raw slots.
//!
//! The container is the sole liveness bookkeeper: these helpers are only
//! ever called on slots whose constructed-vs-raw state is tracked
//! precisely by the caller's `len`/`capacity` pair. Double-destroy and
//! construct-over-live are contract violations, which is why everything
//! here is `unsafe` and `pub(crate)`.

#![allow(unsafe_code)]

use std::ptr;

/// Bring a value to life in an uninitialised slot.
///
/// # Safety
///
/// `slot` must be valid for writes and must not hold a live value.
#[inline]
pub(crate) unsafe fn construct_at<T>(slot: *mut T, value: T) {
    // SAFETY: caller guarantees the slot is raw and writable.
    unsafe { ptr::write(slot, value) }
}

/// End the lifetimes of `n` consecutive live values starting at `start`.
/// Single-slot destruction is the `n == 1` case.
///
/// # Safety
///
/// All `n` slots must hold live values; afterwards they are raw.
#[inline]
pub(crate) unsafe fn destroy_range<T>(start: *mut T, n: usize) {
    // SAFETY: caller guarantees the whole range is live.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, n)) }
}

/// Move `n` values from `from` to `to`; the ranges may overlap.
///
/// Source slots become raw, destination slots become live. A bitwise
/// move cannot fail, so relocation never tears.
///
/// # Safety
///
/// `from..from+n` must be live and readable, `to..to+n` writable; the
/// caller must stop treating the vacated source slots as live.
#[inline]
pub(crate) unsafe fn relocate<T>(from: *const T, to: *mut T, n: usize) {
    // SAFETY: caller guarantees validity of both ranges; `ptr::copy`
    // handles overlap.
    unsafe { ptr::copy(from, to, n) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::mem::MaybeUninit;
    use std::rc::Rc;

    /// Counts how many clones of itself are alive.
    struct Tracked(Rc<Cell<usize>>);

    impl Tracked {
        fn new(counter: &Rc<Cell<usize>>) -> Self {
            counter.set(counter.get() + 1);
            Tracked(Rc::clone(counter))
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() - 1);
        }
    }

    #[test]
    fn construct_then_destroy_balances() {
        let live = Rc::new(Cell::new(0usize));
        let mut slot = MaybeUninit::<Tracked>::uninit();
        // SAFETY: the slot is raw; after the write it is live; after the
        // drop it is raw again and never touched.
        unsafe {
            construct_at(slot.as_mut_ptr(), Tracked::new(&live));
            assert_eq!(live.get(), 1);
            destroy_range(slot.as_mut_ptr(), 1);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn destroy_range_drops_every_slot() {
        let live = Rc::new(Cell::new(0usize));
        let mut slots: [MaybeUninit<Tracked>; 4] = [
            MaybeUninit::uninit(),
            MaybeUninit::uninit(),
            MaybeUninit::uninit(),
            MaybeUninit::uninit(),
        ];
        // SAFETY: each slot is constructed exactly once, then the whole
        // range is destroyed exactly once.
        unsafe {
            for slot in &mut slots {
                construct_at(slot.as_mut_ptr(), Tracked::new(&live));
            }
            assert_eq!(live.get(), 4);
            destroy_range(slots.as_mut_ptr().cast::<Tracked>(), 4);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn relocate_moves_without_drop() {
        let mut slots: [MaybeUninit<String>; 4] = [
            MaybeUninit::new("a".into()),
            MaybeUninit::new("b".into()),
            MaybeUninit::new("c".into()),
            MaybeUninit::uninit(),
        ];
        let base = slots.as_mut_ptr().cast::<String>();
        // SAFETY: shifts the three live values right by one (overlapping);
        // slot 0 becomes raw, slots 1..4 live.
        unsafe {
            relocate(base, base.add(1), 3);
            assert_eq!(*base.add(1), "a");
            assert_eq!(*base.add(3), "c");
            destroy_range(base.add(1), 3);
        }
    }
}
