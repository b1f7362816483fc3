//! Consuming iteration over a [`DynArray`](crate::DynArray).

#![allow(unsafe_code)]

use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

use loam_alloc::RawAlloc;

use crate::array::DynArray;
use crate::lifecycle;
use crate::raw::RawBuf;

/// An iterator that moves elements out of a [`DynArray`].
///
/// Takes ownership of the array's buffer; elements not consumed by the
/// time the iterator is dropped are destroyed, and the buffer is
/// released back to the allocator.
pub struct IntoIter<T, A: RawAlloc> {
    buf: RawBuf<T, A>,
    /// Index of the next front element. Slots `[start, end)` are live.
    start: usize,
    /// One past the last live element.
    end: usize,
}

impl<T, A: RawAlloc> IntoIter<T, A> {
    /// Remaining elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots [start, end) are live.
        unsafe { slice::from_raw_parts(self.buf.ptr().as_ptr().add(self.start), self.end - self.start) }
    }
}

impl<T, A: RawAlloc> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let slot = self.start;
        self.start += 1;
        // SAFETY: slot was live and is now excluded from [start, end).
        Some(unsafe { ptr::read(self.buf.ptr().as_ptr().add(slot)) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.start;
        (remaining, Some(remaining))
    }
}

impl<T, A: RawAlloc> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // SAFETY: slot `end` was the last live element; now excluded.
        Some(unsafe { ptr::read(self.buf.ptr().as_ptr().add(self.end)) })
    }
}

impl<T, A: RawAlloc> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: RawAlloc> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // SAFETY: the unconsumed slots [start, end) are live; the buffer
        // itself is released by RawBuf's Drop.
        unsafe {
            lifecycle::destroy_range(
                self.buf.ptr().as_ptr().add(self.start),
                self.end - self.start,
            );
        }
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, A: RawAlloc> IntoIterator for DynArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the buffer gains exactly one
        // new owner; the live range [0, len) transfers to the iterator.
        let (buf, len) = unsafe { this.disassemble() };
        IntoIter {
            buf,
            start: 0,
            end: len,
        }
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.as_slice().iter()
    }
}

impl<'a, T, A: RawAlloc> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.as_mut_slice().iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use crate::array::DynArray;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn into_iter_yields_in_order() {
        let arr: DynArray<i32> = crate::array![1, 2, 3];
        let collected: Vec<i32> = arr.into_iter().collect();
        assert_eq!(collected, [1, 2, 3]);
    }

    #[test]
    fn into_iter_from_both_ends() {
        let arr: DynArray<i32> = crate::array![1, 2, 3, 4];
        let mut iter = arr.into_iter();
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.as_slice(), [2, 3]);
    }

    #[test]
    fn dropping_the_iterator_destroys_unconsumed_elements() {
        let live = Rc::new(Cell::new(0usize));
        struct Tracked(Rc<Cell<usize>>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() - 1);
            }
        }

        let mut arr = DynArray::new();
        for _ in 0..5 {
            live.set(live.get() + 1);
            arr.push(Tracked(Rc::clone(&live)));
        }
        let mut iter = arr.into_iter();
        drop(iter.next());
        drop(iter.next());
        assert_eq!(live.get(), 3);
        drop(iter);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn borrowed_iteration() {
        let mut arr: DynArray<i32> = crate::array![1, 2, 3];
        let sum: i32 = (&arr).into_iter().sum();
        assert_eq!(sum, 6);
        for v in &mut arr {
            *v *= 10;
        }
        assert_eq!(arr.as_slice(), [10, 20, 30]);
    }
}
