//! The sequence type and its operations.
//!
//! [`DynArray`] composes the storage manager (`RawBuf`) with the
//! element-lifecycle primitives (`lifecycle`). `len` counts the live
//! prefix; slots `[len, capacity)` are raw storage. Every mutating
//! operation keeps `len` consistent with what is actually constructed,
//! including across panics from user element types.

#![allow(unsafe_code)]

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut, Range};
use std::ptr;
use std::slice::{self, SliceIndex};

use loam_alloc::{Heap, RawAlloc};

use crate::error::ArrayError;
use crate::lifecycle;
use crate::raw::RawBuf;

/// Growth failures on the panicking API surface funnel through here so
/// the hot paths stay small.
#[cold]
#[inline(never)]
fn capacity_overflow(err: ArrayError) -> ! {
    panic!("{err}");
}

/// A contiguous growable array parameterized over its allocator.
///
/// `DynArray<T, A>` owns one block of raw storage from `A` and tracks
/// two counts: `capacity` (allocated slots) and `len` (live, constructed
/// elements in `[0, len)`). Appends are amortized O(1) via doubling
/// growth; relocation during growth is a bitwise move, so growing never
/// tears elements and failed growth leaves the array untouched.
///
/// Single-threaded by design: no internal locking, no deferred work.
/// Shared `&DynArray` access is safe; any concurrent mutation is ruled
/// out by the borrow checker like any other `&mut` structure.
///
/// # Examples
///
/// ```
/// use loam::DynArray;
///
/// let mut arr = DynArray::new();
/// arr.push(1);
/// arr.push(2);
/// arr.push(3);
/// assert_eq!(arr.as_slice(), [1, 2, 3]);
/// assert!(arr.capacity() >= 3);
/// ```
pub struct DynArray<T, A: RawAlloc = Heap> {
    buf: RawBuf<T, A>,
    /// Live element count. Slots `[0, len)` are constructed.
    len: usize,
}

impl<T> DynArray<T> {
    /// Empty array on the system heap. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(Heap)
    }

    /// Array with at least `capacity` slots pre-allocated on the heap.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds the allocator's limit.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Heap)
    }

    /// Array holding `len` clones of `value`.
    pub fn from_elem(len: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(len, value, Heap)
    }
}

impl<T, A: RawAlloc> DynArray<T, A> {
    /// Empty array using `alloc`. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: RawBuf::new_in(alloc),
            len: 0,
        }
    }

    /// Array with at least `capacity` slots from `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds the allocator's limit.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        match Self::try_with_capacity_in(capacity, alloc) {
            Ok(arr) => arr,
            Err(err) => capacity_overflow(err),
        }
    }

    /// Fallible form of [`with_capacity_in`](DynArray::with_capacity_in).
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, ArrayError> {
        Ok(Self {
            buf: RawBuf::try_with_capacity_in(capacity, alloc)?,
            len: 0,
        })
    }

    /// Array holding `len` clones of `value`, allocated from `alloc`.
    pub fn from_elem_in(len: usize, value: T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut arr = Self::with_capacity_in(len, alloc);
        arr.extend_with(len, value);
        arr
    }

    /// Live element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no live elements exist.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slot count. Always `>= len()`.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The allocator this array draws storage from.
    pub fn allocator(&self) -> &A {
        self.buf.alloc()
    }

    /// The live elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots [0, len) are live.
        unsafe { slice::from_raw_parts(self.buf.ptr().as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: slots [0, len) are live and exclusively borrowed.
        unsafe { slice::from_raw_parts_mut(self.buf.ptr().as_ptr(), self.len) }
    }

    /// Checked element access.
    ///
    /// Returns [`ArrayError::IndexOutOfRange`] iff `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, ArrayError> {
        self.as_slice().get(index).ok_or(ArrayError::IndexOutOfRange {
            index,
            len: self.len,
        })
    }

    /// Checked mutable element access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(ArrayError::IndexOutOfRange { index, len })
    }

    /// First live element, if any.
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// First live element, mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// Last live element, if any.
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Last live element, mutably.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Append an element. Amortized O(1).
    ///
    /// # Panics
    ///
    /// Panics if growth would exceed the allocator's limit.
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            capacity_overflow(err)
        }
    }

    /// Fallible append. On error the array is unchanged and `value` is
    /// dropped.
    pub fn try_push(&mut self, value: T) -> Result<(), ArrayError> {
        self.buf.grow_amortized(self.len, 1)?;
        // SAFETY: capacity > len after the reserve; slot `len` is raw.
        unsafe { lifecycle::construct_at(self.buf.ptr().as_ptr().add(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Append the value produced by `f`, constructing it only after
    /// storage is secured. A panicking `f` leaves the array unchanged.
    ///
    /// # Panics
    ///
    /// Panics if growth would exceed the allocator's limit.
    pub fn push_with(&mut self, f: impl FnOnce() -> T) {
        if let Err(err) = self.buf.grow_amortized(self.len, 1) {
            capacity_overflow(err)
        }
        // SAFETY: capacity > len after the reserve; slot `len` is raw.
        unsafe { lifecycle::construct_at(self.buf.ptr().as_ptr().add(self.len), f()) };
        self.len += 1;
    }

    /// Remove and return the last element. Never reallocates.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` held the last live element; `len` now
        // excludes it, so ownership moves to the caller.
        Some(unsafe { ptr::read(self.buf.ptr().as_ptr().add(self.len)) })
    }

    /// Insert `value` at `index`, shifting the tail right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or growth exceeds the allocator's limit.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(
            index <= self.len,
            "insert index {index} out of bounds (len {})",
            self.len
        );
        if let Err(err) = self.try_insert(index, value) {
            capacity_overflow(err)
        }
    }

    /// Fallible insert: reports both bad positions and growth failure as
    /// errors. On error the array is unchanged and `value` is dropped.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), ArrayError> {
        if index > self.len {
            return Err(ArrayError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.buf.grow_amortized(self.len, 1)?;
        let base = self.buf.ptr().as_ptr();
        // SAFETY: slot `len` is raw after the reserve; shifting the tail
        // right by one vacates slot `index`, which the write fills.
        unsafe {
            lifecycle::relocate(base.add(index), base.add(index + 1), self.len - index);
            lifecycle::construct_at(base.add(index), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Insert `count` clones of `value` at `index`.
    ///
    /// A panicking clone closes the gap over the slots filled so far and
    /// keeps the array valid (basic guarantee); the elements already
    /// cloned stay in place.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or growth exceeds the allocator's limit.
    pub fn insert_n(&mut self, index: usize, count: usize, value: T)
    where
        T: Clone,
    {
        assert!(
            index <= self.len,
            "insert index {index} out of bounds (len {})",
            self.len
        );
        if count == 0 {
            return;
        }
        if let Err(err) = self.buf.grow_amortized(self.len, count) {
            capacity_overflow(err)
        }
        let tail = self.len - index;
        let base = self.buf.ptr().as_ptr();
        // While the gap is open, `len` covers only the live prefix. The
        // guard closes the gap over however many slots were filled, on
        // both the normal and the unwind path.
        self.len = index;
        let mut guard = GapGuard {
            base,
            index,
            filled: 0,
            count,
            tail,
            len: &mut self.len,
        };
        // SAFETY: the reserve guarantees `index + count + tail` slots;
        // relocating the tail vacates [index, index + count), which the
        // clone loop fills front to back.
        unsafe {
            lifecycle::relocate(base.add(index), base.add(index + count), tail);
            for _ in 1..count {
                lifecycle::construct_at(base.add(index + guard.filled), value.clone());
                guard.filled += 1;
            }
            lifecycle::construct_at(base.add(index + guard.filled), value);
            guard.filled += 1;
        }
    }

    /// Remove and return the element at `index`, shifting the tail left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "remove index {index} out of bounds (len {})",
            self.len
        );
        let base = self.buf.ptr().as_ptr();
        // SAFETY: index < len, so the slot is live; after the read it is
        // raw, and the tail shifts left over it.
        unsafe {
            let value = ptr::read(base.add(index));
            lifecycle::relocate(base.add(index + 1), base.add(index), self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Destroy the elements in `range` and close the gap.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or ends past `len()`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        let Range { start, end } = range;
        assert!(
            start <= end && end <= self.len,
            "remove range {start}..{end} out of bounds (len {})",
            self.len
        );
        if start == end {
            return;
        }
        let tail = self.len - end;
        let base = self.buf.ptr().as_ptr();
        // Dead slots must not be covered by `len` if an element drop
        // panics mid-range; the tail leaks in that case but stays valid.
        self.len = start;
        // SAFETY: [start, end) is live and now untracked; the tail at
        // [end, end + tail) relocates down to follow the prefix.
        unsafe {
            lifecycle::destroy_range(base.add(start), end - start);
            lifecycle::relocate(base.add(end), base.add(start), tail);
        }
        self.len = start + tail;
    }

    /// Shrink or grow to `new_len`, filling new slots with clones of
    /// `value`.
    ///
    /// # Panics
    ///
    /// Panics if growth would exceed the allocator's limit.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
        } else {
            self.extend_with(new_len - self.len, value);
        }
    }

    /// Shrink or grow to `new_len`, filling new slots from `f`.
    ///
    /// `len` tracks each successful construction, so a panicking `f`
    /// leaves a consistent prefix.
    ///
    /// # Panics
    ///
    /// Panics if growth would exceed the allocator's limit.
    pub fn resize_with(&mut self, new_len: usize, mut f: impl FnMut() -> T) {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        if let Err(err) = self.buf.grow_amortized(self.len, new_len - self.len) {
            capacity_overflow(err)
        }
        let base = self.buf.ptr().as_ptr();
        while self.len < new_len {
            // SAFETY: len < new_len <= capacity; slot `len` is raw.
            unsafe { lifecycle::construct_at(base.add(self.len), f()) };
            self.len += 1;
        }
    }

    /// Destroy the elements at `[new_len, len)`. No-op if `new_len >= len`.
    /// Capacity is retained.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let removed = self.len - new_len;
        // Shrink len first so a panicking element drop cannot lead to a
        // double-destroy when the array itself is dropped.
        self.len = new_len;
        // SAFETY: the removed suffix was live and is no longer tracked.
        unsafe { lifecycle::destroy_range(self.buf.ptr().as_ptr().add(new_len), removed) };
    }

    /// Destroy all live elements. Capacity is retained.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Discard current contents and refill with `len` clones of `value`,
    /// reusing existing capacity when sufficient.
    pub fn assign_fill(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.extend_with(len, value);
    }

    /// Discard current contents and refill from a slice.
    pub fn assign_from_slice(&mut self, source: &[T])
    where
        T: Clone,
    {
        self.clear();
        self.extend_from_slice(source);
    }

    /// Discard current contents and refill from an iterator.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, source: I) {
        self.clear();
        self.extend(source);
    }

    /// Append clones of every element of `other`.
    ///
    /// # Panics
    ///
    /// Panics if growth would exceed the allocator's limit.
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        if let Err(err) = self.buf.grow_amortized(self.len, other.len()) {
            capacity_overflow(err)
        }
        let base = self.buf.ptr().as_ptr();
        for item in other {
            // SAFETY: the reserve covered other.len() more slots; `len`
            // tracks each construction so a panicking clone leaves a
            // consistent prefix.
            unsafe { lifecycle::construct_at(base.add(self.len), item.clone()) };
            self.len += 1;
        }
    }

    /// Ensure capacity for at least `min_capacity` slots. Never shrinks.
    /// On failure the array is unchanged (strong guarantee).
    ///
    /// # Panics
    ///
    /// Panics if `min_capacity` exceeds the allocator's limit.
    pub fn reserve(&mut self, min_capacity: usize) {
        if let Err(err) = self.try_reserve(min_capacity) {
            capacity_overflow(err)
        }
    }

    /// Fallible form of [`reserve`](DynArray::reserve).
    pub fn try_reserve(&mut self, min_capacity: usize) -> Result<(), ArrayError> {
        self.buf.grow_to(min_capacity, self.len)
    }

    /// Best-effort request to drop excess capacity. May no-op; never
    /// fails for allocation reasons.
    pub fn shrink_to_fit(&mut self) {
        self.buf.shrink_to(self.len);
    }

    /// O(1) exchange of contents with `other`.
    ///
    /// Consults the allocator's propagation policy: the buffers (and
    /// allocators) swap if the policy permits swap propagation or the two
    /// allocators share a pool; otherwise
    /// [`ArrayError::AllocatorMismatch`] is returned and both arrays are
    /// unchanged.
    pub fn swap_with(&mut self, other: &mut Self) -> Result<(), ArrayError> {
        if A::PROPAGATION.on_swap || self.buf.alloc().shares_pool(other.buf.alloc()) {
            mem::swap(self, other);
            Ok(())
        } else {
            Err(ArrayError::AllocatorMismatch)
        }
    }

    /// Move the contents out, leaving `self` empty with no allocation.
    ///
    /// The buffer travels with the returned array (allocators move with
    /// their allocations); `self` keeps a clone of the allocator so it
    /// remains fully usable.
    pub fn take(&mut self) -> Self
    where
        A: Clone,
    {
        let alloc = self.buf.alloc().clone();
        mem::replace(self, Self::new_in(alloc))
    }

    /// Hand the buffer and live count to the consuming iterator.
    ///
    /// # Safety
    ///
    /// The caller must suppress `self`'s destructor; afterwards `self`
    /// must never be used again.
    pub(crate) unsafe fn disassemble(&self) -> (RawBuf<T, A>, usize) {
        // SAFETY: caller promises this is the buffer's final owner.
        (unsafe { ptr::read(&self.buf) }, self.len)
    }

    /// Append `additional` clones of `value` (the last slot takes `value`
    /// itself).
    fn extend_with(&mut self, additional: usize, value: T)
    where
        T: Clone,
    {
        if additional == 0 {
            return;
        }
        if let Err(err) = self.buf.grow_amortized(self.len, additional) {
            capacity_overflow(err)
        }
        let base = self.buf.ptr().as_ptr();
        // SAFETY: the reserve covered `additional` slots; `len` tracks
        // each construction for panic consistency.
        unsafe {
            for _ in 1..additional {
                lifecycle::construct_at(base.add(self.len), value.clone());
                self.len += 1;
            }
            lifecycle::construct_at(base.add(self.len), value);
            self.len += 1;
        }
    }
}

/// Closes a partially filled insertion gap, on success and on unwind.
///
/// Layout while the guard is live: `[0, index)` live prefix,
/// `[index, index + filled)` newly constructed, `[index + filled,
/// index + count)` raw gap, `[index + count, index + count + tail)` the
/// relocated tail. `len` is parked at `index` so no raw slot is ever
/// covered by it.
struct GapGuard<'a, T> {
    base: *mut T,
    index: usize,
    filled: usize,
    count: usize,
    tail: usize,
    len: &'a mut usize,
}

impl<T> Drop for GapGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: moves the tail down over the unfilled gap slots; when
        // filled == count this is a same-place copy. Afterwards
        // [0, index + filled + tail) is exactly the live range.
        unsafe {
            ptr::copy(
                self.base.add(self.index + self.count),
                self.base.add(self.index + self.filled),
                self.tail,
            );
        }
        *self.len = self.index + self.filled + self.tail;
    }
}

/// Symmetric wrapper over [`DynArray::swap_with`].
pub fn swap<T, A: RawAlloc>(
    a: &mut DynArray<T, A>,
    b: &mut DynArray<T, A>,
) -> Result<(), ArrayError> {
    a.swap_with(b)
}

impl<T, A: RawAlloc> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        // SAFETY: [0, len) is live; the buffer itself is released by
        // RawBuf's Drop, which runs after this.
        unsafe { lifecycle::destroy_range(self.buf.ptr().as_ptr(), self.len) };
    }
}

impl<T, A: RawAlloc> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: RawAlloc> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: RawAlloc, I: SliceIndex<[T]>> Index<I> for DynArray<T, A> {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, A: RawAlloc, I: SliceIndex<[T]>> IndexMut<I> for DynArray<T, A> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T, A: RawAlloc + Default> Default for DynArray<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, A: RawAlloc + Clone> Clone for DynArray<T, A> {
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.buf.alloc().clone());
        out.extend_from_slice(self);
        out
    }

    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATION.on_clone && !self.buf.alloc().shares_pool(source.buf.alloc()) {
            // Adopting the source's allocator means existing storage
            // cannot be kept.
            *self = source.clone();
            return;
        }
        self.clear();
        self.extend_from_slice(source);
    }
}

impl<T, A: RawAlloc> Extend<T> for DynArray<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            if let Err(err) = self.buf.grow_amortized(self.len, lower) {
                capacity_overflow(err)
            }
        }
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for DynArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arr = Self::new();
        arr.extend(iter);
        arr
    }
}

impl<T: Clone> From<&[T]> for DynArray<T> {
    fn from(slice: &[T]) -> Self {
        let mut arr = Self::with_capacity(slice.len());
        arr.extend_from_slice(slice);
        arr
    }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T> {
    fn from(values: [T; N]) -> Self {
        let mut arr = Self::with_capacity(N);
        arr.extend(values);
        arr
    }
}

impl<T: fmt::Debug, A: RawAlloc> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T, U, A1, A2> PartialEq<DynArray<U, A2>> for DynArray<T, A1>
where
    T: PartialEq<U>,
    A1: RawAlloc,
    A2: RawAlloc,
{
    fn eq(&self, other: &DynArray<U, A2>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, A: RawAlloc> PartialEq<[U]> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, A: RawAlloc> PartialEq<&[U]> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, A: RawAlloc, const N: usize> PartialEq<[U; N]> for DynArray<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, A: RawAlloc> Eq for DynArray<T, A> {}

impl<T: Hash, A: RawAlloc> Hash for DynArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}
