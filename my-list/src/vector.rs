// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A contiguous growable array whose buffer is allocated through a pluggable allocator.

use core::cmp::{self, Ordering};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::mem::{self, ManuallyDrop};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use core::slice;

use allocator_api2::alloc::{Allocator, Global};
use log::{debug, trace};

use crate::error::{handle_alloc_failure, AllocError, OutOfRange};
use crate::memory::{AllocTraits, CompressedPair, TypedAlloc};
use crate::traits::AllocPolicy;

/// The buffer of a [`MyVector`]: a pointer to `cap` slots, the first `len` of which are initialized.
struct RawParts<T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
}

impl<T> RawParts<T> {
    const EMPTY: Self = Self {
        ptr: NonNull::dangling(),
        len: 0,
        cap: 0,
    };
}

/// A contiguous growable array that allocates its buffer from the allocator `A`.
///
/// The buffer grows by doubling its capacity.
/// Every reallocation is strong: a new buffer is obtained first, then the elements are moved over
/// bitwise, and only then the old buffer is released.
/// If the new buffer cannot be obtained, the vector stays as it was.
///
/// Copying, moving, and swapping vectors follows the [`AllocPolicy`] of `A` in the same way as
/// for [`MyList`](crate::list::MyList).
pub struct MyVector<T, A: Allocator + AllocPolicy = Global> {
    imp: CompressedPair<TypedAlloc<T, A>, RawParts<T>>,
}

unsafe impl<T: Send, A: Allocator + AllocPolicy + Send> Send for MyVector<T, A> {}
unsafe impl<T: Sync, A: Allocator + AllocPolicy + Sync> Sync for MyVector<T, A> {}

impl<T> MyVector<T> {
    /// Creates an empty vector that uses the global allocator.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A> MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Smallest capacity of a non-empty buffer.
    const MIN_NON_ZERO_CAP: usize = if mem::size_of::<T>() == 1 {
        8
    } else if mem::size_of::<T>() <= 1024 {
        4
    } else {
        1
    };

    /// Creates an empty vector that uses `alloc`.
    ///
    /// This doesn't allocate anything.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            imp: CompressedPair::new(TypedAlloc::new(alloc), RawParts::EMPTY),
        }
    }

    /// Creates an empty vector with room for at least `capacity` elements.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::try_with_capacity_in(capacity, alloc)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Creates an empty vector with room for at least `capacity` elements, or returns an error if
    /// the buffer cannot be allocated.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        let mut vector = Self::new_in(alloc);
        vector.try_reserve(capacity)?;
        Ok(vector)
    }

    /// Creates a vector of `len` copies of `value`.
    pub fn from_elem_in(len: usize, value: &T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut vector = Self::with_capacity_in(len, alloc);
        vector.resize_with(len, || value.clone());
        vector
    }

    /// Creates a vector from the elements of `iter`.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut vector = Self::new_in(alloc);
        vector.extend(iter);
        vector
    }

    /// Returns a deep copy of the vector that uses `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut vector = Self::with_capacity_in(self.len(), alloc);
        vector.extend_from_slice(self);
        vector
    }

    /// Returns a reference to the allocator of the vector.
    pub fn allocator(&self) -> &A {
        self.imp.first().inner()
    }

    /// Returns a raw pointer to the buffer.
    pub fn as_ptr(&self) -> *const T {
        self.imp.second().ptr.as_ptr()
    }

    /// Returns a raw mutable pointer to the buffer.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.imp.second().ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.len()) }
    }

    /// Replaces the contents of the vector with the elements of `iter`.
    ///
    /// Existing elements are assigned in place. The buffer only grows if `iter` yields more
    /// elements than the vector currently holds.
    pub fn assign<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter();

        for index in 0..self.len() {
            match iter.next() {
                Some(value) => self.as_mut_slice()[index] = value,
                None => {
                    self.truncate(index);
                    return;
                }
            }
        }

        self.extend(iter);
    }

    /// Returns a reference to the element at `index`, or an [`OutOfRange`] error.
    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        let len = self.len();
        self.get(index).ok_or(OutOfRange { index, len })
    }

    /// Returns a mutable reference to the element at `index`, or an [`OutOfRange`] error.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        let len = self.len();
        self.get_mut(index).ok_or(OutOfRange { index, len })
    }

    /// Provides a reference to the last element, or `None` if the vector is empty.
    pub fn back(&self) -> Option<&T> {
        self.last()
    }

    /// Returns the number of elements the vector can hold without reallocating.
    pub fn capacity(&self) -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            self.imp.second().cap
        }
    }

    /// Removes all elements, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Removes consecutive duplicate elements.
    pub fn dedup(&mut self)
    where
        T: PartialEq,
    {
        self.dedup_by(|a, b| a == b)
    }

    /// Removes all but the first of consecutive elements that `same` considers equal.
    ///
    /// `same` is called with the most recently retained element first and its successor second.
    /// If `same` panics, the vector keeps all elements that haven't been removed yet.
    pub fn dedup_by<F>(&mut self, mut same: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let len = self.len();
        if len < 2 {
            return;
        }

        let mut compactor = Compactor::new(self, 1);

        while compactor.read < len {
            unsafe {
                let current = compactor.base.add(compactor.read);
                let kept = compactor.base.add(compactor.write - 1);

                if same(&*kept, &*current) {
                    compactor.read += 1;
                    ptr::drop_in_place(current);
                } else {
                    compactor.keep(current);
                }
            }
        }
    }

    /// Appends clones of all elements of `other`.
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        self.reserve(other.len());

        for element in other {
            // The length is raised with every element, so a panicking `clone` leaves no hole.
            unsafe { self.push_unchecked(element.clone()) };
        }
    }

    /// Provides a reference to the first element, or `None` if the vector is empty.
    pub fn front(&self) -> Option<&T> {
        self.first()
    }

    /// Inserts `value` at `index`, shifting all elements behind it to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );

        self.reserve(1);

        unsafe {
            let slot = self.as_mut_ptr().add(index);
            ptr::copy(slot, slot.add(1), len - index);
            ptr::write(slot, value);
            self.set_len(len + 1);
        }
    }

    /// Returns `true` if the vector contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.imp.second().len
    }

    /// Returns the largest number of elements the allocator could theoretically provide a buffer
    /// for.
    pub fn max_size(&self) -> usize {
        self.imp.first().max_size()
    }

    /// Replaces the contents of the vector with those of `other`, which is consumed.
    ///
    /// * If the allocator propagates on move assignment, `self` takes over the allocator and the
    ///   buffer of `other`.
    /// * If both allocators compare equal, `self` takes over the buffer of `other`.
    /// * Otherwise, `self` keeps its allocator and buffer, and every element is moved over.
    pub fn move_assign(&mut self, mut other: Self) {
        if A::PROPAGATE_ON_MOVE_ASSIGNMENT {
            *self = other;
        } else if self.allocator().alloc_eq(other.allocator()) {
            // `other` releases our old buffer when it goes out of scope.
            self.clear();
            mem::swap(self.imp.second_mut(), other.imp.second_mut());
        } else {
            debug!(
                "Allocators compare unequal, move-assigning {} vector elements one by one",
                other.len()
            );
            self.assign(other);
        }
    }

    /// Removes the last element and returns it, or `None` if the vector is empty.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        unsafe {
            self.set_len(len - 1);
            Some(ptr::read(self.as_ptr().add(len - 1)))
        }
    }

    /// Appends an element.
    ///
    /// This operation computes in amortized *O*(*1*) time.
    pub fn push(&mut self, value: T) {
        self.try_push(value)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Removes the element at `index` and returns it, shifting all elements behind it to the left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(
            index < len,
            "removal index (is {index}) should be < len (is {len})"
        );

        unsafe {
            let slot = self.as_mut_ptr().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, len - index - 1);
            self.set_len(len - 1);
            value
        }
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.try_reserve(additional)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Resizes the vector to `new_len` elements, appending clones of `value` or dropping elements
    /// from the back as necessary.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone())
    }

    /// Resizes the vector to `new_len` elements, appending values returned by `f` or dropping
    /// elements from the back as necessary.
    ///
    /// If `f` panics, the vector keeps the elements appended so far.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        let len = self.len();
        trace!("Resizing vector from {} to {} elements", len, new_len);

        if new_len <= len {
            self.truncate(new_len);
        } else {
            self.reserve(new_len - len);
            for _ in len..new_len {
                unsafe { self.push_unchecked(f()) };
            }
        }
    }

    /// Retains only the elements specified by the predicate, preserving their order.
    ///
    /// If `f` panics, the vector keeps all elements that haven't been removed yet.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let len = self.len();
        let mut compactor = Compactor::new(self, 0);

        while compactor.read < len {
            unsafe {
                let current = compactor.base.add(compactor.read);

                if f(&*current) {
                    compactor.keep(current);
                } else {
                    compactor.read += 1;
                    ptr::drop_in_place(current);
                }
            }
        }
    }

    /// Shrinks the capacity as much as possible.
    ///
    /// If the smaller buffer cannot be obtained, the vector keeps its current buffer.
    pub fn shrink_to_fit(&mut self) {
        let len = self.len();
        if self.imp.second().cap <= len {
            return;
        }

        if len == 0 {
            self.release_buffer();
        } else if let Err(err) = self.reallocate(len) {
            debug!("Keeping the vector capacity, because shrinking failed: {}", err);
        }
    }

    /// Exchanges the contents of two vectors.
    ///
    /// Allocators are exchanged as well if they propagate on swap.
    ///
    /// # Panics
    ///
    /// Panics if the allocators don't propagate on swap and compare unequal.
    pub fn swap(&mut self, other: &mut Self) {
        if !A::PROPAGATE_ON_SWAP {
            assert!(
                self.allocator().alloc_eq(other.allocator()),
                "cannot swap vectors whose allocators compare unequal"
            );
        }

        A::do_swap(
            self.imp.first_mut().inner_mut(),
            other.imp.first_mut().inner_mut(),
        );
        mem::swap(self.imp.second_mut(), other.imp.second_mut());
    }

    /// Removes the element at `index` and returns it, replacing it with the last element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(
            index < len,
            "swap_remove index (is {index}) should be < len (is {len})"
        );

        unsafe {
            let base = self.as_mut_ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(len - 1), base.add(index), 1);
            self.set_len(len - 1);
            value
        }
    }

    /// Shortens the vector to `len` elements, dropping the rest.
    ///
    /// Does nothing if the vector is not longer than `len`.
    pub fn truncate(&mut self, len: usize) {
        let old_len = self.len();
        if len >= old_len {
            return;
        }

        unsafe {
            // Shorten first, so that a panicking destructor can't lead to a double drop.
            self.set_len(len);
            let tail = ptr::slice_from_raw_parts_mut(self.as_mut_ptr().add(len), old_len - len);
            ptr::drop_in_place(tail);
        }
    }

    /// Appends an element, or returns an error if the buffer needs to grow and can't.
    ///
    /// On error, the vector is unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), AllocError> {
        if self.len() == self.capacity() {
            self.grow_amortized(1)?;
        }

        unsafe { self.push_unchecked(value) };
        Ok(())
    }

    /// Reserves capacity for at least `additional` more elements, or returns an error if the
    /// buffer cannot be grown.
    ///
    /// On error, the vector is unchanged.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        if self.capacity() - self.len() >= additional {
            return Ok(());
        }

        self.grow_amortized(additional)
    }

    /// Grows the buffer to fit at least `additional` more elements, doubling the capacity if that
    /// is more.
    fn grow_amortized(&mut self, additional: usize) -> Result<(), AllocError> {
        let required = self
            .len()
            .checked_add(additional)
            .ok_or(AllocError::CapacityOverflow)?;
        let doubled = self.imp.second().cap.saturating_mul(2);
        let new_cap = cmp::max(cmp::max(doubled, required), Self::MIN_NON_ZERO_CAP);

        self.reallocate(new_cap)
    }

    /// Moves all elements into a new buffer of `new_cap` slots and releases the old one.
    fn reallocate(&mut self, new_cap: usize) -> Result<(), AllocError> {
        let (typed, parts) = self.imp.both_mut();
        trace!(
            "Reallocating vector buffer from {} to {} elements",
            parts.cap,
            new_cap
        );

        let new_ptr = typed.allocate(new_cap)?;

        unsafe {
            ptr::copy_nonoverlapping(parts.ptr.as_ptr(), new_ptr.as_ptr(), parts.len);
            if parts.cap != 0 {
                typed.deallocate(parts.ptr, parts.cap);
            }
        }

        parts.ptr = new_ptr;
        parts.cap = new_cap;
        Ok(())
    }

    /// Releases the buffer of an empty vector.
    fn release_buffer(&mut self) {
        let (typed, parts) = self.imp.both_mut();
        debug_assert_eq!(parts.len, 0);

        if parts.cap != 0 {
            unsafe { typed.deallocate(parts.ptr, parts.cap) };
        }

        *parts = RawParts::EMPTY;
    }

    /// Writes `value` behind the last element.
    ///
    /// # Safety
    ///
    /// The capacity must exceed the length.
    unsafe fn push_unchecked(&mut self, value: T) {
        let len = self.len();
        debug_assert!(len < self.capacity());

        ptr::write(self.as_mut_ptr().add(len), value);
        self.set_len(len + 1);
    }

    unsafe fn set_len(&mut self, len: usize) {
        self.imp.second_mut().len = len;
    }
}

/// Closes the gaps left by removed elements while [`MyVector::retain`] and [`MyVector::dedup_by`]
/// traverse the vector.
///
/// The vector appears empty during the traversal.
/// When the compactor is dropped, even by a panic, the unvisited elements are moved down behind
/// the kept ones and the length is restored.
struct Compactor<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    vector: &'a mut MyVector<T, A>,
    base: *mut T,
    len: usize,
    read: usize,
    write: usize,
}

impl<'a, T, A> Compactor<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Starts compacting `vector`, with the first `start` elements already kept.
    fn new(vector: &'a mut MyVector<T, A>, start: usize) -> Self {
        let len = vector.len();
        let base = vector.as_mut_ptr();
        unsafe { vector.set_len(0) };

        Self {
            vector,
            base,
            len,
            read: start,
            write: start,
        }
    }

    /// Keeps the element at `current`, which is the read position.
    unsafe fn keep(&mut self, current: *mut T) {
        if self.read != self.write {
            ptr::copy_nonoverlapping(current, self.base.add(self.write), 1);
        }

        self.read += 1;
        self.write += 1;
    }
}

impl<'a, T, A> Drop for Compactor<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        let remaining = self.len - self.read;

        unsafe {
            if self.read != self.write {
                ptr::copy(self.base.add(self.read), self.base.add(self.write), remaining);
            }

            self.vector.set_len(self.write + remaining);
        }
    }
}

impl<T, A> Clone for MyVector<T, A>
where
    T: Clone,
    A: Allocator + AllocPolicy + Clone,
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().select_on_container_copy_construction())
    }

    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_COPY_ASSIGNMENT && !self.allocator().alloc_eq(source.allocator()) {
            // Our buffer belongs to the old allocator.
            self.clear();
            self.release_buffer();
        }

        A::do_copy(self.imp.first_mut().inner_mut(), source.allocator());

        self.truncate(source.len());
        let (init, tail) = source.split_at(self.len());
        self.clone_from_slice(init);
        self.extend_from_slice(tail);
    }
}

impl<T, A> fmt::Debug for MyVector<T, A>
where
    T: fmt::Debug,
    A: Allocator + AllocPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T, A> Default for MyVector<T, A>
where
    A: Allocator + AllocPolicy + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A> Deref for MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A> DerefMut for MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A> Drop for MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        self.clear();
        self.release_buffer();
    }
}

impl<T, A> Extend<T> for MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);

        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T, A> Extend<&'a T> for MyVector<T, A>
where
    T: Copy + 'a,
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, const N: usize> From<[T; N]> for MyVector<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T> FromIterator<T> for MyVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<T, A> Hash for MyVector<T, A>
where
    T: Hash,
    A: Allocator + AllocPolicy,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T, A> IntoIterator for MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let vector = ManuallyDrop::new(self);
        let alloc = unsafe { ptr::read(vector.imp.first()) };
        let parts = vector.imp.second();

        IntoIter {
            alloc,
            buf: parts.ptr,
            cap: parts.cap,
            head: 0,
            tail: parts.len,
        }
    }
}

impl<'a, T, A> IntoIterator for &'a MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut MyVector<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A> PartialEq for MyVector<T, A>
where
    T: PartialEq,
    A: Allocator + AllocPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, A> Eq for MyVector<T, A>
where
    T: Eq,
    A: Allocator + AllocPolicy,
{
}

impl<T, A> PartialOrd for MyVector<T, A>
where
    T: PartialOrd,
    A: Allocator + AllocPolicy,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T, A> Ord for MyVector<T, A>
where
    T: Ord,
    A: Allocator + AllocPolicy,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

/// Owning iterator over the elements of a [`MyVector`].
///
/// The buffer is released once the iterator is dropped.
pub struct IntoIter<T, A: Allocator + AllocPolicy> {
    alloc: TypedAlloc<T, A>,
    buf: NonNull<T>,
    cap: usize,
    head: usize,
    tail: usize,
}

impl<T, A> IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Returns the remaining elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr().add(self.head), self.tail - self.head) }
    }
}

impl<T, A> Iterator for IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }

        let value = unsafe { ptr::read(self.buf.as_ptr().add(self.head)) };
        self.head += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.tail - self.head;
        (len, Some(len))
    }
}

impl<T, A> DoubleEndedIterator for IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }

        self.tail -= 1;
        Some(unsafe { ptr::read(self.buf.as_ptr().add(self.tail)) })
    }
}

impl<T, A> ExactSizeIterator for IntoIter<T, A> where A: Allocator + AllocPolicy {}

impl<T, A> FusedIterator for IntoIter<T, A> where A: Allocator + AllocPolicy {}

impl<T, A> fmt::Debug for IntoIter<T, A>
where
    T: fmt::Debug,
    A: Allocator + AllocPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, A> Drop for IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        /// Releases the buffer even if dropping a remaining element panics.
        struct ReleaseBuffer<'a, T, A: Allocator + AllocPolicy>(&'a mut IntoIter<T, A>);

        impl<'a, T, A: Allocator + AllocPolicy> Drop for ReleaseBuffer<'a, T, A> {
            fn drop(&mut self) {
                if self.0.cap != 0 {
                    unsafe { self.0.alloc.deallocate(self.0.buf, self.0.cap) };
                }
            }
        }

        let guard = ReleaseBuffer(self);
        let remaining = ptr::slice_from_raw_parts_mut(
            unsafe { guard.0.buf.as_ptr().add(guard.0.head) },
            guard.0.tail - guard.0.head,
        );
        guard.0.head = guard.0.tail;
        unsafe { ptr::drop_in_place(remaining) };
    }
}
