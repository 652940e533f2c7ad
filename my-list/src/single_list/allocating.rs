// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::cmp::Ordering;
use core::convert::Infallible;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{Allocator, Global};
use log::{debug, trace};
use moveit::new::TryNew;
use moveit::New;

use super::base::{self, FLinks, FNode};
use super::cursor::CursorMut;
use super::iter::{IntoIter, Iter, IterMut};
use crate::error::{handle_alloc_failure, AllocError, ConstructError};
use crate::memory::{pinned_slot, AllocTraits, AllocatedPtrGuard, CompressedPair, TypedAlloc};
use crate::traits::AllocPolicy;

/// A singly linked list that allocates every element in a node obtained from the allocator `A`.
///
/// The head of the list lives inline and points at the first node, or is null for an empty list.
/// Unlike [`MyList`](crate::list::MyList), no sentinel needs to be allocated and the list
/// doesn't keep count of its elements, so [`len`](Self::len) computes in *O*(*n*) time.
///
/// Copying, moving, and swapping lists follows the [`AllocPolicy`] of `A` in the same way as for
/// [`MyList`](crate::list::MyList).
pub struct MyForwardList<T, A: Allocator + AllocPolicy = Global> {
    imp: CompressedPair<TypedAlloc<FNode<T>, A>, FLinks>,
    marker: PhantomData<FNode<T>>,
}

unsafe impl<T: Send, A: Allocator + AllocPolicy + Send> Send for MyForwardList<T, A> {}
unsafe impl<T: Sync, A: Allocator + AllocPolicy + Sync> Sync for MyForwardList<T, A> {}

impl<T> MyForwardList<T> {
    /// Creates an empty list that uses the global allocator.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A> MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Creates an empty list that uses `alloc`.
    ///
    /// This doesn't allocate anything.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            imp: CompressedPair::new(TypedAlloc::new(alloc), FLinks::EMPTY),
            marker: PhantomData,
        }
    }

    /// Creates a list of `len` default-constructed elements.
    pub fn with_default_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut list = Self::new_in(alloc);
        list.resize_with(len, T::default);
        list
    }

    /// Creates a list of `len` copies of `value`.
    pub fn from_elem_in(len: usize, value: &T, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut list = Self::new_in(alloc);
        list.resize_with(len, || value.clone());
        list
    }

    /// Creates a list from the elements of `iter`, keeping their order.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::new_in(alloc);
        let head = list.head_mut();
        list.insert_iter_raw(head, iter);
        list
    }

    /// Creates a list that takes over the elements of `other` but uses `alloc`.
    ///
    /// If `alloc` compares equal to the allocator of `other`, the nodes of `other` are reused.
    /// Otherwise, every element is moved into a new node allocated from `alloc`.
    pub fn from_list_in(mut other: Self, alloc: A) -> Self {
        let mut list = Self::new_in(alloc);

        if list.allocator().alloc_eq(other.allocator()) {
            mem::swap(list.imp.second_mut(), other.imp.second_mut());
        } else {
            debug!("Allocators compare unequal, moving forward list elements one by one");
            list.extend(other);
        }

        list
    }

    /// Returns a deep copy of the list that uses `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self
    where
        T: Clone,
    {
        Self::from_iter_in(self.iter().cloned(), alloc)
    }

    /// Returns a reference to the allocator of the list.
    pub fn allocator(&self) -> &A {
        self.imp.first().inner()
    }

    /// Replaces the contents of the list with the elements of `iter`.
    ///
    /// Existing elements are assigned to, surplus elements are erased, and missing elements are
    /// appended.
    pub fn assign<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter();
        let mut pos = self.head_mut();

        loop {
            let next = unsafe { (*pos).next };
            if next.is_null() {
                break;
            }

            match iter.next() {
                Some(value) => {
                    unsafe { *FNode::<T>::value_ptr(next) = value };
                    pos = next;
                }
                None => {
                    self.erase_all_after(pos);
                    return;
                }
            }
        }

        self.insert_iter_raw(pos, iter);
    }

    /// Replaces the contents of the list with `len` copies of `value`.
    pub fn assign_n(&mut self, len: usize, value: &T)
    where
        T: Clone,
    {
        self.assign(iter::repeat(value).take(len).cloned())
    }

    /// Removes all elements from the list, deallocating their memory.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn clear(&mut self) {
        let head = self.head_mut();
        self.erase_all_after(head);
    }

    /// Returns `true` if the list contains an element equal to `value`.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|element| element == value)
    }

    /// Returns a mutable cursor pointing at the position in front of the first element.
    pub fn cursor_before_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let head = self.head_mut();
        CursorMut::new(self, head)
    }

    /// Constructs a new element in place at the front of the list and returns a reference to it.
    ///
    /// See [`MyList::emplace_front`](crate::list::MyList::emplace_front).
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn emplace_front<N>(&mut self, new: N) -> &mut T
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let head = self.head_mut();
        let node = self.emplace_raw_after(head, new);
        unsafe { &mut *FNode::value_ptr(node) }
    }

    /// Provides a reference to the first element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn front(&self) -> Option<&T> {
        let first = self.imp.second().next;
        (!first.is_null()).then(|| unsafe { FNode::<T>::value(first) })
    }

    /// Provides a mutable reference to the first element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let first = self.imp.second().next;
        (!first.is_null()).then(|| unsafe { &mut *FNode::<T>::value_ptr(first) })
    }

    /// Returns `true` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn is_empty(&self) -> bool {
        self.imp.second().next.is_null()
    }

    /// Returns an iterator yielding references to each element of the list.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.imp.second().next)
    }

    /// Returns an iterator yielding mutable references to each element of the list.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.imp.second().next)
    }

    /// Counts the elements of the list.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns the largest number of elements the allocator could theoretically provide nodes for.
    pub fn max_size(&self) -> usize {
        self.imp.first().max_size()
    }

    /// Merges the sorted list `other` into the sorted list `self`.
    ///
    /// See [`merge_by`](Self::merge_by).
    pub fn merge(&mut self, other: &mut Self)
    where
        T: Ord,
    {
        self.merge_by(other, T::cmp)
    }

    /// Merges the list `other`, sorted by `compare`, into the list `self`, also sorted by `compare`.
    ///
    /// The merge is stable and only relinks nodes.
    /// After this operation, `other` becomes empty.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn merge_by<F>(&mut self, other: &mut Self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.assert_same_allocator(other, "merge");

        let mut is_less = |a: &T, b: &T| compare(a, b) == Ordering::Less;
        unsafe { base::merge(self.head_mut(), other.head_mut(), &mut is_less) };
    }

    /// Replaces the contents of the list with those of `other`, which is consumed.
    ///
    /// See [`MyList::move_assign`](crate::list::MyList::move_assign).
    pub fn move_assign(&mut self, mut other: Self) {
        if A::PROPAGATE_ON_MOVE_ASSIGNMENT {
            *self = other;
        } else if self.allocator().alloc_eq(other.allocator()) {
            self.clear();
            mem::swap(self.imp.second_mut(), other.imp.second_mut());
        } else {
            debug!("Allocators compare unequal, move-assigning forward list elements one by one");
            self.assign(other);
        }
    }

    /// Removes the first element from the list and returns it, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head_mut();
        self.take_after(head)
    }

    /// Appends an element to the front of the list.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn push_front(&mut self, value: T) {
        self.try_push_front(value)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Removes all elements equal to `value` and returns how many were removed.
    pub fn remove(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.remove_if(|element| element == value)
    }

    /// Removes all elements for which `pred` returns `true` and returns how many were removed.
    ///
    /// The removed elements are only dropped after the traversal.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut prev = self.head_mut();
        let mut removed = Chain::<T, A>::new(self.allocator());

        unsafe {
            while !(*prev).next.is_null() {
                let current = (*prev).next;

                if pred(FNode::value(current)) {
                    FLinks::unlink_after(prev);
                    removed.push(current);
                } else {
                    prev = current;
                }
            }
        }

        removed.len
    }

    /// Resizes the list to `new_len` elements, appending clones of `value` or erasing elements
    /// from the back as necessary.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone())
    }

    /// Resizes the list to `new_len` elements, appending values returned by `f` or erasing
    /// elements from the back as necessary.
    ///
    /// A panic in `f` leaves the list unchanged.
    pub fn resize_with<F>(&mut self, new_len: usize, f: F)
    where
        F: FnMut() -> T,
    {
        let mut pos = self.head_mut();
        let mut len = 0;

        while len < new_len {
            let next = unsafe { (*pos).next };
            if next.is_null() {
                break;
            }

            pos = next;
            len += 1;
        }

        if len == new_len {
            self.erase_all_after(pos);
        } else {
            trace!("Growing forward list from {} to {} elements", len, new_len);
            self.insert_iter_raw(pos, iter::repeat_with(f).take(new_len - len));
        }
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.remove_if(|element| !f(element));
    }

    /// Reverses the order of the elements.
    ///
    /// This operation computes in *O*(*n*) time and only relinks nodes.
    pub fn reverse(&mut self) {
        unsafe { FLinks::reverse(self.head_mut()) }
    }

    /// Sorts the list.
    ///
    /// See [`sort_by`](Self::sort_by).
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp)
    }

    /// Sorts the list with a comparator function.
    ///
    /// The sort is stable and relinks nodes instead of moving elements.
    /// If `compare` panics, the list keeps all elements in unspecified order.
    ///
    /// This operation computes in *O*(*n* log *n*) time.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        trace!("Sorting a forward list");

        let mut is_less = |a: &T, b: &T| compare(a, b) == Ordering::Less;
        unsafe { base::sort(self.head_mut(), &mut is_less) };
    }

    /// Sorts the list with a key extraction function.
    ///
    /// See [`sort_by`](Self::sort_by).
    pub fn sort_by_key<K, F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> K,
        K: Ord,
    {
        self.sort_by(|a, b| f(a).cmp(&f(b)))
    }

    /// Moves all elements from `other` to the front of the list, keeping their order.
    /// After this operation, `other` becomes empty.
    ///
    /// This operation computes in *O*(*m*) time, where *m* is the length of `other`.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_front(&mut self, other: &mut Self) {
        self.assert_same_allocator(other, "splice");
        unsafe { FLinks::splice_all_after(self.head_mut(), other.head_mut()) };
    }

    /// Exchanges the contents of two lists.
    ///
    /// Allocators are exchanged as well if they propagate on swap.
    ///
    /// # Panics
    ///
    /// Panics if the allocators don't propagate on swap and compare unequal.
    pub fn swap(&mut self, other: &mut Self) {
        if !A::PROPAGATE_ON_SWAP {
            self.assert_same_allocator(other, "swap");
        }

        A::do_swap(
            self.imp.first_mut().inner_mut(),
            other.imp.first_mut().inner_mut(),
        );
        mem::swap(self.imp.second_mut(), other.imp.second_mut());
    }

    /// Shortens the list to `len` elements, dropping the rest.
    ///
    /// Does nothing if the list is not longer than `len`.
    pub fn truncate(&mut self, len: usize) {
        let mut pos = self.head_mut();

        for _ in 0..len {
            let next = unsafe { (*pos).next };
            if next.is_null() {
                return;
            }
            pos = next;
        }

        self.erase_all_after(pos);
    }

    /// Constructs a new element in place at the front of the list and returns a reference to it,
    /// or returns an error if either the allocation or the constructor fails.
    ///
    /// On error, the list is unchanged.
    pub fn try_emplace_front<N>(&mut self, new: N) -> Result<&mut T, ConstructError<N::Error>>
    where
        N: TryNew<Output = T>,
        T: Unpin,
    {
        let head = self.head_mut();
        let node =
            self.try_link_new_after(head, |slot| unsafe { new.try_new(pinned_slot(slot)) })?;
        Ok(unsafe { &mut *FNode::value_ptr(node) })
    }

    /// Appends an element to the front of the list, or returns an error if no node can be allocated.
    ///
    /// On error, the list is unchanged.
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        let head = self.head_mut();
        self.try_link_value_after(head, value).map(|_| ())
    }

    /// Removes consecutive duplicate elements and returns how many were removed.
    ///
    /// See [`unique_by`](Self::unique_by).
    pub fn unique(&mut self) -> usize
    where
        T: PartialEq,
    {
        self.unique_by(|a, b| a == b)
    }

    /// Removes all but the first of consecutive elements that `same` considers equal and returns
    /// how many were removed.
    ///
    /// `same` is called with the most recently retained element first and its successor second.
    pub fn unique_by<F>(&mut self, mut same: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        let head = self.head_mut();
        let mut removed = Chain::<T, A>::new(self.allocator());

        unsafe {
            let mut kept = (*head).next;

            while !kept.is_null() && !(*kept).next.is_null() {
                let current = (*kept).next;

                if same(FNode::value(kept), FNode::value(current)) {
                    FLinks::unlink_after(kept);
                    removed.push(current);
                } else {
                    kept = current;
                }
            }
        }

        removed.len
    }

    /// Panics if the allocators of `self` and `other` compare unequal.
    pub(super) fn assert_same_allocator(&self, other: &Self, operation: &str) {
        assert!(
            self.allocator().alloc_eq(other.allocator()),
            "cannot {operation} lists whose allocators compare unequal"
        );
    }

    /// Creates a node whose element is constructed by `new` and links it behind `pos`.
    pub(super) fn emplace_raw_after<N>(&mut self, pos: *mut FLinks, new: N) -> *mut FLinks
    where
        N: New<Output = T>,
    {
        let result = self.try_link_new_after::<Infallible, _>(pos, |slot| {
            unsafe { new.new(pinned_slot(slot)) };
            Ok(())
        });

        result.unwrap_or_else(|err| handle_alloc_failure(err.into_alloc_error()))
    }

    /// Drops and deallocates all nodes behind `pos`.
    pub(super) fn erase_all_after(&mut self, pos: *mut FLinks) {
        // Detach the nodes first, so that a panicking element destructor can't lead to a
        // double drop.
        let mut current = unsafe { (*pos).next };
        unsafe { (*pos).next = ptr::null_mut() };

        while !current.is_null() {
            unsafe {
                let next = (*current).next;
                destroy_node::<T, A>(self.allocator(), current);
                current = next;
            }
        }
    }

    /// Drops and deallocates the node behind `pos` and returns `false` if there was none.
    pub(super) fn erase_after(&mut self, pos: *mut FLinks) -> bool {
        let node = unsafe { FLinks::unlink_after(pos) };
        if node.is_null() {
            return false;
        }

        unsafe { destroy_node::<T, A>(self.allocator(), node) };
        true
    }

    pub(super) fn head_mut(&mut self) -> *mut FLinks {
        self.imp.second_mut()
    }

    /// Creates nodes for all elements of `iter` and links them behind `pos`, keeping their order.
    pub(super) fn insert_iter_raw<I>(&mut self, pos: *mut FLinks, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let result = self.try_insert_iter_raw(pos, iter.into_iter().map(Ok::<T, Infallible>));
        result.unwrap_or_else(|err| handle_alloc_failure(err.into_alloc_error()))
    }

    /// Moves the element out of the node behind `pos` and deallocates the node.
    pub(super) fn take_after(&mut self, pos: *mut FLinks) -> Option<T> {
        let node = unsafe { FLinks::unlink_after(pos) };
        (!node.is_null()).then(|| unsafe { take_node::<T, A>(self.allocator(), node) })
    }

    /// Creates nodes for all elements of `iter` on a detached chain and then links them behind
    /// `pos` in one step.
    ///
    /// If an element is an error, an allocation fails, or the iterator panics, all nodes created
    /// so far are dropped again and the list stays unchanged.
    pub(super) fn try_insert_iter_raw<I, E>(
        &mut self,
        pos: *mut FLinks,
        iter: I,
    ) -> Result<usize, ConstructError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut pending = Chain::<T, A>::new(self.allocator());

        for item in iter {
            let value = item.map_err(ConstructError::Construct)?;
            let node = create_node_with_value::<T, A>(self.allocator(), value)?;
            unsafe { pending.push(node) };
        }

        Ok(unsafe { pending.link_after(pos) })
    }

    /// Creates a node whose element is constructed by `init` and links it behind `pos`.
    pub(super) fn try_link_new_after<E, F>(
        &mut self,
        pos: *mut FLinks,
        init: F,
    ) -> Result<*mut FLinks, ConstructError<E>>
    where
        F: FnOnce(*mut T) -> Result<(), E>,
    {
        let node = create_node::<T, A, E, F>(self.allocator(), init)?;
        unsafe { FLinks::link_after(pos, node) };
        Ok(node)
    }

    /// Creates a node with `value` and links it behind `pos`.
    pub(super) fn try_link_value_after(
        &mut self,
        pos: *mut FLinks,
        value: T,
    ) -> Result<*mut FLinks, AllocError> {
        let node = create_node_with_value::<T, A>(self.allocator(), value)?;
        unsafe { FLinks::link_after(pos, node) };
        Ok(node)
    }
}

impl<T, A> Clone for MyForwardList<T, A>
where
    T: Clone,
    A: Allocator + AllocPolicy + Clone,
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().select_on_container_copy_construction())
    }

    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_COPY_ASSIGNMENT && !self.allocator().alloc_eq(source.allocator()) {
            // Our nodes belong to the old allocator.
            self.clear();
        }

        A::do_copy(self.imp.first_mut().inner_mut(), source.allocator());
        self.assign(source.iter().cloned());
    }
}

impl<T, A> fmt::Debug for MyForwardList<T, A>
where
    T: fmt::Debug,
    A: Allocator + AllocPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T, A> Default for MyForwardList<T, A>
where
    A: Allocator + AllocPolicy + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A> Drop for MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A> Extend<T> for MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Appends the elements of `iter` to the back of the list.
    ///
    /// Finding the back takes *O*(*n*) time.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let last = unsafe { FLinks::last(self.head_mut()) };
        self.insert_iter_raw(last, iter);
    }
}

impl<'a, T, A> Extend<&'a T> for MyForwardList<T, A>
where
    T: Copy + 'a,
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, const N: usize> From<[T; N]> for MyForwardList<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T> FromIterator<T> for MyForwardList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<T, A> Hash for MyForwardList<T, A>
where
    T: Hash,
    A: Allocator + AllocPolicy,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for element in self {
            element.hash(state);
        }
    }
}

impl<T, A> IntoIterator for MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A> IntoIterator for &'a MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut MyForwardList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A> PartialEq for MyForwardList<T, A>
where
    T: PartialEq,
    A: Allocator + AllocPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T, A> Eq for MyForwardList<T, A>
where
    T: Eq,
    A: Allocator + AllocPolicy,
{
}

impl<T, A> PartialOrd for MyForwardList<T, A>
where
    T: PartialOrd,
    A: Allocator + AllocPolicy,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T, A> Ord for MyForwardList<T, A>
where
    T: Ord,
    A: Allocator + AllocPolicy,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

/// A detached chain whose nodes are dropped and deallocated when it goes out of scope.
struct Chain<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    head: FLinks,
    tail: *mut FLinks,
    len: usize,
    alloc: &'a A,
    marker: PhantomData<T>,
}

impl<'a, T, A> Chain<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn new(alloc: &'a A) -> Self {
        Self {
            head: FLinks::EMPTY,
            tail: ptr::null_mut(),
            len: 0,
            alloc,
            marker: PhantomData,
        }
    }

    /// Appends the unlinked `node`.
    unsafe fn push(&mut self, node: *mut FLinks) {
        (*node).next = ptr::null_mut();

        if self.tail.is_null() {
            self.head.next = node;
        } else {
            (*self.tail).next = node;
        }

        self.tail = node;
        self.len += 1;
    }

    /// Links all nodes behind `pos`, leaving the chain empty, and returns how many there were.
    unsafe fn link_after(&mut self, pos: *mut FLinks) -> usize {
        let len = self.len;

        if !self.tail.is_null() {
            (*self.tail).next = (*pos).next;
            (*pos).next = self.head.next;
        }

        self.head.next = ptr::null_mut();
        self.tail = ptr::null_mut();
        self.len = 0;
        len
    }
}

impl<'a, T, A> Drop for Chain<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        let mut current = self.head.next;
        self.head.next = ptr::null_mut();

        while !current.is_null() {
            unsafe {
                let next = (*current).next;
                destroy_node::<T, A>(self.alloc, current);
                current = next;
            }
        }
    }
}

/// Allocates an unlinked node and constructs its element with `init`.
///
/// If `init` fails or panics, the node is deallocated again.
fn create_node<T, A, E, F>(alloc: &A, init: F) -> Result<*mut FLinks, ConstructError<E>>
where
    A: Allocator + AllocPolicy,
    F: FnOnce(*mut T) -> Result<(), E>,
{
    let guard = AllocatedPtrGuard::<FNode<T>, A>::guarded(alloc)?;
    let node = guard.get().cast::<FLinks>();

    init(unsafe { FNode::<T>::value_ptr(node) }).map_err(ConstructError::Construct)?;

    Ok(guard.release().as_ptr().cast())
}

fn create_node_with_value<T, A>(alloc: &A, value: T) -> Result<*mut FLinks, AllocError>
where
    A: Allocator + AllocPolicy,
{
    create_node::<T, A, Infallible, _>(alloc, |slot| {
        unsafe { slot.write(value) };
        Ok(())
    })
    .map_err(ConstructError::into_alloc_error)
}

/// Drops the element of the unlinked `node` and deallocates the node, even if the destructor of
/// the element panics.
unsafe fn destroy_node<T, A>(alloc: &A, node: *mut FLinks)
where
    A: Allocator + AllocPolicy,
{
    let storage =
        AllocatedPtrGuard::<FNode<T>, A>::new(alloc, NonNull::new_unchecked(node.cast()));
    alloc.destroy(&FNode::<T>::value_ptr(node));
    drop(storage);
}

/// Moves the element out of the unlinked `node` and deallocates the node.
unsafe fn take_node<T, A>(alloc: &A, node: *mut FLinks) -> T
where
    A: Allocator + AllocPolicy,
{
    let value = ptr::read(FNode::<T>::value_ptr(node));
    alloc.deallocate_n(NonNull::new_unchecked(node.cast::<FNode<T>>()), 1);
    value
}
