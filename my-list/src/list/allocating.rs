// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::cmp::Ordering;
use core::convert::Infallible;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{Allocator, Global};
use log::{debug, trace};
use moveit::new::TryNew;
use moveit::New;

use super::base::{self, Links, ListHeader, ListNode};
use super::cursor::{Cursor, CursorMut};
use super::iter::{IntoIter, Iter, IterMut};
use crate::error::{handle_alloc_failure, AllocError, ConstructError};
use crate::memory::{pinned_slot, AllocTraits, AllocatedPtrGuard, CompressedPair, TypedAlloc};
use crate::traits::AllocPolicy;

/// A doubly linked list that allocates every element in a node obtained from the allocator `A`.
///
/// The list is anchored at a sentinel node that is allocated once, together with the list, from
/// the same allocator.
/// This keeps the `MyList` value itself freely movable, while all element nodes and the
/// sentinel form a circular ring where the sentinel is the "end" position.
///
/// Copying, moving, and swapping lists follows the [`AllocPolicy`] of `A`:
///
/// * [`Clone`] asks the allocator for [`select_on_container_copy_construction`].
/// * [`clone_from`](Clone::clone_from) adopts the source's allocator if it propagates on copy
///   assignment.
/// * [`move_assign`](Self::move_assign) takes over the nodes of the source in *O*(*1*) time if
///   the allocator propagates on move assignment or both allocators compare equal, and moves
///   element by element otherwise.
/// * [`swap`](Self::swap), [`append`](Self::append), [`merge`](Self::merge), and the splicing
///   operations of [`CursorMut`] relink nodes between lists and therefore require equal
///   allocators (or a policy that propagates on swap, for `swap`).
///   They panic otherwise.
///
/// See the [module-level documentation](crate::list) for more details.
///
/// [`select_on_container_copy_construction`]: AllocPolicy::select_on_container_copy_construction
pub struct MyList<T, A: Allocator + AllocPolicy = Global> {
    imp: CompressedPair<TypedAlloc<ListNode<T>, A>, NonNull<ListHeader>>,
    marker: PhantomData<ListNode<T>>,
}

unsafe impl<T: Send, A: Allocator + AllocPolicy + Send> Send for MyList<T, A> {}
unsafe impl<T: Sync, A: Allocator + AllocPolicy + Sync> Sync for MyList<T, A> {}

impl<T> MyList<T> {
    /// Creates an empty list that uses the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T, A> MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Creates an empty list that uses `alloc`.
    ///
    /// This allocates the sentinel node.
    pub fn new_in(alloc: A) -> Self {
        Self::try_new_in(alloc).unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Creates an empty list that uses `alloc`, or returns an error if the sentinel node cannot
    /// be allocated.
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        let node_alloc = TypedAlloc::<ListNode<T>, A>::new(alloc);
        let header = node_alloc.by_ref().rebind::<ListHeader>().allocate(1)?;

        unsafe {
            header.as_ptr().write(ListHeader::UNLINKED);
            ListHeader::reset(header.as_ptr());
        }

        Ok(Self {
            imp: CompressedPair::new(node_alloc, header),
            marker: PhantomData,
        })
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

    /// Creates a list from the elements of `iter`, appending them one by one.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::new_in(alloc);
        list.extend(iter);
        list
    }

    /// Creates a list that takes over the elements of `other` but uses `alloc`.
    ///
    /// If `alloc` compares equal to the allocator of `other`, the nodes of `other` are reused
    /// and this operation computes in *O*(*1*) time.
    /// Otherwise, every element is moved into a new node allocated from `alloc`.
    pub fn from_list_in(other: Self, alloc: A) -> Self {
        let mut list = Self::new_in(alloc);

        if list.allocator().alloc_eq(other.allocator()) {
            unsafe { ListHeader::splice_all(list.header(), list.end_marker(), other.header()) };
        } else {
            debug!(
                "Allocators compare unequal, moving {} list elements one by one",
                other.len()
            );
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

    /// Moves all elements from `other` to the end of the list.
    ///
    /// This reuses all the nodes from `other` and moves them into `self`.
    /// After this operation, `other` becomes empty.
    ///
    /// This operation computes in *O*(*1*) time.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn append(&mut self, other: &mut Self) {
        self.assert_same_allocator(other, "append");
        unsafe { ListHeader::splice_all(self.header(), self.end_marker(), other.header()) };
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
        let end = self.end_marker();
        let mut current = unsafe { (*end).next };

        while current != end {
            match iter.next() {
                Some(value) => unsafe {
                    *ListNode::<T>::value_ptr(current) = value;
                    current = (*current).next;
                },
                None => {
                    self.erase_range(current, end);
                    return;
                }
            }
        }

        self.insert_iter_raw(end, iter);
    }

    /// Replaces the contents of the list with `len` copies of `value`.
    pub fn assign_n(&mut self, len: usize, value: &T)
    where
        T: Clone,
    {
        self.assign(iter::repeat(value).take(len).cloned())
    }

    /// Provides a reference to the last element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn back(&self) -> Option<&T> {
        (!self.is_empty()).then(|| unsafe { ListNode::value((*self.header()).links.prev) })
    }

    /// Provides a mutable reference to the last element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        (!self.is_empty())
            .then(|| unsafe { &mut *ListNode::value_ptr((*self.header()).links.prev) })
    }

    /// Removes all elements from the list, deallocating their memory.
    ///
    /// This operation computes in *O*(*n*) time, because it needs to traverse all elements to
    /// drop and deallocate them.
    pub fn clear(&mut self) {
        let header = self.header();
        let end = ListHeader::end(header);

        // Get the link to the first element before it's being reset.
        let mut current = unsafe { (*header).links.next };

        // Make the list appear empty before dropping any element.
        // If the `Drop` handler of an element panics, the `Drop` handler of `MyList` then won't
        // find any elements, and thereby it won't drop any element twice.
        unsafe { ListHeader::reset(header) };

        // Traverse the list in the old-fashioned way and deallocate each element.
        while current != end {
            unsafe {
                let next = (*current).next;
                destroy_node::<T, A>(self.allocator(), current);
                current = next;
            }
        }
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

    /// Returns a cursor pointing at the last element, or at the end if the list is empty.
    pub fn cursor_back(&self) -> Cursor<'_, T, A> {
        let index = self.len().saturating_sub(1);
        let current = unsafe { (*self.header()).links.prev };
        Cursor::new(self, current, index)
    }

    /// Returns a mutable cursor pointing at the last element, or at the end if the list is empty.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
        let index = self.len().saturating_sub(1);
        let current = unsafe { (*self.header()).links.prev };
        CursorMut::new(self, current, index)
    }

    /// Returns a cursor pointing at the end of the list, which is the position behind the last
    /// element.
    pub fn cursor_end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.end_marker(), self.len())
    }

    /// Returns a mutable cursor pointing at the end of the list, which is the position behind
    /// the last element.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, A> {
        let end = self.end_marker();
        let len = self.len();
        CursorMut::new(self, end, len)
    }

    /// Returns a cursor pointing at the first element, or at the end if the list is empty.
    pub fn cursor_front(&self) -> Cursor<'_, T, A> {
        let current = unsafe { (*self.header()).links.next };
        Cursor::new(self, current, 0)
    }

    /// Returns a mutable cursor pointing at the first element, or at the end if the list is empty.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        let current = unsafe { (*self.header()).links.next };
        CursorMut::new(self, current, 0)
    }

    /// Constructs a new element in place at the back of the list and returns a reference to it.
    ///
    /// The element is constructed by `new` directly inside its node, without ever being moved.
    /// It is not structurally pinned though, which is why `T` must be [`Unpin`].
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn emplace_back<N>(&mut self, new: N) -> &mut T
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let node = self.emplace_raw(self.end_marker(), new);
        unsafe { &mut *ListNode::value_ptr(node) }
    }

    /// Constructs a new element in place at the front of the list and returns a reference to it.
    ///
    /// See [`emplace_back`](Self::emplace_back).
    pub fn emplace_front<N>(&mut self, new: N) -> &mut T
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let first = unsafe { (*self.header()).links.next };
        let node = self.emplace_raw(first, new);
        unsafe { &mut *ListNode::value_ptr(node) }
    }

    /// Returns a new list with copies of all elements for which `pred` returns `true`.
    ///
    /// The new list uses a copy of the allocator of `self`.
    pub fn filter<F>(&self, mut pred: F) -> Self
    where
        F: FnMut(&T) -> bool,
        T: Clone,
        A: Clone,
    {
        Self::from_iter_in(
            self.iter().filter(|element| pred(element)).cloned(),
            self.allocator().clone(),
        )
    }

    /// Provides a reference to the first element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn front(&self) -> Option<&T> {
        (!self.is_empty()).then(|| unsafe { ListNode::value((*self.header()).links.next) })
    }

    /// Provides a mutable reference to the first element, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        (!self.is_empty())
            .then(|| unsafe { &mut *ListNode::value_ptr((*self.header()).links.next) })
    }

    /// Returns `true` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn is_empty(&self) -> bool {
        unsafe { ListHeader::is_empty(self.header()) }
    }

    /// Returns an iterator yielding references to each element of the list.
    pub fn iter(&self) -> Iter<'_, T> {
        unsafe { Iter::new(self.header()) }
    }

    /// Returns an iterator yielding mutable references to each element of the list.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        unsafe { IterMut::new(self.header()) }
    }

    /// Returns the number of elements in the list.
    ///
    /// This operation computes in *O*(*1*) time, because the sentinel keeps count.
    pub fn len(&self) -> usize {
        unsafe { (*self.header()).size }
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
    /// All nodes of `other` are relinked into `self`, no element is moved or copied.
    /// The merge is stable: for elements that compare equal, those from `self` come first.
    /// After this operation, `other` becomes empty.
    ///
    /// If `compare` panics, both lists stay valid and no element is lost, but the elements may
    /// be distributed arbitrarily between the two lists.
    ///
    /// This operation computes in *O*(*n* + *m*) time.
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
        unsafe { base::merge(self.header(), other.header(), &mut is_less) };
    }

    /// Replaces the contents of the list with those of `other`, which is consumed.
    ///
    /// * If the allocator propagates on move assignment, `self` takes over the allocator and the
    ///   nodes of `other`, dropping its own elements.
    /// * If both allocators compare equal, `self` drops its own elements and relinks the nodes of
    ///   `other` in *O*(*1*) time.
    /// * Otherwise, `self` keeps its allocator, and every element is moved into a node of it.
    pub fn move_assign(&mut self, other: Self) {
        if A::PROPAGATE_ON_MOVE_ASSIGNMENT {
            *self = other;
        } else if self.allocator().alloc_eq(other.allocator()) {
            self.clear();
            unsafe { ListHeader::splice_all(self.header(), self.end_marker(), other.header()) };
        } else {
            debug!(
                "Allocators compare unequal, move-assigning {} list elements one by one",
                other.len()
            );
            self.assign(other);
        }
    }

    /// Removes the last element from the list and returns it, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn pop_back(&mut self) -> Option<T> {
        (!self.is_empty()).then(|| unsafe { self.unlink_take((*self.header()).links.prev) })
    }

    /// Removes the first element from the list and returns it, or `None` if the list is empty.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn pop_front(&mut self) -> Option<T> {
        (!self.is_empty()).then(|| unsafe { self.unlink_take((*self.header()).links.next) })
    }

    /// Appends an element to the back of the list.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn push_back(&mut self, value: T) {
        self.try_push_back(value)
            .unwrap_or_else(|err| handle_alloc_failure(err))
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
    /// The removed elements are first collected on a detached ring and only dropped after the
    /// traversal, so `pred` never observes a half-removed element.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let old_len = self.len();
        let header = self.header();
        let end = ListHeader::end(header);

        let mut removed = ListHeader::UNLINKED;
        let removed = unsafe { Scratch::<T, A>::new(ptr::addr_of_mut!(removed), self.allocator()) };

        let mut current = unsafe { (*header).links.next };
        while current != end {
            unsafe {
                let next = (*current).next;
                if pred(ListNode::value(current)) {
                    ListHeader::splice_one(removed.header, removed.end(), header, current);
                }
                current = next;
            }
        }

        drop(removed);
        old_len - self.len()
    }

    /// Resizes the list to `new_len` elements, appending clones of `value` or erasing elements
    /// from the back as necessary.
    ///
    /// See [`resize_with`](Self::resize_with).
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone())
    }

    /// Resizes the list to `new_len` elements, appending values returned by `f` or erasing
    /// elements from the back as necessary.
    ///
    /// All new elements are created before any of them is linked into the list, so a panic in
    /// `f` leaves the list unchanged.
    pub fn resize_with<F>(&mut self, new_len: usize, f: F)
    where
        F: FnMut() -> T,
    {
        let len = self.len();
        trace!("Resizing list from {} to {} elements", len, new_len);

        if new_len <= len {
            self.truncate(new_len);
        } else {
            self.insert_iter_raw(self.end_marker(), iter::repeat_with(f).take(new_len - len));
        }
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all elements `e` for which `f(&e)` returns `false`.
    /// This method operates in place, visiting each element exactly once in the original order,
    /// and preserves the order of the retained elements.
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
        unsafe { ListHeader::reverse(self.header()) }
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
    /// The sort is stable and relinks nodes instead of moving elements, so references into the
    /// list stay attached to their elements.
    /// If `compare` panics, the list stays valid and keeps all elements in unspecified order.
    ///
    /// This operation computes in *O*(*n* log *n*) time and needs no memory from the allocator.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        trace!("Sorting a list of {} elements", self.len());

        let mut is_less = |a: &T, b: &T| compare(a, b) == Ordering::Less;
        unsafe { base::sort(self.header(), &mut is_less) };
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

    /// Moves the elements in the index range `first..last` in front of the element at index
    /// `pos` (or to the back if `pos` equals the length).
    ///
    /// Moving a range in front of its own first element or its own end changes nothing.
    ///
    /// # Panics
    ///
    /// Panics if the range or `pos` are out of bounds, or if `pos` lies strictly inside the range.
    pub fn splice_within(&mut self, pos: usize, first: usize, last: usize) {
        let len = self.len();
        assert!(
            first <= last && last <= len,
            "range {first}..{last} is out of bounds for a list of length {len}"
        );
        assert!(
            pos <= len,
            "position {pos} is out of bounds for a list of length {len}"
        );
        assert!(
            pos <= first || pos >= last,
            "cannot splice the range {first}..{last} in front of its own element {pos}"
        );

        if first == last || pos == first || pos == last {
            return;
        }

        let pos = self.node_at(pos);
        let first = self.node_at(first);
        let last = self.node_at(last);
        unsafe { Links::transfer(pos, first, last) };
    }

    /// Splits the list into two at the given index.
    /// Returns everything from the given index on, including the element at the index.
    ///
    /// The returned list uses a copy of the allocator of `self` and reuses the nodes.
    ///
    /// This operation computes in *O*(*min(at, len - at)*) time.
    ///
    /// # Panics
    ///
    /// Panics if `at > len`.
    pub fn split_off(&mut self, at: usize) -> Self
    where
        A: Clone,
    {
        let len = self.len();
        assert!(
            at <= len,
            "cannot split off at index {at} of a list of length {len}"
        );

        let tail = Self::new_in(self.allocator().clone());
        let first = self.node_at(at);

        unsafe {
            ListHeader::splice_run(
                tail.header(),
                tail.end_marker(),
                self.header(),
                first,
                self.end_marker(),
                len - at,
            );
        }

        tail
    }

    /// Exchanges the contents of two lists.
    ///
    /// Allocators are exchanged as well if they propagate on swap.
    ///
    /// This operation computes in *O*(*1*) time.
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
        core::mem::swap(self.imp.second_mut(), other.imp.second_mut());
    }

    /// Shortens the list to `len` elements, dropping the rest.
    ///
    /// Does nothing if the list is not longer than `len`.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            let first = self.node_at(len);
            self.erase_range(first, self.end_marker());
        }
    }

    /// Appends an element to the back of the list, or returns an error if no node can be allocated.
    ///
    /// On error, the list is unchanged.
    pub fn try_emplace_back<N>(&mut self, new: N) -> Result<&mut T, ConstructError<N::Error>>
    where
        N: TryNew<Output = T>,
        T: Unpin,
    {
        let node = self.try_link_new(self.end_marker(), |slot| unsafe {
            new.try_new(pinned_slot(slot))
        })?;
        Ok(unsafe { &mut *ListNode::value_ptr(node) })
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
        let first = unsafe { (*self.header()).links.next };
        let node = self.try_link_new(first, |slot| unsafe { new.try_new(pinned_slot(slot)) })?;
        Ok(unsafe { &mut *ListNode::value_ptr(node) })
    }

    /// Appends an element to the back of the list, or returns an error if no node can be allocated.
    ///
    /// On error, the list is unchanged.
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        self.try_link_value(self.end_marker(), value).map(|_| ())
    }

    /// Appends an element to the front of the list, or returns an error if no node can be allocated.
    ///
    /// On error, the list is unchanged.
    pub fn try_push_front(&mut self, value: T) -> Result<(), AllocError> {
        let first = unsafe { (*self.header()).links.next };
        self.try_link_value(first, value).map(|_| ())
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
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn unique_by<F>(&mut self, mut same: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        let old_len = self.len();
        let header = self.header();
        let end = ListHeader::end(header);

        let mut removed = ListHeader::UNLINKED;
        let removed = unsafe { Scratch::<T, A>::new(ptr::addr_of_mut!(removed), self.allocator()) };

        unsafe {
            let mut kept = (*header).links.next;
            if kept != end {
                let mut current = (*kept).next;

                while current != end {
                    let next = (*current).next;
                    if same(ListNode::value(kept), ListNode::value(current)) {
                        ListHeader::splice_one(removed.header, removed.end(), header, current);
                    } else {
                        kept = current;
                    }
                    current = next;
                }
            }
        }

        drop(removed);
        old_len - self.len()
    }

    /// Panics if the allocators of `self` and `other` compare unequal.
    pub(super) fn assert_same_allocator(&self, other: &Self, operation: &str) {
        assert!(
            self.allocator().alloc_eq(other.allocator()),
            "cannot {operation} lists whose allocators compare unequal"
        );
    }

    /// Returns the "end marker element" (which is the address of our sentinel, but interpreted
    /// as `Links` of a node).
    pub(super) fn end_marker(&self) -> *mut Links {
        ListHeader::end(self.header())
    }

    /// Creates a node with `value` and links it in front of `pos`.
    pub(super) fn emplace_raw<N>(&mut self, pos: *mut Links, new: N) -> *mut Links
    where
        N: New<Output = T>,
    {
        let result = self.try_link_new::<Infallible, _>(pos, |slot| {
            unsafe { new.new(pinned_slot(slot)) };
            Ok(())
        });

        result.unwrap_or_else(|err| handle_alloc_failure(err.into_alloc_error()))
    }

    /// Drops and deallocates the nodes `[first, last)` and returns how many there were.
    pub(super) fn erase_range(&mut self, first: *mut Links, last: *mut Links) -> usize {
        let mut count = 0;
        let mut current = first;

        while current != last {
            unsafe {
                let next = (*current).next;
                self.erase_node(current);
                current = next;
            }
            count += 1;
        }

        count
    }

    /// Unlinks `node`, drops its element, and deallocates it.
    pub(super) unsafe fn erase_node(&mut self, node: *mut Links) {
        Links::unlink(node);
        (*self.header()).size -= 1;
        destroy_node::<T, A>(self.allocator(), node);
    }

    pub(super) fn header(&self) -> *mut ListHeader {
        self.imp.second().as_ptr()
    }

    /// Creates nodes for all elements of `iter` and links them in front of `pos`.
    pub(super) fn insert_iter_raw<I>(&mut self, pos: *mut Links, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let result = self.try_insert_iter_raw(pos, iter.into_iter().map(Ok::<T, Infallible>));
        result.unwrap_or_else(|err| handle_alloc_failure(err.into_alloc_error()))
    }

    /// Returns the node at `index`, or the end marker if `index` equals the length.
    ///
    /// Walks from whichever end of the list is closer.
    pub(super) fn node_at(&self, index: usize) -> *mut Links {
        let len = self.len();
        debug_assert!(index <= len);

        let end = self.end_marker();
        unsafe {
            if index <= len / 2 {
                let mut current = (*end).next;
                for _ in 0..index {
                    current = (*current).next;
                }
                current
            } else {
                let mut current = end;
                for _ in index..len {
                    current = (*current).prev;
                }
                current
            }
        }
    }

    /// Creates nodes for all elements of `iter` on a detached ring and then links them in front
    /// of `pos` in one step.
    ///
    /// If an element is an error, an allocation fails, or the iterator panics, all nodes created
    /// so far are dropped again and the list stays unchanged.
    pub(super) fn try_insert_iter_raw<I, E>(
        &mut self,
        pos: *mut Links,
        iter: I,
    ) -> Result<usize, ConstructError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut pending = ListHeader::UNLINKED;
        let pending =
            unsafe { Scratch::<T, A>::new(ptr::addr_of_mut!(pending), self.allocator()) };

        for item in iter {
            let value = item.map_err(ConstructError::Construct)?;
            let node = create_node_with_value::<T, A>(self.allocator(), value)?;

            unsafe {
                Links::link_before(node, pending.end());
                (*pending.header).size += 1;
            }
        }

        let count = unsafe { (*pending.header).size };
        unsafe { ListHeader::splice_all(self.header(), pos, pending.header) };

        Ok(count)
    }

    /// Creates a node whose element is constructed by `init` and links it in front of `pos`.
    pub(super) fn try_link_new<E, F>(
        &mut self,
        pos: *mut Links,
        init: F,
    ) -> Result<*mut Links, ConstructError<E>>
    where
        F: FnOnce(*mut T) -> Result<(), E>,
    {
        let node = create_node::<T, A, E, F>(self.allocator(), init)?;

        unsafe {
            Links::link_before(node, pos);
            (*self.header()).size += 1;
        }

        Ok(node)
    }

    /// Creates a node with `value` and links it in front of `pos`.
    pub(super) fn try_link_value(
        &mut self,
        pos: *mut Links,
        value: T,
    ) -> Result<*mut Links, AllocError> {
        self.try_link_new::<Infallible, _>(pos, |slot| {
            unsafe { slot.write(value) };
            Ok(())
        })
        .map_err(ConstructError::into_alloc_error)
    }

    /// Unlinks `node` and moves its element out before deallocating it.
    pub(super) unsafe fn unlink_take(&mut self, node: *mut Links) -> T {
        Links::unlink(node);
        (*self.header()).size -= 1;
        take_node::<T, A>(self.allocator(), node)
    }
}

impl<T, A> Clone for MyList<T, A>
where
    T: Clone,
    A: Allocator + AllocPolicy + Clone,
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().select_on_container_copy_construction())
    }

    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_COPY_ASSIGNMENT && !self.allocator().alloc_eq(source.allocator()) {
            // Our nodes and our sentinel belong to the old allocator, so start over with the new one.
            *self = Self::new_in(source.allocator().clone());
        } else {
            A::do_copy(self.imp.first_mut().inner_mut(), source.allocator());
        }

        self.assign(source.iter().cloned());
    }
}

impl<T, A> fmt::Debug for MyList<T, A>
where
    T: fmt::Debug,
    A: Allocator + AllocPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T, A> Default for MyList<T, A>
where
    A: Allocator + AllocPolicy + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A> Drop for MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        self.clear();

        unsafe {
            self.imp
                .first()
                .by_ref()
                .rebind::<ListHeader>()
                .deallocate(*self.imp.second(), 1)
        };
    }
}

impl<T, A> Extend<T> for MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T, A> Extend<&'a T> for MyList<T, A>
where
    T: Copy + 'a,
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, const N: usize> From<[T; N]> for MyList<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T> FromIterator<T> for MyList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<T, A> Hash for MyList<T, A>
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

impl<T, A> IntoIterator for MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A> IntoIterator for &'a MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, A> IntoIterator for &'a mut MyList<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, A> PartialEq for MyList<T, A>
where
    T: PartialEq,
    A: Allocator + AllocPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, A> Eq for MyList<T, A>
where
    T: Eq,
    A: Allocator + AllocPolicy,
{
}

impl<T, A> PartialOrd for MyList<T, A>
where
    T: PartialOrd,
    A: Allocator + AllocPolicy,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T, A> Ord for MyList<T, A>
where
    T: Ord,
    A: Allocator + AllocPolicy,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

/// A detached ring whose nodes are dropped and deallocated when it goes out of scope.
///
/// Removal algorithms collect their victims here, and bulk insertions build their nodes here
/// before splicing them into the list in one step.
struct Scratch<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    header: *mut ListHeader,
    alloc: &'a A,
    marker: PhantomData<T>,
}

impl<'a, T, A> Scratch<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Turns `header` into an empty scratch ring.
    ///
    /// # Safety
    ///
    /// `header` must neither move nor be accessed otherwise while the `Scratch` exists.
    unsafe fn new(header: *mut ListHeader, alloc: &'a A) -> Self {
        ListHeader::reset(header);

        Self {
            header,
            alloc,
            marker: PhantomData,
        }
    }

    fn end(&self) -> *mut Links {
        ListHeader::end(self.header)
    }
}

impl<'a, T, A> Drop for Scratch<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        let end = self.end();

        unsafe {
            let mut current = (*self.header).links.next;
            ListHeader::reset(self.header);

            while current != end {
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
fn create_node<T, A, E, F>(alloc: &A, init: F) -> Result<*mut Links, ConstructError<E>>
where
    A: Allocator + AllocPolicy,
    F: FnOnce(*mut T) -> Result<(), E>,
{
    let guard = AllocatedPtrGuard::<ListNode<T>, A>::guarded(alloc)?;
    let node = guard.get().cast::<Links>();

    init(unsafe { ListNode::<T>::value_ptr(node) }).map_err(ConstructError::Construct)?;

    Ok(guard.release().as_ptr().cast())
}

fn create_node_with_value<T, A>(alloc: &A, value: T) -> Result<*mut Links, AllocError>
where
    A: Allocator + AllocPolicy,
{
    create_node::<T, A, Infallible, _>(alloc, |slot| {
        unsafe { slot.write(value) };
        Ok(())
    })
    .map_err(ConstructError::into_alloc_error)
}

/// Drops the element of the unlinked `node` and deallocates the node.
///
/// The node is deallocated even if the destructor of the element panics.
unsafe fn destroy_node<T, A>(alloc: &A, node: *mut Links)
where
    A: Allocator + AllocPolicy,
{
    let storage =
        AllocatedPtrGuard::<ListNode<T>, A>::new(alloc, NonNull::new_unchecked(node.cast()));
    alloc.destroy(&ListNode::<T>::value_ptr(node));
    drop(storage);
}

/// Moves the element out of the unlinked `node` and deallocates the node.
unsafe fn take_node<T, A>(alloc: &A, node: *mut Links) -> T
where
    A: Allocator + AllocPolicy,
{
    let value = ptr::read(ListNode::<T>::value_ptr(node));
    alloc.deallocate_n(NonNull::new_unchecked(node.cast::<ListNode<T>>()), 1);
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::base::tests::verify_all_links;
    use crate::test_alloc::{PropagatingAlloc, Tracked, TrackingAlloc};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::mem::MaybeUninit;
    use core::pin::Pin;
    use moveit::new;
    use proptest::prelude::*;
    use std::panic::{self, AssertUnwindSafe};

    fn values<A: Allocator + AllocPolicy>(list: &MyList<i32, A>) -> Vec<i32> {
        verify_all_links(list.header());
        list.iter().copied().collect()
    }

    /// A constructor that fails for negative values.
    struct Checked(i32);

    unsafe impl TryNew for Checked {
        type Output = i32;
        type Error = i32;

        unsafe fn try_new(self, this: Pin<&mut MaybeUninit<i32>>) -> Result<(), i32> {
            if self.0 < 0 {
                return Err(self.0);
            }

            this.get_unchecked_mut().write(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_append() {
        // Append two lists of equal size.
        let mut list1 = MyList::new();
        let mut list2 = MyList::new();

        for i in 0..10 {
            list1.push_back(i);
            list2.push_back(i);
        }

        list1.append(&mut list2);

        assert_eq!(list1.len(), 20);
        assert_eq!(list2.len(), 0);

        for (i, element) in (0..10).chain(0..10).zip(list1.iter()) {
            assert_eq!(i, *element);
        }

        verify_all_links(list1.header());

        // Append the final list to an empty list.
        let mut list3 = MyList::new();
        list3.append(&mut list1);

        assert_eq!(list3.len(), 20);
        assert_eq!(list1.len(), 0);

        verify_all_links(list3.header());
        verify_all_links(list1.header());
    }

    #[test]
    #[should_panic(expected = "cannot append lists whose allocators compare unequal")]
    fn test_append_unequal_allocators() {
        let mut list1 = MyList::new_in(TrackingAlloc::new(1));
        let mut list2 = MyList::new_in(TrackingAlloc::new(2));
        list2.push_back(1);

        list1.append(&mut list2);
    }

    #[test]
    fn test_assign() {
        let mut list = MyList::from([1, 2, 3, 4]);

        list.assign([7, 8]);
        assert_eq!(values(&list), [7, 8]);

        list.assign(10..15);
        assert_eq!(values(&list), [10, 11, 12, 13, 14]);

        list.assign_n(3, &0);
        assert_eq!(values(&list), [0, 0, 0]);

        list.assign(iter::empty());
        assert!(list.is_empty());
        verify_all_links(list.header());
    }

    #[test]
    fn test_back_and_front() {
        let mut list = MyList::new();
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);

        for i in 0..=3 {
            list.push_back(i);
        }

        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.back_mut(), Some(&mut 3));
        assert_eq!(list.front(), Some(&0));
        assert_eq!(list.front_mut(), Some(&mut 0));

        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 13;
        assert_eq!(values(&list), [10, 1, 2, 13]);
    }

    #[test]
    fn test_clone() {
        let alloc = TrackingAlloc::new(1);
        let list = MyList::from_iter_in(0..5, alloc.clone());

        let copy = list.clone();
        assert_eq!(copy, list);
        assert_eq!(copy.allocator().id(), 1);
        verify_all_links(copy.header());

        let other = list.clone_in(alloc.sibling(2));
        assert_eq!(other, list);
        assert_eq!(other.allocator().id(), 2);

        drop(copy);
        drop(other);
        drop(list);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_clone_from_keeps_non_propagating_allocator() {
        let source = MyList::from_iter_in(0..3, TrackingAlloc::new(1));
        let mut target = MyList::from_iter_in(10..20, TrackingAlloc::new(2));

        target.clone_from(&source);
        assert_eq!(values(&target), [0, 1, 2]);
        assert_eq!(target.allocator().id(), 2);
    }

    #[test]
    fn test_clone_from_propagates_allocator() {
        let old_alloc = PropagatingAlloc::new(2);
        let source = MyList::from_iter_in(0..3, PropagatingAlloc::new(1));
        let mut target = MyList::from_iter_in(10..20, old_alloc.clone());

        target.clone_from(&source);
        assert_eq!(values(&target), [0, 1, 2]);
        assert_eq!(target.allocator().id(), 1);

        // Everything of the old allocator has been released.
        assert_eq!(old_alloc.live(), 0);
    }

    #[test]
    fn test_clone_panic_leaves_no_leaks() {
        let counter = Rc::new(Cell::new(0));
        let alloc = TrackingAlloc::new(1);

        let mut list = MyList::new_in(alloc.clone());
        list.push_back(Tracked::new(1, &counter));
        list.push_back(Tracked::new(2, &counter));
        list.push_back(Tracked::poisoned(3, &counter));

        let result = panic::catch_unwind(AssertUnwindSafe(|| list.clone()));
        assert!(result.is_err());

        assert_eq!(counter.get(), 3);
        drop(list);
        assert_eq!(counter.get(), 0);
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_comparisons() {
        let a = MyList::from([1, 2, 3]);
        let b = MyList::from([1, 2, 4]);
        let c = MyList::from([1, 2]);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a < b);
        assert!(c < a);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert!(a.contains(&3));
        assert!(!a.contains(&4));
        assert_eq!(alloc::format!("{a:?}"), "[1, 2, 3]");
    }

    #[test]
    fn test_drop_releases_everything() {
        let alloc = TrackingAlloc::new(1);

        {
            let mut list = MyList::new_in(alloc.clone());
            assert_eq!(alloc.live(), 1);

            for i in 0..10 {
                list.push_back(i);
            }
            assert_eq!(alloc.live(), 11);

            list.pop_front();
            list.truncate(5);
            assert_eq!(alloc.live(), 6);
        }

        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_emplace() {
        let mut list = MyList::new();

        *list.emplace_back(new::of(2)) += 1;
        list.emplace_front(new::by(|| 1));
        list.emplace_back(new::of(4));
        assert_eq!(values(&list), [1, 3, 4]);

        assert_eq!(list.try_emplace_back(Checked(5)), Ok(&mut 5));
        assert_eq!(list.try_emplace_front(Checked(0)), Ok(&mut 0));
        assert_eq!(values(&list), [0, 1, 3, 4, 5]);
    }

    #[test]
    fn test_emplace_failure_leaves_list_unchanged() {
        let alloc = TrackingAlloc::new(1);
        let mut list = MyList::from_iter_in([1, 2], alloc.clone());
        let live = alloc.live();

        assert_eq!(
            list.try_emplace_back(Checked(-1)),
            Err(ConstructError::Construct(-1))
        );
        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), live);

        alloc.fail_after(0);
        assert!(matches!(
            list.try_emplace_front(Checked(3)),
            Err(ConstructError::Alloc(AllocError::OutOfMemory { .. }))
        ));
        assert_eq!(list.try_push_back(3), Err(list_alloc_error()));
        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), live);
        alloc.heal();

        list.push_back(3);
        assert_eq!(values(&list), [1, 2, 3]);
    }

    fn list_alloc_error() -> AllocError {
        AllocError::OutOfMemory {
            layout: core::alloc::Layout::new::<ListNode<i32>>(),
        }
    }

    #[test]
    fn test_filter() {
        let list = MyList::from_iter_in(0..10, TrackingAlloc::new(4));
        let evens = list.filter(|x| x % 2 == 0);

        assert_eq!(values(&evens), [0, 2, 4, 6, 8]);
        assert_eq!(evens.allocator().id(), 4);
        assert_eq!(list.len(), 10);
    }

    #[test]
    fn test_from_list_in() {
        let alloc1 = TrackingAlloc::new(1);
        let alloc2 = TrackingAlloc::new(2);

        // Equal allocators reuse the nodes.
        let list = MyList::from_iter_in(0..5, alloc1.clone());
        let total = alloc1.total();
        let list = MyList::from_list_in(list, alloc1.clone());
        assert_eq!(values(&list), [0, 1, 2, 3, 4]);
        assert_eq!(alloc1.total(), total + 1);

        // Unequal allocators move element by element.
        let list = MyList::from_list_in(list, alloc2.clone());
        assert_eq!(values(&list), [0, 1, 2, 3, 4]);
        assert_eq!(alloc1.live(), 0);
        assert_eq!(alloc2.live(), 6);
    }

    #[test]
    fn test_insert_iter_is_all_or_nothing() {
        let alloc = TrackingAlloc::new(1);
        let mut list = MyList::from_iter_in([1, 2], alloc.clone());
        let live = alloc.live();

        // The third allocation fails.
        alloc.fail_after(2);
        let result = list
            .cursor_end_mut()
            .try_insert_iter_before([3, 4, 5, 6].map(Ok::<i32, Infallible>));
        assert!(matches!(result, Err(ConstructError::Alloc(_))));
        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), live);
        alloc.heal();

        // An element error also rolls back.
        let result = list
            .cursor_front_mut()
            .try_insert_iter_before([Ok(3), Ok(4), Err("bad"), Ok(6)]);
        assert_eq!(result, Err(ConstructError::Construct("bad")));
        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), live);

        // And so does a panicking iterator.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            list.cursor_end_mut()
                .insert_iter_before((3..10).map(|x| if x == 6 { panic!("no six") } else { x }))
        }));
        assert!(result.is_err());
        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), live);
    }

    #[test]
    fn test_iter() {
        let mut list = MyList::from([1, 2, 3, 4, 5]);

        assert_eq!(list.iter().len(), 5);
        assert_eq!(list.iter().rev().copied().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        for element in list.iter_mut() {
            *element *= 10;
        }
        for element in &mut list {
            *element += 1;
        }
        assert_eq!(values(&list), [11, 21, 31, 41, 51]);

        let mut into_iter = list.into_iter();
        assert_eq!(into_iter.next_back(), Some(51));
        assert_eq!(into_iter.collect::<Vec<_>>(), [11, 21, 31, 41]);
    }

    #[test]
    fn test_merge() {
        let mut list1 = MyList::from([1, 3, 5]);
        let mut list2 = MyList::from([2, 3, 4]);

        list1.merge(&mut list2);

        assert_eq!(values(&list1), [1, 2, 3, 3, 4, 5]);
        assert!(list2.is_empty());
        verify_all_links(list2.header());

        // Merging an empty list or into an empty list.
        list1.merge(&mut list2);
        assert_eq!(list1.len(), 6);
        list2.merge(&mut list1);
        assert_eq!(values(&list2), [1, 2, 3, 3, 4, 5]);
        assert!(list1.is_empty());
    }

    #[test]
    fn test_merge_is_stable() {
        let mut list1 = MyList::from([(1, 'a'), (2, 'a'), (2, 'b'), (3, 'a')]);
        let mut list2 = MyList::from([(0, 'x'), (2, 'x'), (3, 'x'), (4, 'x')]);

        list1.merge_by(&mut list2, |a, b| a.0.cmp(&b.0));

        assert_eq!(
            list1.iter().copied().collect::<Vec<_>>(),
            [
                (0, 'x'),
                (1, 'a'),
                (2, 'a'),
                (2, 'b'),
                (2, 'x'),
                (3, 'a'),
                (3, 'x'),
                (4, 'x')
            ]
        );
    }

    #[test]
    #[should_panic(expected = "cannot merge lists whose allocators compare unequal")]
    fn test_merge_unequal_allocators() {
        let mut list1 = MyList::from_iter_in([1], TrackingAlloc::new(1));
        let mut list2 = MyList::from_iter_in([2], TrackingAlloc::new(2));
        list1.merge(&mut list2);
    }

    #[test]
    fn test_move_assign() {
        let alloc1 = TrackingAlloc::new(1);
        let alloc2 = TrackingAlloc::new(2);

        // Equal allocators: the nodes are taken over.
        let mut target = MyList::from_iter_in([9, 9, 9], alloc1.clone());
        let source = MyList::from_iter_in(0..4, alloc1.clone());
        let total = alloc1.total();
        target.move_assign(source);
        assert_eq!(values(&target), [0, 1, 2, 3]);
        assert_eq!(alloc1.total(), total);
        assert_eq!(alloc1.live(), 5);

        // Unequal allocators: the elements are moved into new nodes of the target's allocator.
        let source = MyList::from_iter_in(10..13, alloc2.clone());
        target.move_assign(source);
        assert_eq!(values(&target), [10, 11, 12]);
        assert_eq!(target.allocator().id(), 1);
        assert_eq!(alloc1.live(), 4);
        assert_eq!(alloc2.live(), 0);
    }

    #[test]
    fn test_move_assign_propagates_allocator() {
        let alloc1 = PropagatingAlloc::new(1);
        let alloc2 = PropagatingAlloc::new(2);

        let mut target = MyList::from_iter_in([9, 9, 9], alloc1.clone());
        let source = MyList::from_iter_in(0..4, alloc2.clone());
        target.move_assign(source);

        assert_eq!(values(&target), [0, 1, 2, 3]);
        assert_eq!(target.allocator().id(), 2);
        assert_eq!(alloc1.live(), 0);
        assert_eq!(alloc2.live(), 5);
    }

    #[test]
    fn test_pop_back() {
        let mut list = MyList::new();

        for i in 0..10 {
            list.push_back(i);
        }

        for i in (0..10).rev() {
            let element = list.pop_back().unwrap();
            assert_eq!(i, element);
            verify_all_links(list.header());
        }

        assert!(list.is_empty());
        assert_eq!(list.pop_back(), None);
    }

    #[test]
    fn test_pop_front() {
        let mut list = MyList::new();

        for i in 0..10 {
            list.push_back(i);
        }

        for i in 0..10 {
            let element = list.pop_front().unwrap();
            assert_eq!(i, element);
            verify_all_links(list.header());
        }

        assert!(list.is_empty());
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn test_push_back() {
        let mut list = MyList::new();

        for i in 0..10 {
            list.push_back(i);
        }

        assert_eq!(list.len(), 10);

        for (i, element) in (0..10).zip(list.iter()) {
            assert_eq!(i, *element);
        }

        verify_all_links(list.header());
    }

    #[test]
    fn test_push_front() {
        let mut list = MyList::new();

        for i in 0..10 {
            list.push_front(i);
        }

        assert_eq!(list.len(), 10);

        for (i, element) in (0..10).rev().zip(list.iter()) {
            assert_eq!(i, *element);
        }

        verify_all_links(list.header());
    }

    #[test]
    fn test_remove_if() {
        let counter = Rc::new(Cell::new(0));
        let mut list = MyList::new();
        for i in 1..=6 {
            list.push_back(Tracked::new(i, &counter));
        }

        let removed = list.remove_if(|element| element.value % 2 == 0);

        assert_eq!(removed, 3);
        assert_eq!(counter.get(), 3);
        assert_eq!(
            list.iter().map(|element| element.value).collect::<Vec<_>>(),
            [1, 3, 5]
        );
        verify_all_links(list.header());

        let mut list = MyList::from([1, 2, 1, 3, 1]);
        assert_eq!(list.remove(&1), 3);
        assert_eq!(values(&list), [2, 3]);
        assert_eq!(list.remove(&7), 0);
    }

    #[test]
    fn test_resize() {
        let mut list = MyList::from([1, 2, 3]);

        list.resize(5, 0);
        assert_eq!(values(&list), [1, 2, 3, 0, 0]);

        list.resize(2, 0);
        assert_eq!(values(&list), [1, 2]);

        let mut next = 10;
        list.resize_with(4, || {
            next += 1;
            next
        });
        assert_eq!(values(&list), [1, 2, 11, 12]);

        list.truncate(10);
        assert_eq!(list.len(), 4);
        list.truncate(0);
        assert!(list.is_empty());

        let list = MyList::<i32>::with_default_in(3, Global);
        assert_eq!(values(&list), [0, 0, 0]);
        let list = MyList::from_elem_in(2, &7, Global);
        assert_eq!(values(&list), [7, 7]);
    }

    #[test]
    fn test_retain() {
        let mut list = MyList::new();

        for i in 0..10 {
            list.push_back(i);
        }

        // Keep only the even elements.
        list.retain(|element| element % 2 == 0);

        assert_eq!(list.len(), 5);

        for (i, element) in (0..10).step_by(2).zip(list.iter()) {
            assert_eq!(i, *element);
        }

        verify_all_links(list.header());

        // Keep only the first and last of the remaining elements.
        list.retain(|element| *element == 0 || *element == 8);

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&0));
        assert_eq!(iter.next(), Some(&8));
        assert!(matches!(iter.next(), None));
    }

    #[test]
    fn test_reverse() {
        let mut list = MyList::from([1, 2, 3, 4, 5]);
        list.reverse();
        assert_eq!(values(&list), [5, 4, 3, 2, 1]);

        let mut list = MyList::<i32>::new();
        list.reverse();
        assert!(values(&list).is_empty());
    }

    #[test]
    fn test_sort() {
        let mut list = MyList::from([5, 3, 9, 1, 1, 8, 0, -4, 7]);
        list.sort();
        assert_eq!(values(&list), [-4, 0, 1, 1, 3, 5, 7, 8, 9]);

        list.sort_by(|a, b| b.cmp(a));
        assert_eq!(values(&list), [9, 8, 7, 5, 3, 1, 1, 0, -4]);

        list.sort_by_key(|x| x.abs());
        assert_eq!(values(&list), [0, 1, 1, 3, -4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_sort_keeps_references_attached() {
        let mut list = MyList::from([3, 1, 2]);
        let addresses: Vec<*const i32> = list.iter().map(|x| x as *const i32).collect();

        list.sort();

        let sorted: Vec<*const i32> = list.iter().map(|x| x as *const i32).collect();
        assert_eq!(sorted, [addresses[1], addresses[2], addresses[0]]);
    }

    #[test]
    fn test_sort_panic_keeps_all_elements() {
        let counter = Rc::new(Cell::new(0));
        let mut list = MyList::new();
        for i in (0..50).rev() {
            list.push_back(Tracked::new(i, &counter));
        }

        let mut comparisons = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            list.sort_by(|a, b| {
                comparisons += 1;
                if comparisons == 40 {
                    panic!("comparison failed");
                }
                a.value.cmp(&b.value)
            })
        }));

        assert!(result.is_err());
        assert_eq!(list.len(), 50);
        verify_all_links(list.header());

        let mut remaining: Vec<i32> = list.iter().map(|element| element.value).collect();
        remaining.sort();
        assert_eq!(remaining, (0..50).collect::<Vec<_>>());
        assert_eq!(counter.get(), 50);
    }

    fn tracked_list(values: &[i32], counter: &Rc<Cell<isize>>) -> MyList<Tracked> {
        values
            .iter()
            .map(|&value| Tracked::new(value, counter))
            .collect()
    }

    fn tracked_values<A: Allocator + AllocPolicy>(list: &MyList<Tracked, A>) -> Vec<i32> {
        verify_all_links(list.header());
        list.iter().map(|element| element.value).collect()
    }

    #[test]
    fn test_merge_panic_keeps_all_elements() {
        let counter = Rc::new(Cell::new(0));
        let mut a = tracked_list(&[1, 3, 5, 7, 9], &counter);
        let mut b = tracked_list(&[2, 4, 6, 8, 10], &counter);

        let mut comparisons = 0;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            a.merge_by(&mut b, |x, y| {
                comparisons += 1;
                if comparisons == 4 {
                    panic!("comparison failed");
                }
                x.value.cmp(&y.value)
            })
        }));
        assert!(result.is_err());

        let mut remaining = tracked_values(&a);
        remaining.extend(tracked_values(&b));
        assert_eq!(a.len() + b.len(), 10);
        assert_eq!(remaining.len(), 10);
        assert_eq!(counter.get(), 10);

        remaining.sort();
        assert_eq!(remaining, (1..=10).collect::<Vec<_>>());

        drop((a, b));
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_remove_if_panic_keeps_list_consistent() {
        let counter = Rc::new(Cell::new(0));
        let mut list = tracked_list(&[1, 2, 3, 4, 5, 6], &counter);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            list.remove_if(|element| {
                if element.value == 5 {
                    panic!("predicate failed");
                }
                element.value % 2 == 0
            })
        }));
        assert!(result.is_err());

        // The elements matched before the panic are gone, everything else stays linked.
        assert_eq!(tracked_values(&list), [1, 3, 5, 6]);
        assert_eq!(list.len(), 4);
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn test_unique_by_panic_keeps_list_consistent() {
        let counter = Rc::new(Cell::new(0));
        let mut list = tracked_list(&[1, 1, 2, 2, 3, 3], &counter);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            list.unique_by(|kept, next| {
                if next.value == 3 {
                    panic!("comparison failed");
                }
                kept.value == next.value
            })
        }));
        assert!(result.is_err());

        let remaining = tracked_values(&list);
        assert_eq!(&remaining[..2], [1, 2]);
        assert_eq!(list.len(), remaining.len());
        assert_eq!(counter.get(), list.len() as isize);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let alloc = TrackingAlloc::new(1);
        let mut list = MyList::from_iter_in(0..5, alloc.clone());
        assert_eq!(alloc.live(), 6);

        list.clear();
        list.clear();
        verify_all_links(list.header());
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.iter().next(), None);

        // Only the sentinel is left.
        assert_eq!(alloc.live(), 1);

        list.push_back(7);
        assert_eq!(values(&list), [7]);
    }

    #[test]
    fn test_splice_within() {
        let mut list = MyList::from([0, 1, 2, 3, 4, 5]);

        list.splice_within(5, 1, 3);
        assert_eq!(values(&list), [0, 3, 4, 1, 2, 5]);

        list.splice_within(0, 4, 6);
        assert_eq!(values(&list), [2, 5, 0, 3, 4, 1]);

        list.splice_within(6, 0, 2);
        assert_eq!(values(&list), [0, 3, 4, 1, 2, 5]);

        // No-ops.
        list.splice_within(2, 2, 4);
        list.splice_within(4, 2, 4);
        list.splice_within(1, 3, 3);
        assert_eq!(values(&list), [0, 3, 4, 1, 2, 5]);
    }

    #[test]
    #[should_panic(expected = "in front of its own element")]
    fn test_splice_within_overlapping() {
        let mut list = MyList::from([0, 1, 2, 3]);
        list.splice_within(2, 1, 3);
    }

    #[test]
    fn test_split_off() {
        let mut list = MyList::from_iter_in(0..6, TrackingAlloc::new(1));

        let tail = list.split_off(4);
        assert_eq!(values(&list), [0, 1, 2, 3]);
        assert_eq!(values(&tail), [4, 5]);

        let all = list.split_off(0);
        assert!(values(&list).is_empty());
        assert_eq!(values(&all), [0, 1, 2, 3]);

        let none = list.split_off(0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_swap() {
        let alloc = TrackingAlloc::new(1);
        let mut list1 = MyList::from_iter_in([1, 2, 3], alloc.clone());
        let mut list2 = MyList::from_iter_in([4], alloc.clone());
        let mut empty = MyList::new_in(alloc.clone());

        list1.swap(&mut list2);
        assert_eq!(values(&list1), [4]);
        assert_eq!(values(&list2), [1, 2, 3]);

        list2.swap(&mut empty);
        assert!(values(&list2).is_empty());
        assert_eq!(values(&empty), [1, 2, 3]);

        drop((list1, list2, empty));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_swap_propagates_allocator() {
        let mut list1 = MyList::from_iter_in([1, 2], PropagatingAlloc::new(1));
        let mut list2 = MyList::from_iter_in([3], PropagatingAlloc::new(2));

        list1.swap(&mut list2);

        assert_eq!(values(&list1), [3]);
        assert_eq!(list1.allocator().id(), 2);
        assert_eq!(values(&list2), [1, 2]);
        assert_eq!(list2.allocator().id(), 1);
    }

    #[test]
    #[should_panic(expected = "cannot swap lists whose allocators compare unequal")]
    fn test_swap_unequal_allocators() {
        let mut list1 = MyList::<i32, _>::new_in(TrackingAlloc::new(1));
        let mut list2 = MyList::<i32, _>::new_in(TrackingAlloc::new(2));
        list1.swap(&mut list2);
    }

    #[test]
    fn test_unique() {
        let mut list = MyList::from([1, 1, 2, 3, 3, 3, 1, 4, 4]);
        assert_eq!(list.unique(), 4);
        assert_eq!(values(&list), [1, 2, 3, 1, 4]);

        // Comparisons are made against the last retained element.
        let mut list = MyList::from([1, 2, 3, 4, 10, 11, 12]);
        assert_eq!(list.unique_by(|kept, next| next - kept < 3), 4);
        assert_eq!(values(&list), [1, 4, 10]);

        let mut list = MyList::<i32>::new();
        assert_eq!(list.unique(), 0);
    }

    proptest! {
        #[test]
        fn proptest_sort_matches_stable_slice_sort(input in prop::collection::vec((0..8i32, any::<u16>()), 0..300)) {
            let mut list = MyList::from_iter(input.iter().copied());
            list.sort_by_key(|pair| pair.0);
            verify_all_links(list.header());

            let mut expected = input;
            expected.sort_by_key(|pair| pair.0);
            prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), expected);
        }

        #[test]
        fn proptest_merge_of_sorted_lists(mut a in prop::collection::vec(-50..50i32, 0..100), mut b in prop::collection::vec(-50..50i32, 0..100)) {
            a.sort();
            b.sort();

            let mut list1 = MyList::from_iter(a.iter().copied());
            let mut list2 = MyList::from_iter(b.iter().copied());
            list1.merge(&mut list2);

            let mut expected = Vec::new();
            expected.extend_from_slice(&a);
            expected.extend_from_slice(&b);
            expected.sort();

            prop_assert_eq!(values(&list1), expected);
            prop_assert!(list2.is_empty());
        }
    }
}
