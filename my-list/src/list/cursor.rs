// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use allocator_api2::alloc::Allocator;
use moveit::new::TryNew;
use moveit::New;

use super::allocating::MyList;
use super::base::{Links, ListHeader, ListNode};
use crate::error::{handle_alloc_failure, AllocError, ConstructError};
use crate::memory::pinned_slot;
use crate::traits::AllocPolicy;

/// A cursor over a [`MyList`], pointing either at an element or at the end of the list.
///
/// The end is the position behind the last element (and in front of the first one, as the
/// list is circular).
/// Moving past either end wraps around.
pub struct Cursor<'a, T, A: Allocator + AllocPolicy> {
    list: &'a MyList<T, A>,
    current: *mut Links,
    index: usize,
}

impl<'a, T, A> Cursor<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    pub(super) fn new(list: &'a MyList<T, A>, current: *mut Links, index: usize) -> Self {
        Self {
            list,
            current,
            index,
        }
    }

    /// Returns a reference to the element the cursor points at, or `None` at the end.
    pub fn current(&self) -> Option<&'a T> {
        (!self.is_end()).then(|| unsafe { ListNode::<T>::value(self.current) })
    }

    /// Returns the index of the current element, or `None` at the end.
    pub fn index(&self) -> Option<usize> {
        (!self.is_end()).then_some(self.index)
    }

    /// Returns `true` if the cursor points at the end of the list.
    pub fn is_end(&self) -> bool {
        self.current == self.list.end_marker()
    }

    /// Returns the list the cursor belongs to.
    pub fn list(&self) -> &'a MyList<T, A> {
        self.list
    }

    /// Moves the cursor to the next element, or from the last element to the end, or from the
    /// end to the first element.
    pub fn move_next(&mut self) {
        let was_end = self.is_end();
        self.current = unsafe { (*self.current).next };
        self.index = if was_end { 0 } else { self.index + 1 };
    }

    /// Moves the cursor to the previous element, or from the first element to the end, or from
    /// the end to the last element.
    pub fn move_prev(&mut self) {
        let was_end = self.is_end();
        self.current = unsafe { (*self.current).prev };
        self.index = step_back(self.index, was_end, self.is_end(), self.list.len());
    }

    /// Returns a reference to the element after the current one, or `None` if that is the end.
    pub fn peek_next(&self) -> Option<&'a T> {
        let next = unsafe { (*self.current).next };
        (next != self.list.end_marker()).then(|| unsafe { ListNode::<T>::value(next) })
    }

    /// Returns a reference to the element in front of the current one, or `None` if that is
    /// the end.
    pub fn peek_prev(&self) -> Option<&'a T> {
        let prev = unsafe { (*self.current).prev };
        (prev != self.list.end_marker()).then(|| unsafe { ListNode::<T>::value(prev) })
    }
}

impl<'a, T, A> Clone for Cursor<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

/// A cursor over a [`MyList`] that can insert, remove, and splice elements at its position.
///
/// The cursor points either at an element or at the end of the list, which is the position
/// behind the last element.
/// Insertions "before" the cursor take place in front of the current element, so inserting
/// before the end appends to the list.
pub struct CursorMut<'a, T, A: Allocator + AllocPolicy> {
    list: &'a mut MyList<T, A>,
    current: *mut Links,
    index: usize,
}

impl<'a, T, A> CursorMut<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    pub(super) fn new(list: &'a mut MyList<T, A>, current: *mut Links, index: usize) -> Self {
        Self {
            list,
            current,
            index,
        }
    }

    /// Returns a read-only cursor pointing at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(self.list, self.current, self.index)
    }

    /// Returns a mutable reference to the element the cursor points at, or `None` at the end.
    pub fn current(&mut self) -> Option<&mut T> {
        (!self.is_end()).then(|| unsafe { &mut *ListNode::<T>::value_ptr(self.current) })
    }

    /// Constructs a new element in place in front of the current position and returns a
    /// reference to it.
    ///
    /// See [`MyList::emplace_back`].
    pub fn emplace_before<N>(&mut self, new: N) -> &mut T
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let node = self.list.emplace_raw(self.current, new);

        self.index += 1;
        unsafe { &mut *ListNode::<T>::value_ptr(node) }
    }

    /// Returns the index of the current element, or `None` at the end.
    pub fn index(&self) -> Option<usize> {
        (!self.is_end()).then_some(self.index)
    }

    /// Inserts an element after the current one.
    /// At the end, this inserts at the front of the list.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn insert_after(&mut self, value: T) {
        let was_end = self.is_end();
        let next = unsafe { (*self.current).next };

        if let Err(err) = self.list.try_link_value(next, value) {
            handle_alloc_failure(err);
        }

        if was_end {
            self.index += 1;
        }
    }

    /// Inserts an element in front of the current one.
    /// At the end, this appends to the list.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn insert_before(&mut self, value: T) {
        self.try_insert_before(value)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Inserts all elements of `iter` in front of the current one and returns how many were
    /// inserted.
    ///
    /// The elements are linked into the list only after all of them have been allocated, so the
    /// list stays unchanged if the iterator panics.
    pub fn insert_iter_before<I>(&mut self, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let count = self.list.insert_iter_raw(self.current, iter);
        self.index += count;
        count
    }

    /// Returns `true` if the cursor points at the end of the list.
    pub fn is_end(&self) -> bool {
        self.current == self.list.end_marker()
    }

    /// Moves the cursor to the next element, or from the last element to the end, or from the
    /// end to the first element.
    pub fn move_next(&mut self) {
        let was_end = self.is_end();
        self.current = unsafe { (*self.current).next };
        self.index = if was_end { 0 } else { self.index + 1 };
    }

    /// Moves the cursor to the previous element, or from the first element to the end, or from
    /// the end to the last element.
    pub fn move_prev(&mut self) {
        let was_end = self.is_end();
        self.current = unsafe { (*self.current).prev };
        self.index = step_back(self.index, was_end, self.is_end(), self.list.len());
    }

    /// Returns a mutable reference to the element after the current one, or `None` if that is
    /// the end.
    pub fn peek_next(&mut self) -> Option<&mut T> {
        let next = unsafe { (*self.current).next };
        (next != self.list.end_marker()).then(|| unsafe { &mut *ListNode::<T>::value_ptr(next) })
    }

    /// Returns a mutable reference to the element in front of the current one, or `None` if
    /// that is the end.
    pub fn peek_prev(&mut self) -> Option<&mut T> {
        let prev = unsafe { (*self.current).prev };
        (prev != self.list.end_marker()).then(|| unsafe { &mut *ListNode::<T>::value_ptr(prev) })
    }

    /// Removes the current element and returns it, moving the cursor to the next position.
    /// Returns `None` at the end.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.is_end() {
            return None;
        }

        unsafe {
            let node = self.current;
            self.current = (*node).next;
            Some(self.list.unlink_take(node))
        }
    }

    /// Drops up to `n` elements starting with the current one and returns how many were
    /// removed.
    /// The cursor ends up on the position behind the last removed element.
    pub fn remove_current_n(&mut self, n: usize) -> usize {
        let end = self.list.end_marker();
        let mut count = 0;

        while count < n && self.current != end {
            unsafe {
                let node = self.current;
                self.current = (*node).next;
                self.list.erase_node(node);
            }
            count += 1;
        }

        count
    }

    /// Moves all elements of `other` behind the current one.
    /// At the end, they are inserted at the front of the list.
    ///
    /// This operation computes in *O*(*1*) time.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_after(&mut self, other: &mut MyList<T, A>) {
        self.list.assert_same_allocator(other, "splice");

        let was_end = self.is_end();
        let count = other.len();
        let next = unsafe { (*self.current).next };
        unsafe { ListHeader::splice_all(self.list.header(), next, other.header()) };

        if was_end {
            self.index += count;
        }
    }

    /// Moves all elements of `other` in front of the current one.
    /// At the end, they are appended to the list.
    ///
    /// This operation computes in *O*(*1*) time.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_before(&mut self, other: &mut MyList<T, A>) {
        self.list.assert_same_allocator(other, "splice");

        let count = other.len();
        unsafe { ListHeader::splice_all(self.list.header(), self.current, other.header()) };
        self.index += count;
    }

    /// Moves the element at the position of `source` in front of the current one.
    /// `source` then points at the element that followed the moved one.
    ///
    /// Returns `false` and does nothing if `source` points at the end of its list.
    ///
    /// This operation computes in *O*(*1*) time.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_current_from(&mut self, source: &mut CursorMut<'_, T, A>) -> bool {
        self.list.assert_same_allocator(source.list, "splice");

        if source.is_end() {
            return false;
        }

        unsafe {
            let node = source.current;
            source.current = (*node).next;
            ListHeader::splice_one(self.list.header(), self.current, source.list.header(), node);
        }

        self.index += 1;
        true
    }

    /// Moves up to `n` elements, starting at the position of `source`, in front of the current
    /// one and returns how many were moved.
    /// `source` then points at the position that followed the moved run.
    ///
    /// This operation computes in *O*(*n*) time, because the length of the run has to be counted.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_range_from(&mut self, source: &mut CursorMut<'_, T, A>, n: usize) -> usize {
        self.list.assert_same_allocator(source.list, "splice");

        let source_end = source.list.end_marker();
        let first = source.current;
        let mut last = first;
        let mut count = 0;

        while count < n && last != source_end {
            last = unsafe { (*last).next };
            count += 1;
        }

        unsafe {
            ListHeader::splice_run(
                self.list.header(),
                self.current,
                source.list.header(),
                first,
                last,
                count,
            );
        }

        source.current = last;
        self.index += count;
        count
    }

    /// Constructs a new element in place in front of the current position and returns a
    /// reference to it, or returns an error if either the allocation or the constructor fails.
    ///
    /// On error, the list is unchanged.
    pub fn try_emplace_before<N>(&mut self, new: N) -> Result<&mut T, ConstructError<N::Error>>
    where
        N: TryNew<Output = T>,
        T: Unpin,
    {
        let node = self.list.try_link_new(self.current, |slot| unsafe {
            new.try_new(pinned_slot(slot))
        })?;

        self.index += 1;
        Ok(unsafe { &mut *ListNode::<T>::value_ptr(node) })
    }

    /// Inserts an element in front of the current one, or returns an error if no node can be
    /// allocated.
    ///
    /// On error, the list is unchanged.
    pub fn try_insert_before(&mut self, value: T) -> Result<(), AllocError> {
        self.list.try_link_value(self.current, value)?;
        self.index += 1;
        Ok(())
    }

    /// Inserts all elements of `iter` in front of the current one and returns how many were
    /// inserted, or returns the first error.
    ///
    /// If an element is an error or an allocation fails, the list is unchanged.
    pub fn try_insert_iter_before<I, E>(&mut self, iter: I) -> Result<usize, ConstructError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        let count = self.list.try_insert_iter_raw(self.current, iter)?;
        self.index += count;
        Ok(count)
    }
}

/// Computes the index after moving backwards.
fn step_back(index: usize, was_end: bool, is_end: bool, len: usize) -> usize {
    if is_end {
        len
    } else if was_end {
        len - 1
    } else {
        index - 1
    }
}
