// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use allocator_api2::alloc::Allocator;
use moveit::new::TryNew;
use moveit::New;

use super::allocating::MyForwardList;
use super::base::{FLinks, FNode};
use crate::error::{handle_alloc_failure, AllocError, ConstructError};
use crate::memory::pinned_slot;
use crate::traits::AllocPolicy;

/// A cursor over a [`MyForwardList`] that can insert, remove, and splice elements behind its
/// position.
///
/// The cursor points either at an element or at the position in front of the first element.
/// As the list is singly linked, all modifications take place behind the cursor.
pub struct CursorMut<'a, T, A: Allocator + AllocPolicy> {
    list: &'a mut MyForwardList<T, A>,
    head: *mut FLinks,
    current: *mut FLinks,
}

impl<'a, T, A> CursorMut<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    pub(super) fn new(list: &'a mut MyForwardList<T, A>, head: *mut FLinks) -> Self {
        Self {
            list,
            head,
            current: head,
        }
    }

    /// Returns a mutable reference to the element the cursor points at, or `None` in front of
    /// the first element.
    pub fn current(&mut self) -> Option<&mut T> {
        (!self.is_before_front()).then(|| unsafe { &mut *FNode::<T>::value_ptr(self.current) })
    }

    /// Constructs a new element in place behind the current position and returns a reference
    /// to it.
    pub fn emplace_after<N>(&mut self, new: N) -> &mut T
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let node = self.list.emplace_raw_after(self.current, new);
        unsafe { &mut *FNode::<T>::value_ptr(node) }
    }

    /// Inserts an element behind the current position.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn insert_after(&mut self, value: T) {
        self.try_insert_after(value)
            .unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Inserts all elements of `iter` behind the current position, keeping their order, and
    /// returns how many were inserted.
    ///
    /// The list stays unchanged if the iterator panics.
    pub fn insert_iter_after<I>(&mut self, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        self.list.insert_iter_raw(self.current, iter)
    }

    /// Returns `true` if the cursor points in front of the first element.
    pub fn is_before_front(&self) -> bool {
        self.current == self.head
    }

    /// Moves the cursor to the next element and returns `true`, or returns `false` if the cursor
    /// already points at the last element.
    pub fn move_next(&mut self) -> bool {
        let next = unsafe { (*self.current).next };
        if next.is_null() {
            return false;
        }

        self.current = next;
        true
    }

    /// Moves the cursor to the last element, or leaves it in front of the first element if the
    /// list is empty.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn move_to_last(&mut self) {
        while self.move_next() {}
    }

    /// Returns a mutable reference to the element behind the current position, or `None` if there
    /// is none.
    pub fn peek_next(&mut self) -> Option<&mut T> {
        let next = unsafe { (*self.current).next };
        (!next.is_null()).then(|| unsafe { &mut *FNode::<T>::value_ptr(next) })
    }

    /// Removes the element behind the current position and returns it, or `None` if there is none.
    ///
    /// This operation computes in *O*(*1*) time.
    pub fn remove_after(&mut self) -> Option<T> {
        self.list.take_after(self.current)
    }

    /// Drops up to `n` elements behind the current position and returns how many were removed.
    pub fn remove_after_n(&mut self, n: usize) -> usize {
        let mut count = 0;

        while count < n && self.list.erase_after(self.current) {
            count += 1;
        }

        count
    }

    /// Moves all elements of `other` behind the current position, keeping their order.
    ///
    /// This operation computes in *O*(*m*) time, where *m* is the length of `other`.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_after(&mut self, other: &mut MyForwardList<T, A>) {
        self.list.assert_same_allocator(other, "splice");
        unsafe { FLinks::splice_all_after(self.current, other.head_mut()) };
    }

    /// Moves the element behind the position of `source` behind the current position.
    ///
    /// Returns `false` and does nothing if there is no element behind `source`.
    ///
    /// This operation computes in *O*(*1*) time.
    ///
    /// # Panics
    ///
    /// Panics if the allocators of both lists compare unequal.
    pub fn splice_next_from(&mut self, source: &mut CursorMut<'_, T, A>) -> bool {
        self.list.assert_same_allocator(source.list, "splice");

        let node = unsafe { (*source.current).next };
        if node.is_null() {
            return false;
        }

        unsafe { FLinks::transfer_after(self.current, source.current, node) };
        true
    }

    /// Constructs a new element in place behind the current position and returns a reference to
    /// it, or returns an error if either the allocation or the constructor fails.
    ///
    /// On error, the list is unchanged.
    pub fn try_emplace_after<N>(&mut self, new: N) -> Result<&mut T, ConstructError<N::Error>>
    where
        N: TryNew<Output = T>,
        T: Unpin,
    {
        let node = self
            .list
            .try_link_new_after(self.current, |slot| unsafe { new.try_new(pinned_slot(slot)) })?;
        Ok(unsafe { &mut *FNode::<T>::value_ptr(node) })
    }

    /// Inserts an element behind the current position, or returns an error if no node can be
    /// allocated.
    pub fn try_insert_after(&mut self, value: T) -> Result<(), AllocError> {
        self.list
            .try_link_value_after(self.current, value)
            .map(|_| ())
    }

    /// Inserts all elements of `iter` behind the current position and returns how many were
    /// inserted, or returns the first error.
    ///
    /// If an element is an error or an allocation fails, the list is unchanged.
    pub fn try_insert_iter_after<I, E>(&mut self, iter: I) -> Result<usize, ConstructError<E>>
    where
        I: IntoIterator<Item = Result<T, E>>,
    {
        self.list.try_insert_iter_raw(self.current, iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_alloc::TrackingAlloc;
    use alloc::vec::Vec;
    use core::convert::Infallible;
    use moveit::new;

    fn values<A: Allocator + AllocPolicy>(list: &MyForwardList<i32, A>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_cursor_insert() {
        let mut list = MyForwardList::new();

        let mut cursor = list.cursor_before_front_mut();
        assert!(cursor.is_before_front());
        assert_eq!(cursor.current(), None);
        assert!(!cursor.move_next());

        cursor.insert_after(3);
        cursor.insert_after(1);
        assert_eq!(cursor.peek_next(), Some(&mut 1));

        assert!(cursor.move_next());
        assert_eq!(cursor.current(), Some(&mut 1));
        assert_eq!(*cursor.emplace_after(new::of(2)), 2);

        cursor.move_to_last();
        assert_eq!(cursor.current(), Some(&mut 3));
        assert_eq!(cursor.insert_iter_after([4, 5, 6]), 3);
        assert_eq!(cursor.try_emplace_after(new::of(7)).map(|x| *x), Ok(7));
        assert_eq!(cursor.try_insert_after(8), Ok(()));

        assert_eq!(values(&list), [1, 2, 3, 8, 7, 4, 5, 6]);
    }

    #[test]
    fn test_cursor_insert_iter_is_all_or_nothing() {
        let alloc = TrackingAlloc::new(1);
        let mut list = MyForwardList::from_iter_in([1, 2], alloc.clone());

        let mut cursor = list.cursor_before_front_mut();
        cursor.move_next();

        let result = cursor.try_insert_iter_after([Ok(7), Err("bad"), Ok(9)]);
        assert_eq!(result, Err(ConstructError::Construct("bad")));

        alloc.fail_after(1);
        let result = cursor.try_insert_iter_after([7, 8].map(Ok::<i32, Infallible>));
        assert!(matches!(result, Err(ConstructError::Alloc(_))));
        alloc.heal();

        assert_eq!(values(&list), [1, 2]);
        assert_eq!(alloc.live(), 2);
    }

    #[test]
    fn test_cursor_remove() {
        let mut list = MyForwardList::from([0, 1, 2, 3, 4, 5]);

        let mut cursor = list.cursor_before_front_mut();
        assert_eq!(cursor.remove_after(), Some(0));
        cursor.move_next();
        assert_eq!(cursor.remove_after_n(2), 2);
        assert_eq!(cursor.peek_next(), Some(&mut 4));

        cursor.move_to_last();
        assert_eq!(cursor.remove_after(), None);
        assert_eq!(cursor.remove_after_n(3), 0);

        assert_eq!(values(&list), [1, 4, 5]);
    }

    #[test]
    fn test_cursor_splice() {
        let mut list1 = MyForwardList::from([1, 5]);
        let mut list2 = MyForwardList::from([2, 3, 4]);
        let mut list3 = MyForwardList::from([6, 7]);

        {
            let mut target = list1.cursor_before_front_mut();
            target.move_next();

            let mut source = list2.cursor_before_front_mut();
            assert!(source.move_next());
            assert!(target.splice_next_from(&mut source));
            assert_eq!(source.peek_next(), Some(&mut 4));

            target.move_next();
            target.splice_after(&mut list3);
            target.move_to_last();
            assert_eq!(target.current(), Some(&mut 5));

            source.move_to_last();
            assert!(!target.splice_next_from(&mut source));
        }

        assert_eq!(values(&list1), [1, 3, 6, 7, 5]);
        assert_eq!(values(&list2), [2, 4]);
        assert!(list3.is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot splice lists whose allocators compare unequal")]
    fn test_cursor_splice_unequal_allocators() {
        let mut list1 = MyForwardList::from_iter_in([1], TrackingAlloc::new(1));
        let mut list2 = MyForwardList::from_iter_in([2], TrackingAlloc::new(2));

        list1.cursor_before_front_mut().splice_after(&mut list2);
    }
}
