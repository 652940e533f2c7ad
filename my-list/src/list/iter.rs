// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::Allocator;

use super::allocating::MyList;
use super::base::{Links, ListHeader, ListNode};
use crate::traits::AllocPolicy;

/// Iterator over the elements of a doubly linked list.
///
/// This iterator is returned from the [`MyList::iter`] function.
pub struct Iter<'a, T> {
    head: *mut Links,
    tail: *mut Links,
    len: usize,
    marker: PhantomData<&'a ListNode<T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(super) unsafe fn new(header: *mut ListHeader) -> Self {
        Self {
            head: (*header).links.next,
            tail: (*header).links.prev,
            len: (*header).size,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        // The counter tells us when both ends have met, so we never step onto the sentinel.
        if self.len == 0 {
            None
        } else {
            unsafe {
                let node = self.head;
                self.head = (*node).next;
                self.len -= 1;
                Some(ListNode::value(node))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<&'a T> {
        self.next_back()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            None
        } else {
            unsafe {
                let node = self.tail;
                self.tail = (*node).prev;
                self.len -= 1;
                Some(ListNode::value(node))
            }
        }
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

unsafe impl<'a, T: Sync> Send for Iter<'a, T> {}
unsafe impl<'a, T: Sync> Sync for Iter<'a, T> {}

/// Mutable iterator over the elements of a doubly linked list.
///
/// This iterator is returned from the [`MyList::iter_mut`] function.
pub struct IterMut<'a, T> {
    head: *mut Links,
    tail: *mut Links,
    len: usize,
    marker: PhantomData<&'a mut ListNode<T>>,
}

impl<'a, T> IterMut<'a, T> {
    pub(super) unsafe fn new(header: *mut ListHeader) -> Self {
        Self {
            head: (*header).links.next,
            tail: (*header).links.prev,
            len: (*header).size,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            None
        } else {
            unsafe {
                let node = self.head;
                self.head = (*node).next;
                self.len -= 1;
                Some(&mut *ListNode::value_ptr(node))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<&'a mut T> {
        self.next_back()
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            None
        } else {
            unsafe {
                let node = self.tail;
                self.tail = (*node).prev;
                self.len -= 1;
                Some(&mut *ListNode::value_ptr(node))
            }
        }
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {}

impl<'a, T> FusedIterator for IterMut<'a, T> {}

unsafe impl<'a, T: Send> Send for IterMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for IterMut<'a, T> {}

/// Owning iterator over the elements of a doubly linked list.
///
/// This iterator is returned from the `into_iter` function of [`MyList`].
/// Every element is moved out of its node, and the node is deallocated right away.
pub struct IntoIter<T, A: Allocator + AllocPolicy> {
    list: MyList<T, A>,
}

impl<T, A> IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    pub(super) fn new(list: MyList<T, A>) -> Self {
        Self { list }
    }
}

impl<T, A> Iterator for IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, A> DoubleEndedIterator for IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
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
        f.debug_tuple("IntoIter").field(&self.list).finish()
    }
}
