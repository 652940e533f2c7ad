// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::Allocator;

use super::allocating::MyForwardList;
use super::base::{FLinks, FNode};
use crate::traits::AllocPolicy;

/// Iterator over the elements of a singly linked list.
///
/// This iterator is returned from the [`MyForwardList::iter`] function.
pub struct Iter<'a, T> {
    current: *mut FLinks,
    marker: PhantomData<&'a FNode<T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(first: *mut FLinks) -> Self {
        Self {
            current: first,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.current.is_null() {
            None
        } else {
            unsafe {
                let element = FNode::<T>::value(self.current);
                self.current = (*self.current).next;
                Some(element)
            }
        }
    }
}

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

/// Mutable iterator over the elements of a singly linked list.
///
/// This iterator is returned from the [`MyForwardList::iter_mut`] function.
pub struct IterMut<'a, T> {
    current: *mut FLinks,
    marker: PhantomData<&'a mut FNode<T>>,
}

impl<'a, T> IterMut<'a, T> {
    pub(super) fn new(first: *mut FLinks) -> Self {
        Self {
            current: first,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.current.is_null() {
            None
        } else {
            unsafe {
                let element = &mut *FNode::<T>::value_ptr(self.current);
                self.current = (*self.current).next;
                Some(element)
            }
        }
    }
}

impl<'a, T> FusedIterator for IterMut<'a, T> {}

unsafe impl<'a, T: Send> Send for IterMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for IterMut<'a, T> {}

/// Owning iterator over the elements of a singly linked list.
///
/// This iterator is returned from the `into_iter` function of [`MyForwardList`].
pub struct IntoIter<T, A: Allocator + AllocPolicy> {
    list: MyForwardList<T, A>,
}

impl<T, A> IntoIter<T, A>
where
    A: Allocator + AllocPolicy,
{
    pub(super) fn new(list: MyForwardList<T, A>) -> Self {
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
}

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
