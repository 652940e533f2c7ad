// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A priority queue implemented as a binary heap over a [`MyVector`].

use core::fmt;
use core::mem;
use core::slice;

use allocator_api2::alloc::{Allocator, Global};
use log::trace;

use crate::error::AllocError;
use crate::traits::AllocPolicy;
use crate::vector::MyVector;

/// A strict weak ordering used by [`PriorityQueue`] to decide which element comes out first.
///
/// The queue always yields an element `x` for which no other element `y` satisfies
/// `is_less(x, y)`.
/// Any closure `Fn(&T, &T) -> bool` is a comparator as well.
pub trait Compare<T: ?Sized> {
    fn is_less(&self, a: &T, b: &T) -> bool;
}

/// Orders by `<`, which makes [`PriorityQueue`] yield the greatest element first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Less;

impl<T: Ord + ?Sized> Compare<T> for Less {
    fn is_less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Orders by `>`, which makes [`PriorityQueue`] yield the smallest element first.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greater;

impl<T: Ord + ?Sized> Compare<T> for Greater {
    fn is_less(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn is_less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// A priority queue on top of a [`MyVector`] that stores its elements as a binary heap.
///
/// [`push`](Self::push) and [`pop`](Self::pop) compute in *O*(*log n*) time, [`peek`](Self::peek)
/// in *O*(*1*) time.
///
/// If the comparator panics, the queue keeps all of its elements, but they may no longer form
/// a valid heap.
pub struct PriorityQueue<T, C = Less, A: Allocator + AllocPolicy = Global> {
    data: MyVector<T, A>,
    compare: C,
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates an empty max-heap that uses the global allocator.
    pub const fn new() -> Self {
        Self {
            data: MyVector::new(),
            compare: Less,
        }
    }
}

impl<T, C, A> PriorityQueue<T, C, A>
where
    C: Compare<T>,
    A: Allocator + AllocPolicy,
{
    /// Creates an empty queue that uses `alloc` and a default-constructed comparator.
    pub fn new_in(alloc: A) -> Self
    where
        C: Default,
    {
        Self::with_compare_in(C::default(), alloc)
    }

    /// Creates an empty queue that orders its elements by `compare` and uses `alloc`.
    pub fn with_compare_in(compare: C, alloc: A) -> Self {
        Self {
            data: MyVector::new_in(alloc),
            compare,
        }
    }

    /// Turns the elements of `data` into a heap ordered by `compare`.
    ///
    /// This operation computes in *O*(*n*) time.
    pub fn from_vec(data: MyVector<T, A>, compare: C) -> Self {
        let mut queue = Self { data, compare };
        queue.rebuild();
        queue
    }

    /// Returns a reference to the allocator of the underlying vector.
    pub fn allocator(&self) -> &A {
        self.data.allocator()
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.data.clear()
    }

    /// Returns a reference to the comparator.
    pub fn compare(&self) -> &C {
        &self.compare
    }

    /// Returns the underlying vector, with the elements in heap order.
    pub fn into_vec(self) -> MyVector<T, A> {
        self.data
    }

    /// Returns the underlying vector sorted so that the element [`pop`](Self::pop) would have
    /// returned first comes last.
    ///
    /// This operation computes in *O*(*n log n*) time.
    pub fn into_sorted_vec(mut self) -> MyVector<T, A> {
        let mut end = self.data.len();

        while end > 1 {
            end -= 1;
            self.data.as_mut_slice().swap(0, end);
            self.sift_down(0, end);
        }

        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over all elements in arbitrary order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns the element that [`pop`](Self::pop) would return, or `None` if the queue is empty.
    pub fn peek(&self) -> Option<&T> {
        self.data.front()
    }

    /// Removes the first element in queue order and returns it, or `None` if the queue is empty.
    pub fn pop(&mut self) -> Option<T> {
        let mut last = self.data.pop()?;

        if !self.data.is_empty() {
            mem::swap(&mut last, &mut self.data[0]);
            let end = self.data.len();
            self.sift_down(0, end);
        }

        Some(last)
    }

    /// Adds an element to the queue.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
        self.sift_up(self.data.len() - 1);
    }

    /// Exchanges the contents and comparators of two queues.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`MyVector::swap`].
    pub fn swap(&mut self, other: &mut Self) {
        self.data.swap(&mut other.data);
        mem::swap(&mut self.compare, &mut other.compare);
    }

    /// Returns the element that [`pop`](Self::pop) would return, or `None` if the queue is empty.
    pub fn top(&self) -> Option<&T> {
        self.peek()
    }

    /// Adds an element to the queue, or returns an error if the underlying vector cannot grow.
    ///
    /// On error, the queue is unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), AllocError> {
        self.data.try_push(value)?;
        self.sift_up(self.data.len() - 1);
        Ok(())
    }

    /// Restores the heap property for all elements.
    fn rebuild(&mut self) {
        let len = self.data.len();
        trace!("Building a heap of {} elements", len);

        for pos in (0..len / 2).rev() {
            self.sift_down(pos, len);
        }
    }

    /// Moves the element at `pos` down until none of its children within `..end` orders after it.
    fn sift_down(&mut self, mut pos: usize, end: usize) {
        loop {
            let mut child = 2 * pos + 1;
            if child >= end {
                break;
            }

            if child + 1 < end && self.compare.is_less(&self.data[child], &self.data[child + 1]) {
                child += 1;
            }

            if !self.compare.is_less(&self.data[pos], &self.data[child]) {
                break;
            }

            self.data.as_mut_slice().swap(pos, child);
            pos = child;
        }
    }

    /// Moves the element at `pos` up until its parent doesn't order before it.
    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.compare.is_less(&self.data[parent], &self.data[pos]) {
                break;
            }

            self.data.as_mut_slice().swap(parent, pos);
            pos = parent;
        }
    }
}

impl<T, C, A> Clone for PriorityQueue<T, C, A>
where
    T: Clone,
    C: Clone,
    A: Allocator + AllocPolicy + Clone,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            compare: self.compare.clone(),
        }
    }
}

impl<T, C, A> fmt::Debug for PriorityQueue<T, C, A>
where
    T: fmt::Debug,
    A: Allocator + AllocPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T, C, A> Default for PriorityQueue<T, C, A>
where
    C: Compare<T> + Default,
    A: Allocator + AllocPolicy + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, C, A> Extend<T> for PriorityQueue<T, C, A>
where
    C: Compare<T>,
    A: Allocator + AllocPolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T, C> FromIterator<T> for PriorityQueue<T, C>
where
    C: Compare<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(MyVector::from_iter(iter), C::default())
    }
}

impl<T, C, A> From<MyVector<T, A>> for PriorityQueue<T, C, A>
where
    C: Compare<T> + Default,
    A: Allocator + AllocPolicy,
{
    fn from(data: MyVector<T, A>) -> Self {
        Self::from_vec(data, C::default())
    }
}

impl<'a, T, C, A> IntoIterator for &'a PriorityQueue<T, C, A>
where
    C: Compare<T>,
    A: Allocator + AllocPolicy,
{
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}
