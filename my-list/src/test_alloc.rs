// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Allocators for the unit tests.
//!
//! Both allocators forward to [`Global`], count live allocations, and can be told to fail.
//! Two instances compare equal if they share the same id.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator, Global};
use std::rc::Rc;

use crate::traits::AllocPolicy;

#[derive(Debug, Default)]
pub(crate) struct Stats {
    live: Cell<isize>,
    total: Cell<usize>,
    remaining: Cell<Option<usize>>,
}

/// An allocator that never propagates and compares equal only to instances with the same id.
#[derive(AllocPolicy, Clone, Debug)]
pub(crate) struct TrackingAlloc {
    id: u32,
    stats: Rc<Stats>,
}

impl TrackingAlloc {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            stats: Rc::default(),
        }
    }

    /// Returns an allocator with another id, but sharing the statistics of `self`.
    pub(crate) fn sibling(&self, id: u32) -> Self {
        Self {
            id,
            stats: Rc::clone(&self.stats),
        }
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    /// Number of allocations that have not been released yet.
    pub(crate) fn live(&self) -> isize {
        self.stats.live.get()
    }

    /// Number of allocations ever made.
    pub(crate) fn total(&self) -> usize {
        self.stats.total.get()
    }

    /// Lets the next `n` allocations succeed and all following ones fail.
    pub(crate) fn fail_after(&self, n: usize) {
        self.stats.remaining.set(Some(n));
    }

    /// Lets all allocations succeed again.
    pub(crate) fn heal(&self) {
        self.stats.remaining.set(None);
    }
}

impl PartialEq for TrackingAlloc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

unsafe impl Allocator for TrackingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if let Some(remaining) = self.stats.remaining.get() {
            if remaining == 0 {
                return Err(AllocError);
            }
            self.stats.remaining.set(Some(remaining - 1));
        }

        let ptr = Global.allocate(layout)?;
        self.stats.live.set(self.stats.live.get() + 1);
        self.stats.total.set(self.stats.total.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.live.set(self.stats.live.get() - 1);
        Global.deallocate(ptr, layout)
    }
}

/// A [`TrackingAlloc`] that propagates on copy assignment, move assignment, and swap.
#[derive(AllocPolicy, Clone, Debug, PartialEq)]
#[alloc_policy(propagate_on_copy_assignment, propagate_on_move_assignment, propagate_on_swap)]
pub(crate) struct PropagatingAlloc(TrackingAlloc);

impl PropagatingAlloc {
    pub(crate) fn new(id: u32) -> Self {
        Self(TrackingAlloc::new(id))
    }

    pub(crate) fn sibling(&self, id: u32) -> Self {
        Self(self.0.sibling(id))
    }

    pub(crate) fn id(&self) -> u32 {
        self.0.id()
    }

    pub(crate) fn live(&self) -> isize {
        self.0.live()
    }
}

unsafe impl Allocator for PropagatingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.0.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.0.deallocate(ptr, layout)
    }
}

/// A value that counts its live instances and can be told to panic when cloned.
#[derive(Debug)]
pub(crate) struct Tracked {
    pub(crate) value: i32,
    counter: Rc<Cell<isize>>,
    panic_on_clone: bool,
}

impl Tracked {
    pub(crate) fn new(value: i32, counter: &Rc<Cell<isize>>) -> Self {
        counter.set(counter.get() + 1);
        Self {
            value,
            counter: Rc::clone(counter),
            panic_on_clone: false,
        }
    }

    pub(crate) fn poisoned(value: i32, counter: &Rc<Cell<isize>>) -> Self {
        let mut this = Self::new(value, counter);
        this.panic_on_clone = true;
        this
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        if self.panic_on_clone {
            panic!("cloning a poisoned value");
        }

        Self::new(self.value, &self.counter)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counter.set(self.counter.get() - 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
