// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Allocator-aware containers with precise contracts for allocator propagation, iterator
//! stability, and behaviour on failure.
//!
//! The centerpiece is [`MyList`](crate::list::MyList), a doubly linked list whose nodes are
//! allocated through a pluggable allocator and whose copy/move/swap behaviour follows the
//! allocator's [`AllocPolicy`].
//! [`MyForwardList`](crate::single_list::MyForwardList) and [`MyVector`](crate::vector::MyVector)
//! share the same allocator machinery in [`memory`].
//! [`PriorityQueue`](crate::priority_queue::PriorityQueue) builds a binary heap on top of
//! `MyVector`, while [`Array`](crate::array::Array) and [`UniquePtr`](crate::unique_ptr::UniquePtr)
//! round off the collection.
//!
//! Allocators implement [`allocator_api2::alloc::Allocator`] and describe their propagation
//! behaviour through [`AllocPolicy`], most easily via `#[derive(AllocPolicy)]`.

#![no_std]

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

// Required for deriving our traits when testing.
#[cfg(test)]
extern crate self as my_list;

pub mod array;
pub mod error;
pub mod list;
pub mod memory;
pub mod priority_queue;
pub mod single_list;
#[cfg(test)]
mod test_alloc;
mod traits;
pub mod unique_ptr;
pub mod vector;

pub use traits::*;
