// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A doubly linked list whose nodes are allocated through a pluggable allocator.
//!
//! Nodes are linked into a circular ring around a sentinel header.
//! Inserting, removing, and splicing never moves any element, so references obtained through
//! [`Cursor`]s and [`CursorMut`]s only become invalid when their element is removed.

mod allocating;
mod base;
mod cursor;
mod iter;

pub use allocating::MyList;
pub use cursor::{Cursor, CursorMut};
pub use iter::{IntoIter, Iter, IterMut};
