// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A singly linked list whose nodes are allocated through a pluggable allocator.
//!
//! [`MyForwardList`] shares the allocator machinery and the propagation rules of
//! [`MyList`](crate::list::MyList), but every node only links to its successor.
//! Insertions and removals therefore take place *behind* a position, which is what
//! [`CursorMut`] offers:
//!
//! ```
//! use my_list::single_list::MyForwardList;
//!
//! let mut list = MyForwardList::from([1, 3]);
//!
//! let mut cursor = list.cursor_before_front_mut();
//! cursor.move_next();
//! cursor.insert_after(2);
//!
//! assert!(list.iter().eq(&[1, 2, 3]));
//! ```

mod allocating;
mod base;
mod cursor;
mod iter;

pub use allocating::MyForwardList;
pub use cursor::CursorMut;
pub use iter::{IntoIter, Iter, IterMut};
