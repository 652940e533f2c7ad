// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw chain primitives of the singly linked list.
//!
//! A chain is a null-terminated sequence of nodes hanging off a head [`FLinks`].
//! The head never points at itself, so it can live inline and move freely.

use core::mem;
use core::ptr;

/// The forward link that starts every node and makes up the head of a chain.
#[repr(C)]
pub(crate) struct FLinks {
    pub(crate) next: *mut FLinks,
}

impl FLinks {
    pub(crate) const EMPTY: FLinks = FLinks {
        next: ptr::null_mut(),
    };

    /// Links the unlinked `node` behind `pos`.
    pub(crate) unsafe fn link_after(pos: *mut FLinks, node: *mut FLinks) {
        (*node).next = (*pos).next;
        (*pos).next = node;
    }

    /// Takes the node behind `pos` out of the chain and returns it, or null if `pos` is the last one.
    pub(crate) unsafe fn unlink_after(pos: *mut FLinks) -> *mut FLinks {
        let node = (*pos).next;
        if !node.is_null() {
            (*pos).next = (*node).next;
        }
        node
    }

    /// Moves the run `(before_first, last]` behind `pos`.
    ///
    /// The run and `pos` may belong to different chains, but `pos` must not lie inside the run.
    pub(crate) unsafe fn transfer_after(
        pos: *mut FLinks,
        before_first: *mut FLinks,
        last: *mut FLinks,
    ) {
        if pos == before_first || pos == last {
            return;
        }

        let first = (*before_first).next;
        (*before_first).next = (*last).next;
        (*last).next = (*pos).next;
        (*pos).next = first;
    }

    /// Returns the last node of the chain starting at `this`, or `this` itself for an empty chain.
    pub(crate) unsafe fn last(this: *mut FLinks) -> *mut FLinks {
        let mut current = this;
        while !(*current).next.is_null() {
            current = (*current).next;
        }
        current
    }

    /// Moves the whole chain of `src` behind `pos`, leaving `src` empty.
    pub(crate) unsafe fn splice_all_after(pos: *mut FLinks, src: *mut FLinks) {
        if (*src).next.is_null() {
            return;
        }

        let last = Self::last(src);
        Self::transfer_after(pos, src, last);
    }

    /// Reverses the order of all nodes on the chain of `this`.
    pub(crate) unsafe fn reverse(this: *mut FLinks) {
        let mut reversed = ptr::null_mut();
        let mut current = (*this).next;

        while !current.is_null() {
            let next = (*current).next;
            (*current).next = reversed;
            reversed = current;
            current = next;
        }

        (*this).next = reversed;
    }

    pub(crate) unsafe fn is_empty(this: *const FLinks) -> bool {
        (*this).next.is_null()
    }
}

/// A list node: the shared [`FLinks`] followed by the element.
#[repr(C)]
pub(crate) struct FNode<T> {
    pub(crate) links: FLinks,
    pub(crate) value: T,
}

impl<T> FNode<T> {
    /// Returns a pointer to the element of the node starting with `links`.
    pub(crate) unsafe fn value_ptr(links: *mut FLinks) -> *mut T {
        ptr::addr_of_mut!((*links.cast::<FNode<T>>()).value)
    }

    pub(crate) unsafe fn value<'a>(links: *mut FLinks) -> &'a T {
        &*Self::value_ptr(links)
    }
}

/// Number of bins used by [`sort`].
pub(crate) const SORT_BINS: usize = 64;

/// Merges the sorted chain of `other` into the sorted chain of `this`.
///
/// Elements of `this` precede equal elements of `other`.
/// Every step moves a single node, so both chains stay valid if `is_less` panics.
pub(crate) unsafe fn merge<T, F>(this: *mut FLinks, other: *mut FLinks, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if this == other {
        return;
    }

    let mut pos = this;

    while !(*pos).next.is_null() {
        let candidate = (*other).next;
        if candidate.is_null() {
            return;
        }

        if is_less(FNode::<T>::value(candidate), FNode::<T>::value((*pos).next)) {
            FLinks::transfer_after(pos, other, candidate);
        }
        pos = (*pos).next;
    }

    // `pos` is the last node of `this` now.
    (*pos).next = (*other).next;
    (*other).next = ptr::null_mut();
}

/// Puts all nodes back onto the chain of `this` if a comparison panics during [`sort`].
struct SortGuard {
    list: *mut FLinks,
    carry: *mut FLinks,
    bins: *mut FLinks,
}

impl Drop for SortGuard {
    fn drop(&mut self) {
        unsafe {
            FLinks::splice_all_after(self.list, self.carry);

            for i in 0..SORT_BINS {
                FLinks::splice_all_after(self.list, self.bins.add(i));
            }
        }
    }
}

/// Sorts the chain of `this` with the same stable bottom-up merge sort as the doubly linked list.
///
/// If `is_less` panics, every node ends up on the chain of `this` again, in unspecified order.
pub(crate) unsafe fn sort<T, F>(this: *mut FLinks, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if (*this).next.is_null() || (*(*this).next).next.is_null() {
        return;
    }

    let mut carry = FLinks::EMPTY;
    let mut bins = [FLinks::EMPTY; SORT_BINS];

    let carry = ptr::addr_of_mut!(carry);
    let bins = bins.as_mut_ptr();

    let guard = SortGuard {
        list: this,
        carry,
        bins,
    };

    let mut fill = 0;

    loop {
        let node = FLinks::unlink_after(this);
        FLinks::link_after(carry, node);

        let mut counter = 0;
        while counter != fill && !FLinks::is_empty(bins.add(counter)) {
            merge(bins.add(counter), carry, is_less);
            mem::swap(&mut (*carry).next, &mut (*bins.add(counter)).next);
            counter += 1;
        }

        debug_assert!(counter < SORT_BINS);
        mem::swap(&mut (*carry).next, &mut (*bins.add(counter)).next);
        if counter == fill {
            fill += 1;
        }

        if FLinks::is_empty(this) {
            break;
        }
    }

    for counter in 1..fill {
        merge(bins.add(counter), bins.add(counter - 1), is_less);
    }

    mem::swap(&mut (*this).next, &mut (*bins.add(fill - 1)).next);
    drop(guard);
}
