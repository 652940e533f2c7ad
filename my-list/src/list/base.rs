// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw circular-ring primitives of the doubly linked list.
//!
//! Nothing in here allocates or knows about allocators.
//! The sentinel ([`ListHeader`]) and all nodes ([`ListNode`]) start with the same [`Links`],
//! so every primitive works on `*mut Links` and the sentinel doubles as the "end" position.

use core::ptr;

/// The forward and backward links that start every node and the sentinel.
#[repr(C)]
pub(crate) struct Links {
    pub(crate) next: *mut Links,
    pub(crate) prev: *mut Links,
}

impl Links {
    /// Links the unlinked `this` in front of `pos`.
    pub(crate) unsafe fn link_before(this: *mut Links, pos: *mut Links) {
        (*this).next = pos;
        (*this).prev = (*pos).prev;
        (*(*pos).prev).next = this;
        (*pos).prev = this;
    }

    /// Takes `this` out of its ring.
    ///
    /// The links of `this` keep their stale values.
    pub(crate) unsafe fn unlink(this: *mut Links) {
        (*(*this).prev).next = (*this).next;
        (*(*this).next).prev = (*this).prev;
    }

    /// Moves the run `[first, last)` in front of `pos`.
    ///
    /// The run and `pos` may belong to different rings, but `pos` must not lie inside the run.
    pub(crate) unsafe fn transfer(pos: *mut Links, first: *mut Links, last: *mut Links) {
        if first == last || pos == last {
            return;
        }

        // Close the gap in the source ring and open one in front of `pos`.
        (*(*last).prev).next = pos;
        (*(*first).prev).next = last;
        (*(*pos).prev).next = first;

        // Repair the backward links.
        let old_pos_prev = (*pos).prev;
        (*pos).prev = (*last).prev;
        (*last).prev = (*first).prev;
        (*first).prev = old_pos_prev;
    }
}

/// The sentinel of a list: a ring anchor that also counts the nodes on its ring.
#[repr(C)]
pub(crate) struct ListHeader {
    pub(crate) links: Links,
    pub(crate) size: usize,
}

impl ListHeader {
    /// A header with unset links, to be [`reset`](Self::reset) once it has a stable address.
    pub(crate) const UNLINKED: ListHeader = ListHeader {
        links: Links {
            next: ptr::null_mut(),
            prev: ptr::null_mut(),
        },
        size: 0,
    };

    /// Returns the "end marker" of the ring, which is the header itself interpreted as `Links`.
    pub(crate) fn end(this: *mut ListHeader) -> *mut Links {
        this.cast()
    }

    /// Turns `this` into an empty ring, forgetting all nodes it pointed to.
    pub(crate) unsafe fn reset(this: *mut ListHeader) {
        let end = Self::end(this);
        (*this).links.next = end;
        (*this).links.prev = end;
        (*this).size = 0;
    }

    pub(crate) unsafe fn is_empty(this: *const ListHeader) -> bool {
        (*this).links.next as *const Links == this.cast()
    }

    /// Moves the single node `node` of the ring `src` in front of `pos` on the ring `dst`.
    pub(crate) unsafe fn splice_one(
        dst: *mut ListHeader,
        pos: *mut Links,
        src: *mut ListHeader,
        node: *mut Links,
    ) {
        Links::transfer(pos, node, (*node).next);
        if dst != src {
            (*src).size -= 1;
            (*dst).size += 1;
        }
    }

    /// Moves the run `[first, last)` of `count` nodes from the ring `src` in front of `pos` on
    /// the ring `dst`.
    pub(crate) unsafe fn splice_run(
        dst: *mut ListHeader,
        pos: *mut Links,
        src: *mut ListHeader,
        first: *mut Links,
        last: *mut Links,
        count: usize,
    ) {
        Links::transfer(pos, first, last);
        if dst != src {
            (*src).size -= count;
            (*dst).size += count;
        }
    }

    /// Moves all nodes of `src` in front of `pos` on the ring `dst`, leaving `src` empty.
    pub(crate) unsafe fn splice_all(dst: *mut ListHeader, pos: *mut Links, src: *mut ListHeader) {
        if Self::is_empty(src) {
            return;
        }

        let count = (*src).size;
        Self::splice_run(dst, pos, src, (*src).links.next, Self::end(src), count);
    }

    /// Exchanges the rings of `a` and `b`, including their counters.
    pub(crate) unsafe fn swap(a: *mut ListHeader, b: *mut ListHeader) {
        match (Self::is_empty(a), Self::is_empty(b)) {
            (false, false) => {
                ptr::swap(ptr::addr_of_mut!((*a).links), ptr::addr_of_mut!((*b).links));
                Self::repoint_neighbors(a);
                Self::repoint_neighbors(b);
            }
            (false, true) => Self::move_ring(b, a),
            (true, false) => Self::move_ring(a, b),
            (true, true) => {}
        }

        ptr::swap(ptr::addr_of_mut!((*a).size), ptr::addr_of_mut!((*b).size));
    }

    /// Makes the first and last node of the non-empty ring of `this` point back at `this`.
    unsafe fn repoint_neighbors(this: *mut ListHeader) {
        let end = Self::end(this);
        (*(*this).links.next).prev = end;
        (*(*this).links.prev).next = end;
    }

    /// Hands the nodes of the non-empty `full` over to the empty `empty`, without touching the counters.
    unsafe fn move_ring(empty: *mut ListHeader, full: *mut ListHeader) {
        (*empty).links.next = (*full).links.next;
        (*empty).links.prev = (*full).links.prev;
        Self::repoint_neighbors(empty);

        let end = Self::end(full);
        (*full).links.next = end;
        (*full).links.prev = end;
    }

    /// Reverses the order of all nodes on the ring of `this`.
    pub(crate) unsafe fn reverse(this: *mut ListHeader) {
        let end = Self::end(this);
        let mut current = end;

        loop {
            let next = (*current).next;
            (*current).next = (*current).prev;
            (*current).prev = next;
            current = next;

            if current == end {
                break;
            }
        }
    }
}

/// A list node: the shared [`Links`] followed by the element.
#[repr(C)]
pub(crate) struct ListNode<T> {
    pub(crate) links: Links,
    pub(crate) value: T,
}

impl<T> ListNode<T> {
    /// Returns a pointer to the element of the node starting with `links`.
    pub(crate) unsafe fn value_ptr(links: *mut Links) -> *mut T {
        ptr::addr_of_mut!((*links.cast::<ListNode<T>>()).value)
    }

    pub(crate) unsafe fn value<'a>(links: *mut Links) -> &'a T {
        &*Self::value_ptr(links)
    }
}

/// Number of bins used by [`sort`]. Bin `i` holds a sorted run of up to 2^`i` elements, so this
/// suffices for any list that fits into the address space.
pub(crate) const SORT_BINS: usize = 64;

/// Merges the sorted ring `other` into the sorted ring `this`.
///
/// Elements of `this` precede equal elements of `other`, so the merge is stable.
/// The counters are updated with every node that changes rings, which leaves both rings
/// consistent if `is_less` panics.
pub(crate) unsafe fn merge<T, F>(this: *mut ListHeader, other: *mut ListHeader, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if this == other {
        return;
    }

    let this_end = ListHeader::end(this);
    let other_end = ListHeader::end(other);
    let mut current = (*this).links.next;

    while current != this_end {
        let candidate = (*other).links.next;
        if candidate == other_end {
            return;
        }

        if is_less(ListNode::<T>::value(candidate), ListNode::<T>::value(current)) {
            ListHeader::splice_one(this, current, other, candidate);
        } else {
            current = (*current).next;
        }
    }

    // Everything left in `other` is not less than the last element of `this`.
    ListHeader::splice_all(this, this_end, other);
}

/// Puts all nodes back onto the sorted ring if a comparison panics during [`sort`].
struct SortGuard {
    list: *mut ListHeader,
    carry: *mut ListHeader,
    bins: *mut ListHeader,
}

impl Drop for SortGuard {
    fn drop(&mut self) {
        unsafe {
            let end = ListHeader::end(self.list);
            ListHeader::splice_all(self.list, end, self.carry);

            for i in 0..SORT_BINS {
                ListHeader::splice_all(self.list, end, self.bins.add(i));
            }
        }
    }
}

/// Sorts the ring of `this` with a stable bottom-up merge sort.
///
/// Nodes are moved one at a time into a carry ring and merged up through a ladder of
/// [`SORT_BINS`] bins, where bin `i` holds either nothing or a sorted run of 2^`i` nodes.
/// Finally all bins are merged from the smallest to the largest.
/// No element is moved or copied, only links change.
///
/// If `is_less` panics, every node ends up on the ring of `this` again, in unspecified order.
pub(crate) unsafe fn sort<T, F>(this: *mut ListHeader, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if (*this).size < 2 {
        return;
    }

    let mut carry = ListHeader::UNLINKED;
    let mut bins = [ListHeader::UNLINKED; SORT_BINS];

    // From here on, the headers are only accessed through these pointers.
    let carry = ptr::addr_of_mut!(carry);
    let bins = bins.as_mut_ptr();
    ListHeader::reset(carry);
    for i in 0..SORT_BINS {
        ListHeader::reset(bins.add(i));
    }

    let guard = SortGuard {
        list: this,
        carry,
        bins,
    };

    let mut fill = 0;

    loop {
        ListHeader::splice_one(carry, ListHeader::end(carry), this, (*this).links.next);

        let mut counter = 0;
        while counter != fill && !ListHeader::is_empty(bins.add(counter)) {
            // The bin holds the older (earlier) elements, so it is the receiving side.
            merge(bins.add(counter), carry, is_less);
            ListHeader::swap(carry, bins.add(counter));
            counter += 1;
        }

        debug_assert!(counter < SORT_BINS);
        ListHeader::swap(carry, bins.add(counter));
        if counter == fill {
            fill += 1;
        }

        if ListHeader::is_empty(this) {
            break;
        }
    }

    // Bin `i` holds elements that came before those of bin `i - 1`.
    for counter in 1..fill {
        merge(bins.add(counter), bins.add(counter - 1), is_less);
    }

    ListHeader::swap(this, bins.add(fill - 1));
    drop(guard);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    /// Walks the ring of `header` in both directions, checks every backward link against the
    /// forward traversal, and checks the counter.
    pub(crate) fn verify_all_links(header: *mut ListHeader) {
        let end = ListHeader::end(header);
        let mut current;

        // Traverse the list in forward direction and collect all entries.
        current = unsafe { (*header).links.next };
        let mut forward_entries = Vec::<*mut Links>::new();

        while current != end {
            if !forward_entries.is_empty() {
                // Verify that the previous entry is referenced by this entry's `prev`.
                unsafe {
                    assert_eq!(*forward_entries.last().unwrap(), (*current).prev);
                }
            }

            forward_entries.push(current);
            current = unsafe { (*current).next };
        }

        // Traverse the list in backward direction and collect all entries.
        current = unsafe { (*header).links.prev };
        let mut backward_entries = Vec::<*mut Links>::with_capacity(forward_entries.len());

        while current != end {
            if !backward_entries.is_empty() {
                // Verify that the previous entry is referenced by this entry's `next`.
                unsafe {
                    assert_eq!(*backward_entries.last().unwrap(), (*current).next);
                }
            }

            backward_entries.push(current);
            current = unsafe { (*current).prev };
        }

        // Verify that `backward_entries` is the exact reverse of `forward_entries`.
        assert_eq!(forward_entries.len(), backward_entries.len());

        for (fe, be) in forward_entries.iter().zip(backward_entries.iter().rev()) {
            assert_eq!(fe, be);
        }

        assert_eq!(unsafe { (*header).size }, forward_entries.len());
    }

    /// A ring of boxed nodes for exercising the primitives without an allocator.
    struct TestRing {
        header: Box<ListHeader>,
        nodes: Vec<*mut ListNode<i32>>,
    }

    impl TestRing {
        fn new(values: &[i32]) -> Self {
            let mut header = Box::new(ListHeader::UNLINKED);
            let header_ptr: *mut ListHeader = &mut *header;
            let mut nodes = Vec::new();

            unsafe {
                ListHeader::reset(header_ptr);

                for &value in values {
                    let node = Box::into_raw(Box::new(ListNode {
                        links: Links {
                            next: ptr::null_mut(),
                            prev: ptr::null_mut(),
                        },
                        value,
                    }));
                    Links::link_before(node.cast(), ListHeader::end(header_ptr));
                    (*header_ptr).size += 1;
                    nodes.push(node);
                }
            }

            Self { header, nodes }
        }

        fn ptr(&mut self) -> *mut ListHeader {
            &mut *self.header
        }

        fn values(&mut self) -> Vec<i32> {
            let header = self.ptr();
            verify_all_links(header);

            let mut values = Vec::new();
            let end = ListHeader::end(header);
            let mut current = unsafe { (*header).links.next };
            while current != end {
                unsafe {
                    values.push(*ListNode::<i32>::value(current));
                    current = (*current).next;
                }
            }
            values
        }

        fn node(&self, index: usize) -> *mut Links {
            self.nodes[index].cast()
        }
    }

    impl Drop for TestRing {
        fn drop(&mut self) {
            for node in self.nodes.drain(..) {
                unsafe { drop(Box::from_raw(node)) };
            }
        }
    }

    #[test]
    fn test_transfer() {
        let mut ring = TestRing::new(&[0, 1, 2, 3, 4, 5]);
        let header = ring.ptr();

        // Move [1, 3) in front of 5.
        unsafe {
            Links::transfer(ring.node(5), ring.node(1), ring.node(3));
        }
        assert_eq!(ring.values(), [0, 3, 4, 1, 2, 5]);

        // Moving a run in front of its own end changes nothing.
        unsafe {
            Links::transfer(ring.node(5), ring.node(1), ring.node(5));
            Links::transfer(ring.node(2), ring.node(2), ring.node(2));
        }
        assert_eq!(ring.values(), [0, 3, 4, 1, 2, 5]);

        // Move the last element to the front.
        unsafe {
            Links::transfer(ring.node(0), ring.node(5), ListHeader::end(header));
        }
        assert_eq!(ring.values(), [5, 0, 3, 4, 1, 2]);
    }

    #[test]
    fn test_splice_between_rings() {
        let mut a = TestRing::new(&[1, 2, 3]);
        let mut b = TestRing::new(&[10, 20, 30, 40]);

        unsafe {
            ListHeader::splice_one(a.ptr(), a.node(1), b.ptr(), b.node(2));
            ListHeader::splice_run(
                a.ptr(),
                ListHeader::end(a.ptr()),
                b.ptr(),
                b.node(0),
                b.node(3),
                2,
            );
        }
        assert_eq!(a.values(), [1, 30, 2, 3, 10, 20]);
        assert_eq!(b.values(), [40]);

        unsafe { ListHeader::splice_all(a.ptr(), a.node(0), b.ptr()) };
        assert_eq!(a.values(), [40, 1, 30, 2, 3, 10, 20]);
        assert!(b.values().is_empty());
    }

    #[test]
    fn test_swap() {
        let mut a = TestRing::new(&[1, 2, 3]);
        let mut b = TestRing::new(&[4]);
        let mut empty = TestRing::new(&[]);
        let mut other_empty = TestRing::new(&[]);

        unsafe { ListHeader::swap(a.ptr(), b.ptr()) };
        assert_eq!(a.values(), [4]);
        assert_eq!(b.values(), [1, 2, 3]);

        unsafe { ListHeader::swap(b.ptr(), empty.ptr()) };
        assert!(b.values().is_empty());
        assert_eq!(empty.values(), [1, 2, 3]);

        unsafe { ListHeader::swap(b.ptr(), empty.ptr()) };
        assert_eq!(b.values(), [1, 2, 3]);
        assert!(empty.values().is_empty());

        unsafe { ListHeader::swap(empty.ptr(), other_empty.ptr()) };
        assert!(empty.values().is_empty());
        assert!(other_empty.values().is_empty());
    }

    #[test]
    fn test_reverse() {
        let mut ring = TestRing::new(&[1, 2, 3, 4]);
        unsafe { ListHeader::reverse(ring.ptr()) };
        assert_eq!(ring.values(), [4, 3, 2, 1]);

        let mut single = TestRing::new(&[7]);
        unsafe { ListHeader::reverse(single.ptr()) };
        assert_eq!(single.values(), [7]);

        let mut empty = TestRing::new(&[]);
        unsafe { ListHeader::reverse(empty.ptr()) };
        assert!(empty.values().is_empty());
    }

    #[test]
    fn test_merge() {
        let mut a = TestRing::new(&[1, 3, 5]);
        let mut b = TestRing::new(&[2, 3, 4]);
        let three_of_a = a.node(1);

        unsafe { merge::<i32, _>(a.ptr(), b.ptr(), &mut |x: &i32, y: &i32| x < y) };
        assert_eq!(a.values(), [1, 2, 3, 3, 4, 5]);
        assert!(b.values().is_empty());

        // The 3 of `a` stays in front of the 3 of `b`.
        unsafe {
            assert_eq!((*ListHeader::end(a.ptr())).next, a.node(0));
            assert_eq!((*(*a.node(0)).next).next, three_of_a);
        }
    }

    #[test]
    fn test_sort() {
        let values = [5, -3, 8, 0, 0, 12, -7, 5, 1, 9, 2, 2, -1];
        let mut ring = TestRing::new(&values);

        unsafe { sort::<i32, _>(ring.ptr(), &mut |x: &i32, y: &i32| x < y) };

        let mut expected = values.to_vec();
        expected.sort();
        assert_eq!(ring.values(), expected);
    }

    #[test]
    fn test_sort_panic_keeps_all_nodes() {
        let values: Vec<i32> = (0..100).rev().collect();
        let mut ring = TestRing::new(&values);
        let header = ring.ptr();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut comparisons = 0;
            unsafe {
                sort::<i32, _>(header, &mut |x: &i32, y: &i32| {
                    comparisons += 1;
                    if comparisons == 150 {
                        panic!("comparison failed");
                    }
                    x < y
                })
            };
        }));
        assert!(result.is_err());

        let mut remaining = ring.values();
        remaining.sort();
        assert_eq!(remaining, (0..100).collect::<Vec<_>>());
    }
}
