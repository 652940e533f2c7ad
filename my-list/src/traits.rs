// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use allocator_api2::alloc::Global;

/// Describes how an allocator travels along with the container that uses it.
///
/// Every container of this crate consults these flags when it is copied, moved, or swapped:
///
/// * `PROPAGATE_ON_COPY_ASSIGNMENT`: `clone_from` replaces the target's allocator with a copy
///   of the source's allocator.
/// * `PROPAGATE_ON_MOVE_ASSIGNMENT`: `move_assign` takes over the source's allocator.
/// * `PROPAGATE_ON_SWAP`: `swap` exchanges the allocators along with the contents.
/// * `IS_ALWAYS_EQUAL`: any two instances of the allocator type can release each other's memory,
///   so no runtime comparison is ever necessary.
///
/// All flags default to `false`.
///
/// The easiest way to implement this trait is to use `derive` and name the flags you want to set:
///
/// ```ignore
/// #[derive(AllocPolicy, Clone, PartialEq)]
/// #[alloc_policy(propagate_on_copy_assignment, propagate_on_move_assignment, propagate_on_swap)]
/// struct PoolAlloc {
///     pool: Rc<Pool>,
/// }
/// ```
pub trait AllocPolicy {
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = false;
    const PROPAGATE_ON_SWAP: bool = false;
    const IS_ALWAYS_EQUAL: bool = false;

    /// Returns `true` if memory allocated by `self` can be deallocated by `other` and vice versa.
    fn equals(&self, other: &Self) -> bool;

    /// Returns the allocator that a copy-constructed container shall use.
    ///
    /// The default implementation returns a clone of `self`.
    fn select_on_container_copy_construction(&self) -> Self
    where
        Self: Clone,
    {
        self.clone()
    }
}
pub use my_list_macros::AllocPolicy;

impl AllocPolicy for Global {
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = true;
    const IS_ALWAYS_EQUAL: bool = true;

    fn equals(&self, _other: &Self) -> bool {
        true
    }
}

impl<A> AllocPolicy for &A
where
    A: AllocPolicy + ?Sized,
{
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = A::PROPAGATE_ON_COPY_ASSIGNMENT;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = A::PROPAGATE_ON_MOVE_ASSIGNMENT;
    const PROPAGATE_ON_SWAP: bool = A::PROPAGATE_ON_SWAP;
    const IS_ALWAYS_EQUAL: bool = A::IS_ALWAYS_EQUAL;

    fn equals(&self, other: &Self) -> bool {
        (**self).equals(*other)
    }
}
