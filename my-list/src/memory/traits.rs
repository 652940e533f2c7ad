// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::Allocator;
use log::error;

use crate::error::AllocError;
use crate::traits::AllocPolicy;

/// Resolves a (possibly "fancy") pointer to the raw address it designates.
///
/// Allocators handing out proxy pointers (offset or segment based) implement this for their
/// proxy type, and [`AllocTraits::construct`]/[`AllocTraits::destroy`] accept them directly.
pub trait ToAddress {
    type Target;

    fn to_address(&self) -> *mut Self::Target;
}

impl<T> ToAddress for *mut T {
    type Target = T;

    fn to_address(&self) -> *mut T {
        *self
    }
}

impl<T> ToAddress for NonNull<T> {
    type Target = T;

    fn to_address(&self) -> *mut T {
        self.as_ptr()
    }
}

/// Uniform access to an allocator and its [`AllocPolicy`].
///
/// Containers never call [`Allocator`] methods directly, but always go through this trait.
/// It is implemented for every allocator that also implements [`AllocPolicy`].
pub trait AllocTraits: Allocator + AllocPolicy {
    /// Allocates uninitialized storage for `n` values of type `T`.
    ///
    /// Zero-sized requests don't reach the allocator and return a dangling pointer.
    fn allocate_n<T>(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        let layout = Layout::array::<T>(n).map_err(|_| AllocError::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        match self.allocate(layout) {
            Ok(ptr) => Ok(ptr.cast()),
            Err(_) => {
                error!(
                    "Allocating {} bytes (alignment {}) for {} elements failed",
                    layout.size(),
                    layout.align(),
                    n
                );
                Err(AllocError::OutOfMemory { layout })
            }
        }
    }

    /// Releases storage obtained from [`allocate_n`](Self::allocate_n).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate_n::<T>(n)` of this allocator (or one that
    /// compares equal), and must not be used afterwards.
    unsafe fn deallocate_n<T>(&self, ptr: NonNull<T>, n: usize) {
        let size = mem::size_of::<T>() * n;
        if size != 0 {
            let layout = Layout::from_size_align_unchecked(size, mem::align_of::<T>());
            self.deallocate(ptr.cast(), layout);
        }
    }

    /// Moves `value` into the uninitialized storage designated by `p`.
    ///
    /// # Safety
    ///
    /// `p` must resolve to valid, properly aligned storage for a `P::Target`.
    unsafe fn construct<P>(&self, p: &P, value: P::Target)
    where
        P: ToAddress,
        P::Target: Sized,
    {
        ptr::write(p.to_address(), value)
    }

    /// Runs the destructor of the value designated by `p` without releasing its storage.
    ///
    /// # Safety
    ///
    /// `p` must resolve to an initialized value, which must not be used afterwards.
    unsafe fn destroy<P>(&self, p: &P)
    where
        P: ToAddress,
    {
        ptr::drop_in_place(p.to_address())
    }

    /// Returns the largest number of `T` values a single allocation could theoretically hold.
    fn max_size<T>(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => isize::MAX as usize / size,
        }
    }

    /// Returns `true` if `self` and `other` can release each other's memory.
    ///
    /// Always-equal allocators skip the runtime comparison.
    fn alloc_eq(&self, other: &Self) -> bool {
        Self::IS_ALWAYS_EQUAL || self.equals(other)
    }

    fn always_equal() -> bool {
        Self::IS_ALWAYS_EQUAL
    }

    /// Returns `true` if a move assignment can always reuse the source's memory, which makes
    /// it an *O*(*1*) operation that cannot fail.
    fn nothrow_move() -> bool {
        Self::PROPAGATE_ON_MOVE_ASSIGNMENT || Self::IS_ALWAYS_EQUAL
    }

    /// Copies `right` into `left` if the policy propagates on copy assignment.
    fn do_copy(left: &mut Self, right: &Self)
    where
        Self: Clone,
    {
        if Self::PROPAGATE_ON_COPY_ASSIGNMENT {
            left.clone_from(right);
        }
    }

    /// Moves `right` into `left` if the policy propagates on move assignment.
    fn do_move(left: &mut Self, right: Self)
    where
        Self: Sized,
    {
        if Self::PROPAGATE_ON_MOVE_ASSIGNMENT {
            *left = right;
        }
    }

    /// Swaps `left` and `right` if the policy propagates on swap.
    fn do_swap(left: &mut Self, right: &mut Self)
    where
        Self: Sized,
    {
        if Self::PROPAGATE_ON_SWAP {
            mem::swap(left, right);
        }
    }
}

impl<A> AllocTraits for A where A: Allocator + AllocPolicy + ?Sized {}
