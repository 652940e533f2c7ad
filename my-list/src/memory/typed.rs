// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use allocator_api2::alloc::{Allocator, Global};

use super::guard::AllocatedPtrGuard;
use super::traits::AllocTraits;
use crate::error::AllocError;
use crate::traits::AllocPolicy;

/// An allocator bound to the element type `T`.
///
/// This is the allocator object every container stores.
/// It forwards to the raw allocator `A` through [`AllocTraits`] and can be rebound to a different
/// element type with [`rebind`](Self::rebind) or borrowed as a `TypedAlloc<T, &A>` with
/// [`by_ref`](Self::by_ref), both of which share the allocation state of `A`.
///
/// Two `TypedAlloc`s compare equal if their raw allocators do, regardless of the element type.
pub struct TypedAlloc<T, A = Global> {
    alloc: A,
    marker: PhantomData<fn() -> T>,
}

impl<T, A> TypedAlloc<T, A> {
    /// Binds `alloc` to the element type `T`.
    pub const fn new(alloc: A) -> Self {
        Self {
            alloc,
            marker: PhantomData,
        }
    }

    /// Returns a `TypedAlloc` for the same raw allocator that borrows instead of owning it.
    pub fn by_ref(&self) -> TypedAlloc<T, &A> {
        TypedAlloc::new(&self.alloc)
    }

    /// Returns a reference to the raw allocator.
    pub fn inner(&self) -> &A {
        &self.alloc
    }

    /// Returns a mutable reference to the raw allocator.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Unwraps the raw allocator.
    pub fn into_inner(self) -> A {
        self.alloc
    }

    /// Rebinds the raw allocator to another element type `U`.
    pub fn rebind<U>(self) -> TypedAlloc<U, A> {
        TypedAlloc::new(self.alloc)
    }
}

impl<T, A> TypedAlloc<T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Allocates uninitialized storage for `n` values of `T`.
    ///
    /// See [`AllocTraits::allocate_n`].
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        self.alloc.allocate_n(n)
    }

    /// Allocates storage for a single `T` that is released again unless the returned guard is
    /// [released](AllocatedPtrGuard::release).
    pub fn allocate_guarded(&self) -> Result<AllocatedPtrGuard<'_, T, A>, AllocError> {
        AllocatedPtrGuard::guarded(&self.alloc)
    }

    /// Constructs `value` in the uninitialized storage at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to storage for a `T` obtained from this allocator.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        self.alloc.construct(&ptr, value)
    }

    /// Releases storage for `n` values of `T`.
    ///
    /// # Safety
    ///
    /// See [`AllocTraits::deallocate_n`].
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        self.alloc.deallocate_n(ptr, n)
    }

    /// Destroys the `T` at `ptr` without releasing its storage.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized `T`, which must not be used afterwards.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        self.alloc.destroy(&ptr)
    }

    /// Returns the largest number of `T` values that could theoretically be allocated at once.
    pub fn max_size(&self) -> usize {
        self.alloc.max_size::<T>()
    }
}

impl<T, A: Clone> Clone for TypedAlloc<T, A> {
    fn clone(&self) -> Self {
        Self::new(self.alloc.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.alloc.clone_from(&source.alloc);
    }
}

impl<T, A: fmt::Debug> fmt::Debug for TypedAlloc<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAlloc")
            .field("alloc", &self.alloc)
            .finish()
    }
}

impl<T, A: Default> Default for TypedAlloc<T, A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<T, U, A> PartialEq<TypedAlloc<U, A>> for TypedAlloc<T, A>
where
    A: AllocPolicy,
{
    fn eq(&self, other: &TypedAlloc<U, A>) -> bool {
        A::IS_ALWAYS_EQUAL || self.alloc.equals(&other.alloc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_alloc::TrackingAlloc;
    use alloc::string::String;

    #[test]
    fn test_allocate_construct_destroy() {
        let alloc = TypedAlloc::<u64, _>::new(TrackingAlloc::new(1));

        let ptr = alloc.allocate(4).unwrap();
        unsafe {
            for i in 0..4 {
                alloc.construct(NonNull::new_unchecked(ptr.as_ptr().add(i)), i as u64 * 10);
            }
            assert_eq!(*ptr.as_ptr().add(3), 30);

            for i in 0..4 {
                alloc.destroy(NonNull::new_unchecked(ptr.as_ptr().add(i)));
            }
            alloc.deallocate(ptr, 4);
        }

        assert_eq!(alloc.inner().live(), 0);
        assert_eq!(alloc.max_size(), isize::MAX as usize / 8);
    }

    #[test]
    fn test_rebind_shares_state() {
        let alloc = TypedAlloc::<u8, _>::new(TrackingAlloc::new(5));
        let rebound = alloc.clone().rebind::<[u64; 4]>();

        let ptr = rebound.allocate(1).unwrap();
        assert_eq!(alloc.inner().live(), 1);

        // A rebound allocator compares equal to its origin and can release its memory.
        assert!(rebound == alloc);
        let back = rebound.rebind::<[u64; 4]>();
        unsafe { back.by_ref().deallocate(ptr, 1) };
        assert_eq!(alloc.inner().live(), 0);
        assert_eq!(back.into_inner().id(), 5);
    }

    #[test]
    fn test_equality_follows_policy() {
        let a = TypedAlloc::<i32, _>::new(TrackingAlloc::new(1));
        let b = TypedAlloc::<i32, _>::new(TrackingAlloc::new(2));
        assert!(a == a.clone());
        assert!(a != b);

        let g1 = TypedAlloc::<i32, Global>::default();
        let g2 = TypedAlloc::<String, Global>::default();
        assert!(g1 == g2);
    }
}
