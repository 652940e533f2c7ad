// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::mem::{self, MaybeUninit};
use core::pin::Pin;
use core::ptr::NonNull;

use allocator_api2::alloc::Allocator;

use super::traits::{AllocTraits, ToAddress};
use crate::error::AllocError;
use crate::traits::AllocPolicy;

/// Owns the storage of a single, not yet constructed `T`.
///
/// If the guard is dropped, the storage is deallocated without running any destructor.
/// This covers the window between allocating a node and successfully constructing its element:
/// whether the element constructor panics or returns an error, the storage is given back.
/// Once the element is in place, [`release`](Self::release) hands the storage over to the caller.
pub struct AllocatedPtrGuard<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    alloc: &'a A,
    ptr: NonNull<T>,
}

impl<'a, T, A> AllocatedPtrGuard<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    /// Allocates storage for one `T` from `alloc` and guards it.
    pub fn guarded(alloc: &'a A) -> Result<Self, AllocError> {
        let ptr = alloc.allocate_n::<T>(1)?;
        Ok(Self { alloc, ptr })
    }

    /// Guards storage for one `T` that has been allocated from `alloc` before.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `alloc.allocate_n::<T>(1)` and must not be owned by
    /// anybody else.
    pub unsafe fn new(alloc: &'a A, ptr: NonNull<T>) -> Self {
        Self { alloc, ptr }
    }

    /// Returns the raw address of the guarded storage.
    pub fn get(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns the guarded storage as a pinned, uninitialized slot, ready for a
    /// [`moveit::New`] constructor.
    pub fn as_uninit(&mut self) -> Pin<&mut MaybeUninit<T>> {
        // The storage never moves while the guard owns it.
        unsafe { Pin::new_unchecked(&mut *self.ptr.as_ptr().cast::<MaybeUninit<T>>()) }
    }

    /// Gives up ownership of the storage and returns it.
    pub fn release(self) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<'a, T, A> Drop for AllocatedPtrGuard<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    fn drop(&mut self) {
        unsafe { self.alloc.deallocate_n(self.ptr, 1) }
    }
}

impl<'a, T, A> ToAddress for AllocatedPtrGuard<'a, T, A>
where
    A: Allocator + AllocPolicy,
{
    type Target = T;

    fn to_address(&self) -> *mut T {
        self.get()
    }
}

/// Reinterprets the storage of a `T` that lives inside a freshly allocated node as the slot a
/// [`moveit`] constructor expects.
///
/// # Safety
///
/// `slot` must point to valid, uninitialized storage that does not move while the constructor
/// runs.
pub(crate) unsafe fn pinned_slot<'a, T>(slot: *mut T) -> Pin<&'a mut MaybeUninit<T>> {
    Pin::new_unchecked(&mut *slot.cast::<MaybeUninit<T>>())
}
