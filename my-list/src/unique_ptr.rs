// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A pointer that is the sole owner of a heap object and hands it to a pluggable deleter.

use alloc::boxed::Box;
use core::fmt;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use allocator_api2::alloc::Allocator;
use moveit::new::TryNew;
use moveit::New;

use crate::error::{handle_alloc_failure, AllocError, ConstructError};
use crate::memory::{AllocatedPtrGuard, CompressedPair};
use crate::traits::AllocPolicy;

/// Disposes of the object owned by a [`UniquePtr`].
///
/// Any closure `FnMut(NonNull<T>)` is a deleter as well.
pub trait Deleter<T: ?Sized> {
    /// Destroys the object at `ptr` and releases its storage.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an object this deleter is responsible for, and must not be used
    /// afterwards.
    unsafe fn delete(&mut self, ptr: NonNull<T>);
}

/// Deletes objects that were allocated as a [`Box`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDelete;

impl<T: ?Sized> Deleter<T> for DefaultDelete {
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}

/// Deletes objects that were allocated from the allocator `A`.
#[derive(Clone, Debug, Default)]
pub struct AllocDelete<A> {
    alloc: A,
}

impl<A> AllocDelete<A> {
    pub const fn new(alloc: A) -> Self {
        Self { alloc }
    }

    /// Returns a reference to the allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

impl<T, A> Deleter<T> for AllocDelete<A>
where
    A: Allocator + AllocPolicy,
{
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        // The storage is released even if the destructor panics.
        let _guard = AllocatedPtrGuard::new(&self.alloc, ptr);
        ptr::drop_in_place(ptr.as_ptr());
    }
}

impl<T: ?Sized, F> Deleter<T> for F
where
    F: FnMut(NonNull<T>),
{
    unsafe fn delete(&mut self, ptr: NonNull<T>) {
        self(ptr)
    }
}

/// The sole owner of a heap object, which is handed to the deleter `D` once the pointer is
/// dropped or [`reset`](Self::reset).
///
/// Unlike a [`Box`], a `UniquePtr` may be null, and its deleter decides how the object is
/// disposed of.
/// A zero-sized deleter takes no space.
pub struct UniquePtr<T: ?Sized, D: Deleter<T> = DefaultDelete> {
    pair: CompressedPair<D, Option<NonNull<T>>>,
}

unsafe impl<T: ?Sized + Send, D: Deleter<T> + Send> Send for UniquePtr<T, D> {}
unsafe impl<T: ?Sized + Sync, D: Deleter<T> + Sync> Sync for UniquePtr<T, D> {}

impl<T> UniquePtr<T> {
    /// Moves `value` to the heap and takes ownership of it.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }
}

impl<T: ?Sized> UniquePtr<T> {
    /// Takes ownership of the object of `boxed`.
    pub fn from_box(boxed: Box<T>) -> Self {
        // SAFETY: `DefaultDelete` gives the object back to `Box`.
        unsafe { Self::from_raw(Box::into_raw(boxed), DefaultDelete) }
    }
}

impl<T, A> UniquePtr<T, AllocDelete<A>>
where
    A: Allocator + AllocPolicy,
{
    /// Moves `value` into storage allocated from `alloc` and takes ownership of it.
    pub fn new_in(value: T, alloc: A) -> Self {
        Self::try_new_in(value, alloc).unwrap_or_else(|err| handle_alloc_failure(err))
    }

    /// Moves `value` into storage allocated from `alloc` and takes ownership of it, or returns an
    /// error if the storage cannot be allocated.
    pub fn try_new_in(value: T, alloc: A) -> Result<Self, AllocError> {
        let deleter = AllocDelete::new(alloc);

        let ptr = {
            let guard = AllocatedPtrGuard::<T, A>::guarded(&deleter.alloc)?;
            unsafe { guard.get().write(value) };
            guard.release()
        };

        Ok(unsafe { Self::from_raw(ptr.as_ptr(), deleter) })
    }

    /// Constructs an object in place in storage allocated from `alloc` and takes ownership of it.
    pub fn emplace_in<N>(new: N, alloc: A) -> Self
    where
        N: New<Output = T>,
        T: Unpin,
    {
        let deleter = AllocDelete::new(alloc);

        let ptr = {
            let mut guard = AllocatedPtrGuard::<T, A>::guarded(&deleter.alloc)
                .unwrap_or_else(|err| handle_alloc_failure(err));
            unsafe { new.new(guard.as_uninit()) };
            guard.release()
        };

        unsafe { Self::from_raw(ptr.as_ptr(), deleter) }
    }

    /// Constructs an object in place in storage allocated from `alloc` and takes ownership of it,
    /// or returns an error if either the allocation or the constructor fails.
    ///
    /// Nothing is leaked on error.
    pub fn try_emplace_in<N>(new: N, alloc: A) -> Result<Self, ConstructError<N::Error>>
    where
        N: TryNew<Output = T>,
        T: Unpin,
    {
        let deleter = AllocDelete::new(alloc);

        let ptr = {
            let mut guard = AllocatedPtrGuard::<T, A>::guarded(&deleter.alloc)?;
            unsafe { new.try_new(guard.as_uninit()) }.map_err(ConstructError::Construct)?;
            guard.release()
        };

        Ok(unsafe { Self::from_raw(ptr.as_ptr(), deleter) })
    }
}

impl<T: ?Sized, D: Deleter<T>> UniquePtr<T, D> {
    /// Returns a null pointer with a default-constructed deleter.
    pub fn null() -> Self
    where
        D: Default,
    {
        Self::null_with(D::default())
    }

    /// Returns a null pointer with the given deleter.
    pub const fn null_with(deleter: D) -> Self {
        Self {
            pair: CompressedPair::new(deleter, None),
        }
    }

    /// Takes ownership of the object at `ptr`, which may be null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a valid object that `deleter` can delete, and nobody else
    /// may own it.
    pub unsafe fn from_raw(ptr: *mut T, deleter: D) -> Self {
        Self {
            pair: CompressedPair::new(deleter, NonNull::new(ptr)),
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        self.pair.second().map(|ptr| unsafe { &mut *ptr.as_ptr() })
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.pair.second().map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    pub fn deleter(&self) -> &D {
        self.pair.first()
    }

    pub fn deleter_mut(&mut self) -> &mut D {
        self.pair.first_mut()
    }

    /// Returns the owned pointer without giving up ownership, or `None` if the pointer is null.
    pub fn get(&self) -> Option<NonNull<T>> {
        *self.pair.second()
    }

    pub fn is_null(&self) -> bool {
        self.pair.second().is_none()
    }

    /// Gives up ownership of the object and returns its pointer, leaving `self` null.
    ///
    /// The caller becomes responsible for deleting the object.
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.pair.second_mut().take()
    }

    /// Deletes the owned object, if any, and leaves `self` null.
    pub fn reset(&mut self) {
        if let Some(old) = self.release() {
            unsafe { self.deleter_mut().delete(old) };
        }
    }

    /// Takes ownership of the object at `ptr`, which may be null, and then deletes the object
    /// owned before.
    ///
    /// # Safety
    ///
    /// Same as for [`from_raw`](Self::from_raw), with the deleter of `self`.
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        let old = mem::replace(self.pair.second_mut(), NonNull::new(ptr));

        if let Some(old) = old {
            self.deleter_mut().delete(old);
        }
    }

    /// Exchanges the objects and deleters of two pointers.
    pub fn swap(&mut self, other: &mut Self) {
        let (deleter, ptr) = self.pair.both_mut();
        let (other_deleter, other_ptr) = other.pair.both_mut();

        mem::swap(ptr, other_ptr);
        mem::swap(deleter, other_deleter);
    }
}

impl<T: ?Sized> From<Box<T>> for UniquePtr<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_box(boxed)
    }
}

impl<T: ?Sized, D: Deleter<T> + Default> Default for UniquePtr<T, D> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, D: Deleter<T>> Deref for UniquePtr<T, D> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the pointer is null.
    fn deref(&self) -> &T {
        match self.as_ref() {
            Some(value) => value,
            None => panic!("dereferenced a null UniquePtr"),
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> DerefMut for UniquePtr<T, D> {
    /// # Panics
    ///
    /// Panics if the pointer is null.
    fn deref_mut(&mut self) -> &mut T {
        match self.as_mut() {
            Some(value) => value,
            None => panic!("dereferenced a null UniquePtr"),
        }
    }
}

impl<T: ?Sized + fmt::Debug, D: Deleter<T>> fmt::Debug for UniquePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ref() {
            Some(value) => f.debug_tuple("UniquePtr").field(&value).finish(),
            None => f.write_str("UniquePtr(null)"),
        }
    }
}

impl<T: ?Sized, D: Deleter<T>> Drop for UniquePtr<T, D> {
    fn drop(&mut self) {
        self.reset()
    }
}
