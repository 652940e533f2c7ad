// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The allocator machinery shared by all containers.
//!
//! * [`AllocTraits`] is the single entry point through which containers allocate, construct,
//!   destroy, and deallocate, and through which they query the [`AllocPolicy`] flags.
//! * [`TypedAlloc`] binds a raw [`Allocator`] to an element type and can be rebound to other types
//!   (a list allocates nodes and its sentinel through the same allocator).
//! * [`AllocatedPtrGuard`] deallocates a freshly allocated slot if constructing the element fails.
//! * [`CompressedPair`] stores an allocator next to the container state without any overhead
//!   for zero-sized allocators.
//!
//! [`AllocPolicy`]: crate::AllocPolicy
//! [`Allocator`]: allocator_api2::alloc::Allocator

mod guard;
mod pair;
mod traits;
mod typed;

pub use guard::*;
pub(crate) use guard::pinned_slot;
pub use pair::*;
pub use traits::*;
pub use typed::*;
