// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types returned by the fallible (`try_*`) operations of the containers.

use core::alloc::Layout;
use core::convert::Infallible;
use core::fmt;

/// The allocator could not satisfy a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The requested number of elements does not fit into the address space.
    CapacityOverflow,
    /// The allocator returned an error for the given layout.
    OutOfMemory { layout: Layout },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow => f.write_str("capacity overflow"),
            Self::OutOfMemory { layout } => write!(
                f,
                "memory allocation of {} bytes (alignment {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl core::error::Error for AllocError {}

/// A bounds-checked accessor was called with an index past the end of the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} is out of range for a container of length {}",
            self.index, self.len
        )
    }
}

impl core::error::Error for OutOfRange {}

/// In-place construction of an element failed, either while obtaining its storage or inside
/// the element constructor itself.
///
/// Either way, the container is left exactly as it was before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructError<E> {
    Alloc(AllocError),
    Construct(E),
}

impl<E> From<AllocError> for ConstructError<E> {
    fn from(err: AllocError) -> Self {
        Self::Alloc(err)
    }
}

impl<E: fmt::Display> fmt::Display for ConstructError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(err) => write!(f, "cannot allocate element storage: {err}"),
            Self::Construct(err) => write!(f, "element constructor failed: {err}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for ConstructError<E> {}

impl ConstructError<Infallible> {
    pub(crate) fn into_alloc_error(self) -> AllocError {
        match self {
            Self::Alloc(err) => err,
            Self::Construct(never) => match never {},
        }
    }
}

/// Diverges on an allocation failure reported to an infallible operation, the same way the
/// collections of `alloc` do.
#[cold]
pub(crate) fn handle_alloc_failure(err: AllocError) -> ! {
    match err {
        AllocError::CapacityOverflow => panic!("capacity overflow"),
        AllocError::OutOfMemory { layout } => alloc::alloc::handle_alloc_error(layout),
    }
}
