// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

/// A pair that stores an allocator (or another often stateless value) next to the container state.
///
/// Zero-sized types take up no space in a Rust struct, so a `CompressedPair` with a stateless
/// `first` is exactly as large as its `second`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompressedPair<A, B> {
    first: A,
    second: B,
}

impl<A, B> CompressedPair<A, B> {
    /// Creates a pair from both of its values.
    pub const fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Creates a pair with a default-constructed `first`.
    pub fn with_default_first(second: B) -> Self
    where
        A: Default,
    {
        Self::new(A::default(), second)
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    /// Borrows both values mutably at the same time.
    pub fn both_mut(&mut self) -> (&mut A, &mut B) {
        (&mut self.first, &mut self.second)
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocator_api2::alloc::Global;
    use core::mem::size_of;

    #[test]
    fn test_zero_sized_first_is_free() {
        assert_eq!(
            size_of::<CompressedPair<Global, usize>>(),
            size_of::<usize>()
        );
        assert_eq!(size_of::<CompressedPair<(), [u32; 3]>>(), 12);
        assert!(size_of::<CompressedPair<u64, u64>>() >= 16);
    }

    #[test]
    fn test_constructors_and_accessors() {
        let mut pair = CompressedPair::new(1u8, 'x');
        assert_eq!(*pair.first(), 1);
        assert_eq!(*pair.second(), 'x');

        *pair.first_mut() += 1;
        *pair.second_mut() = 'y';
        let (first, second) = pair.both_mut();
        *first *= 10;
        *second = 'z';
        assert_eq!(pair.into_parts(), (20, 'z'));

        let pair = CompressedPair::<u32, &str>::with_default_first("second");
        assert_eq!(*pair.first(), 0);
        assert_eq!(*pair.second(), "second");
    }
}
