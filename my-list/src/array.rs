// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A fixed-size array with bounds-checked accessors.

use core::array;
use core::mem;
use core::ops::{Deref, DerefMut};
use core::slice;

use crate::error::OutOfRange;

/// A fixed-size array of `N` elements stored inline.
///
/// `N` may be zero, in which case the array occupies no storage and every accessor reports
/// that there is no element.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Array<T, const N: usize> {
    elements: [T; N],
}

impl<T, const N: usize> Array<T, N> {
    /// Wraps the given elements.
    pub const fn new(elements: [T; N]) -> Self {
        Self { elements }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.elements
    }

    /// Returns a reference to the element at `index`, or an [`OutOfRange`] error.
    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        self.elements.get(index).ok_or(OutOfRange { index, len: N })
    }

    /// Returns a mutable reference to the element at `index`, or an [`OutOfRange`] error.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        self.elements
            .get_mut(index)
            .ok_or(OutOfRange { index, len: N })
    }

    pub fn back(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Assigns a clone of `value` to every element.
    pub fn fill(&mut self, value: &T)
    where
        T: Clone,
    {
        for element in &mut self.elements {
            element.clone_from(value);
        }
    }

    pub fn front(&self) -> Option<&T> {
        self.elements.first()
    }

    /// Unwraps the elements.
    pub fn into_inner(self) -> [T; N] {
        self.elements
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub const fn len(&self) -> usize {
        N
    }

    /// Exchanges the elements of two arrays.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.elements, &mut other.elements)
    }
}

impl<T, const N: usize> Default for Array<T, N>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(array::from_fn(|_| T::default()))
    }
}

impl<T, const N: usize> Deref for Array<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.elements
    }
}

impl<T, const N: usize> DerefMut for Array<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<T, const N: usize> From<[T; N]> for Array<T, N> {
    fn from(elements: [T; N]) -> Self {
        Self::new(elements)
    }
}

impl<T, const N: usize> IntoIterator for Array<T, N> {
    type Item = T;
    type IntoIter = array::IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a Array<T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut Array<T, N> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn test_access() {
        let mut array = Array::new([1, 2, 3]);

        assert_eq!(array.len(), 3);
        assert!(!array.is_empty());
        assert_eq!(array.front(), Some(&1));
        assert_eq!(array.back(), Some(&3));
        assert_eq!(array.at(2), Ok(&3));
        assert_eq!(array.at(3), Err(OutOfRange { index: 3, len: 3 }));

        *array.at_mut(0).unwrap() = 10;
        array[1] = 20;
        assert_eq!(array.as_slice(), [10, 20, 3]);
        assert_eq!(array.into_inner(), [10, 20, 3]);
    }

    #[test]
    fn test_fill_and_swap() {
        let mut a = Array::<String, 2>::default();
        let mut b = Array::new([String::from("x"), String::from("y")]);

        a.fill(&String::from("z"));
        assert_eq!(a.as_slice(), ["z", "z"]);

        a.swap(&mut b);
        assert_eq!(a.as_slice(), ["x", "y"]);
        assert_eq!(b.as_slice(), ["z", "z"]);
    }

    #[test]
    fn test_empty_array() {
        let mut array = Array::<i32, 0>::new([]);

        assert!(array.is_empty());
        assert_eq!(array.front(), None);
        assert_eq!(array.back(), None);
        assert_eq!(array.at(0), Err(OutOfRange { index: 0, len: 0 }));
        assert!(array.at_mut(0).is_err());
        array.fill(&1);
        assert_eq!(mem::size_of_val(&array), 0);
        assert_eq!(array.into_iter().count(), 0);
    }

    #[test]
    fn test_iteration_and_comparison() {
        let mut array = Array::from([3, 1, 2]);

        for element in &mut array {
            *element *= 2;
        }
        assert_eq!((&array).into_iter().sum::<i32>(), 12);

        array.sort();
        assert_eq!(array.into_iter().collect::<Vec<_>>(), [2, 4, 6]);

        assert!(Array::new([1, 2]) < Array::new([1, 3]));
        assert_eq!(Array::new([1, 2]), Array::from([1, 2]));
    }
}
