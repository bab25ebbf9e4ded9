// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Typed Indices
//!
//! Phantom-tagged wrappers around `usize`. A packing model addresses items,
//! item pairs and coordinate axes through separate index spaces; tagging the
//! index with its space turns an accidental swap (an item index used to look
//! up a pair relation) into a type error. `TypedIndex<T>` is
//! `#[repr(transparent)]` over `usize`, so the tag costs nothing at runtime.
//!
//! ```rust
//! use strippack_core::utils::index::{TypedIndex, TypedIndexTag};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct RectTag;
//! impl TypedIndexTag for RectTag { const NAME: &'static str = "RectIndex"; }
//!
//! type RectIndex = TypedIndex<RectTag>;
//! let r = RectIndex::new(3);
//! assert_eq!(r.get(), 3);
//! assert_eq!(format!("{}", r), "RectIndex(3)");
//! ```

/// Names an index space for `Debug` and `Display` output.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A `usize` index bound to the index space `T`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Creates a new `TypedIndex` wrapping `index`.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the underlying `usize` index.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }

    /// Returns `true` if this is the first index of its space.
    #[inline(always)]
    pub const fn is_zero(&self) -> bool {
        self.index == 0
    }

    /// Returns the index directly following this one.
    #[inline(always)]
    pub const fn next(&self) -> Self {
        Self::new(self.index + 1)
    }

    /// Iterates over the first `len` indices of the space.
    ///
    /// ```rust
    /// # use strippack_core::utils::index::{TypedIndex, TypedIndexTag};
    /// # #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    /// # struct RectTag;
    /// # impl TypedIndexTag for RectTag { const NAME: &'static str = "RectIndex"; }
    /// let all: Vec<usize> = TypedIndex::<RectTag>::range(3).map(|i| i.get()).collect();
    /// assert_eq!(all, vec![0, 1, 2]);
    /// ```
    #[inline]
    pub fn range(len: usize) -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..len).map(Self::new)
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline]
    fn from(typed_index: TypedIndex<T>) -> Self {
        typed_index.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    struct SlotTag;

    impl TypedIndexTag for SlotTag {
        const NAME: &'static str = "SlotIdx";
    }

    type SlotIndex = TypedIndex<SlotTag>;

    #[test]
    fn test_new_get_and_zero() {
        let idx = SlotIndex::new(10);
        assert_eq!(idx.get(), 10);
        assert!(!idx.is_zero());
        assert!(SlotIndex::new(0).is_zero());
    }

    #[test]
    fn test_conversions() {
        let idx: SlotIndex = 42.into();
        assert_eq!(idx.get(), 42);
        let raw: usize = idx.into();
        assert_eq!(raw, 42);
    }

    #[test]
    fn test_debug_and_display_use_tag_name() {
        let idx = SlotIndex::new(7);
        assert_eq!(format!("{}", idx), "SlotIdx(7)");
        assert_eq!(format!("{:?}", idx), "SlotIdx(7)");
    }

    #[test]
    fn test_next_and_range() {
        assert_eq!(SlotIndex::new(4).next(), SlotIndex::new(5));

        let indices: Vec<SlotIndex> = SlotIndex::range(3).collect();
        assert_eq!(
            indices,
            vec![SlotIndex::new(0), SlotIndex::new(1), SlotIndex::new(2)]
        );
        assert_eq!(SlotIndex::range(0).len(), 0);
        assert_eq!(SlotIndex::range(5).rev().next(), Some(SlotIndex::new(4)));
    }

    #[test]
    fn test_ordering_follows_raw_index() {
        assert!(SlotIndex::new(1) < SlotIndex::new(2));
    }
}
