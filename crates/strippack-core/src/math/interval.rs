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

use num_traits::PrimInt;
use std::cmp::{max, min};

/// A closed interval `[lower, upper]` over a primitive integer type.
///
/// The interval contains every integer `v` with `lower <= v <= upper`.
/// It is the domain representation of a single coordinate variable: the
/// solver only ever shrinks it, and an attempt to shrink it past a single
/// point is reported as `None` by the narrowing operations.
///
/// # Invariants
/// `lower` must always be less than or equal to `upper`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosedInterval<T>
where
    T: PrimInt,
{
    lower: T,
    upper: T,
}

impl<T> ClosedInterval<T>
where
    T: PrimInt,
{
    /// Creates a new `ClosedInterval`.
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_core::math::interval::ClosedInterval;
    ///
    /// let iv = ClosedInterval::new(0, 9);
    /// assert_eq!(iv.num_points(), 10);
    /// ```
    #[inline]
    pub fn new(lower: T, upper: T) -> Self {
        assert!(
            lower <= upper,
            "Invalid interval: lower must be less than or equal to upper"
        );
        Self { lower, upper }
    }

    /// Creates a new `ClosedInterval` if the bounds are ordered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_core::math::interval::ClosedInterval;
    ///
    /// assert!(ClosedInterval::try_new(0, 10).is_some());
    /// assert!(ClosedInterval::try_new(3, 3).is_some());
    /// assert!(ClosedInterval::try_new(10, 0).is_none());
    /// ```
    #[inline]
    pub fn try_new(lower: T, upper: T) -> Option<Self> {
        if lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// Creates the single-point interval `[value, value]`.
    #[inline]
    pub fn singleton(value: T) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    /// Returns the inclusive lower bound.
    #[inline]
    pub const fn lower(&self) -> T {
        self.lower
    }

    /// Returns the inclusive upper bound.
    #[inline]
    pub const fn upper(&self) -> T {
        self.upper
    }

    /// Returns `true` if the interval contains exactly one point.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.lower == self.upper
    }

    /// Returns `true` if `value` lies within `[lower, upper]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_core::math::interval::ClosedInterval;
    ///
    /// let iv = ClosedInterval::new(2, 5);
    /// assert!(iv.contains(2));
    /// assert!(iv.contains(5));
    /// assert!(!iv.contains(6));
    /// ```
    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Returns `true` if `other` lies entirely within `self`.
    #[inline]
    pub fn contains_interval(&self, other: Self) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }

    /// Returns the intersection of `self` and `other`, or `None` if they are disjoint.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_core::math::interval::ClosedInterval;
    ///
    /// let a = ClosedInterval::new(0, 10);
    /// let b = ClosedInterval::new(5, 15);
    /// assert_eq!(a.intersection(b), Some(ClosedInterval::new(5, 10)));
    /// assert_eq!(a.intersection(ClosedInterval::new(11, 12)), None);
    /// ```
    #[inline]
    pub fn intersection(&self, other: Self) -> Option<Self> {
        Self::try_new(max(self.lower, other.lower), min(self.upper, other.upper))
    }

    /// Intersects the interval with the bounds `[lower, upper]`.
    ///
    /// Unlike `intersection`, the bounds need not be ordered: an inverted
    /// pair simply yields `None`. This is the primitive behind domain narrowing.
    #[inline]
    pub fn restrict(&self, lower: T, upper: T) -> Option<Self> {
        Self::try_new(max(self.lower, lower), min(self.upper, upper))
    }

    /// Returns the number of integer points in the interval,
    /// saturating at `u64::MAX`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use strippack_core::math::interval::ClosedInterval;
    ///
    /// assert_eq!(ClosedInterval::new(4, 4).num_points(), 1);
    /// assert_eq!(ClosedInterval::new(-2, 2).num_points(), 5);
    /// ```
    #[inline]
    pub fn num_points(&self) -> u64 {
        match self
            .upper
            .checked_sub(&self.lower)
            .and_then(|distance| distance.to_u64())
        {
            Some(distance) => distance.saturating_add(1),
            None => u64::MAX,
        }
    }
}

impl<T> std::fmt::Debug for ClosedInterval<T>
where
    T: PrimInt + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.lower, self.upper)
    }
}

impl<T> std::fmt::Display for ClosedInterval<T>
where
    T: PrimInt + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

impl<T> From<ClosedInterval<T>> for std::ops::RangeInclusive<T>
where
    T: PrimInt,
{
    #[inline]
    fn from(value: ClosedInterval<T>) -> Self {
        value.lower..=value.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let iv = ClosedInterval::new(3i64, 8);
        assert_eq!(iv.lower(), 3);
        assert_eq!(iv.upper(), 8);
        assert_eq!(iv.num_points(), 6);
        assert!(!iv.is_singleton());
    }

    #[test]
    #[should_panic(expected = "Invalid interval")]
    fn test_new_panics_on_inverted_bounds() {
        let _ = ClosedInterval::new(5i64, 4);
    }

    #[test]
    fn test_singleton() {
        let iv = ClosedInterval::singleton(7i32);
        assert!(iv.is_singleton());
        assert_eq!(iv.num_points(), 1);
        assert!(iv.contains(7));
        assert!(!iv.contains(6));
    }

    #[test]
    fn test_restrict_shrinks_or_empties() {
        let iv = ClosedInterval::new(0i64, 10);
        assert_eq!(iv.restrict(2, 20), Some(ClosedInterval::new(2, 10)));
        assert_eq!(iv.restrict(-5, 4), Some(ClosedInterval::new(0, 4)));
        assert_eq!(iv.restrict(10, 10), Some(ClosedInterval::singleton(10)));
        assert_eq!(iv.restrict(11, 20), None);
        assert_eq!(iv.restrict(6, 5), None);
    }

    #[test]
    fn test_restrict_never_grows() {
        let iv = ClosedInterval::new(3i64, 6);
        let wider = iv.restrict(-100, 100).unwrap();
        assert_eq!(wider, iv);
        assert!(iv.contains_interval(wider));
    }

    #[test]
    fn test_intersection_symmetry() {
        let a = ClosedInterval::new(0i64, 5);
        let b = ClosedInterval::new(5i64, 9);
        assert_eq!(a.intersection(b), Some(ClosedInterval::singleton(5)));
        assert_eq!(a.intersection(b), b.intersection(a));
    }

    #[test]
    fn test_num_points_saturates() {
        let iv = ClosedInterval::new(i64::MIN, i64::MAX);
        assert_eq!(iv.num_points(), u64::MAX);
    }

    #[test]
    fn test_display_and_debug() {
        let iv = ClosedInterval::new(1i64, 4);
        assert_eq!(format!("{}", iv), "[1, 4]");
        assert_eq!(format!("{:?}", iv), "[1, 4]");
    }

    #[test]
    fn test_into_range_inclusive() {
        let iv = ClosedInterval::new(2i64, 4);
        let points: Vec<i64> = std::ops::RangeInclusive::from(iv).collect();
        assert_eq!(points, vec![2, 3, 4]);
    }
}
