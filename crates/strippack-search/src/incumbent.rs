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

//! # Shared Incumbent
//!
//! The best placement found so far, shared by every worker of a search.
//!
//! The objective upper bound lives in an `AtomicI64` so the hot pruning path
//! reads it without locking. The placement itself sits behind a
//! `parking_lot::Mutex` and is the source of truth: an install re-checks the
//! bound under the lock, so only strictly better placements are accepted
//! even when several workers race.
//!
//! A bound can also be tightened on its own (`tighten_upper_bound`) to
//! warm-start a search with an externally known width; placements must then
//! beat that value to be installed.
//!
//! ```rust
//! use strippack_model::placement::Placement;
//! use strippack_search::incumbent::SharedIncumbent;
//!
//! let incumbent = SharedIncumbent::<i64>::new();
//! assert!(incumbent.try_install(&Placement::new(9, vec![0], vec![0])));
//! assert!(!incumbent.try_install(&Placement::new(9, vec![1], vec![0])));
//! assert_eq!(incumbent.upper_bound(), 9);
//! ```

use num_traits::{PrimInt, Signed};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use strippack_model::placement::Placement;

/// Thread-safe holder of the best known placement and its objective.
///
/// `upper_bound` starts at `i64::MAX`, meaning nothing is known yet.
#[derive(Debug)]
pub struct SharedIncumbent<T> {
    upper_bound: AtomicI64,
    placement: Mutex<Option<Placement<T>>>,
}

impl<T> Default for SharedIncumbent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Display for SharedIncumbent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Incumbent(upper_bound: {})", self.upper_bound())
    }
}

impl<T> SharedIncumbent<T> {
    /// Creates an empty incumbent with an unbounded objective.
    #[inline]
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicI64::new(i64::MAX),
            placement: Mutex::new(None),
        }
    }

    /// Creates an empty incumbent whose objective bound is already `upper_bound`.
    ///
    /// Only placements with an objective strictly below `upper_bound` will
    /// be accepted.
    #[inline]
    pub fn with_upper_bound(upper_bound: T) -> Self
    where
        T: Into<i64>,
    {
        Self {
            upper_bound: AtomicI64::new(upper_bound.into()),
            placement: Mutex::new(None),
        }
    }

    /// Returns the current objective upper bound.
    #[inline]
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound.load(Ordering::Acquire)
    }

    /// Returns the current upper bound converted to `T`.
    #[inline]
    pub fn upper_bound_as(&self) -> Result<T, <T as TryFrom<i64>>::Error>
    where
        T: TryFrom<i64>,
    {
        T::try_from(self.upper_bound())
    }

    /// Returns `true` if a placement has been installed.
    #[inline]
    pub fn has_placement(&self) -> bool {
        self.placement.lock().is_some()
    }

    /// Returns a clone of the installed placement, if any.
    #[inline]
    pub fn snapshot(&self) -> Option<Placement<T>>
    where
        T: Clone,
    {
        self.placement.lock().clone()
    }

    /// Lowers the upper bound to `value` if that is strictly better.
    ///
    /// Returns `true` if the bound changed. Safe under concurrent callers:
    /// the bound only ever decreases.
    pub fn tighten_upper_bound(&self, value: i64) -> bool {
        let mut current = self.upper_bound.load(Ordering::Acquire);
        while value < current {
            match self.upper_bound.compare_exchange_weak(
                current,
                value,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
        false
    }

    /// Installs `candidate` if its objective is strictly below the current bound.
    ///
    /// Returns `true` if the candidate became the new incumbent.
    pub fn try_install(&self, candidate: &Placement<T>) -> bool
    where
        T: PrimInt + Signed + Into<i64>,
    {
        let objective: i64 = candidate.objective().into();
        if objective >= self.upper_bound() {
            return false;
        }

        let mut guard = self.placement.lock();
        // Another worker may have installed a better placement, or tightened
        // the bound, while this one waited for the lock.
        if objective >= self.upper_bound() {
            return false;
        }
        if let Some(current) = guard.as_ref() {
            let current_objective: i64 = current.objective().into();
            if objective >= current_objective {
                return false;
            }
        }

        *guard = Some(candidate.clone());
        self.tighten_upper_bound(objective);
        true
    }

    /// Removes the placement and resets the bound to `i64::MAX`.
    pub fn clear(&self) {
        let mut guard = self.placement.lock();
        *guard = None;
        self.upper_bound.store(i64::MAX, Ordering::Release);
    }
}
