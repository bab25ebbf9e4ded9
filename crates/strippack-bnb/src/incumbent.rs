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

//! Incumbent access for the search engine.
//!
//! `IncumbentStore<T>` is what `BnbSolver` sees of the best known width: an
//! initial bound, a way to pull in tighter bounds found elsewhere, and a
//! place to publish its own improvements.
//!
//! - `NoSharedIncumbent<T>`: a single isolated search. The initial bound is
//!   `T::max_value()` and nothing is published.
//! - `SharedIncumbentAdapter<'a, T>`: borrows a
//!   `strippack_search::incumbent::SharedIncumbent<T>` shared by several
//!   workers, so a width found by one prunes all of them.

use std::marker::PhantomData;
use strippack_model::placement::Placement;
use strippack_search::{incumbent::SharedIncumbent, num::SolverNumeric};

pub trait IncumbentStore<T>
where
    T: SolverNumeric,
{
    /// The bound the search starts with.
    fn initial_upper_bound(&self) -> T;

    /// Returns the tighter of `current_local_best` and the stored bound.
    fn tighten(&self, current_local_best: T) -> T;

    /// Publishes a strictly improving placement.
    fn on_solution_found(&self, placement: &Placement<T>);
}

#[repr(transparent)]
pub struct NoSharedIncumbent<T>(PhantomData<T>);

impl<T> Default for NoSharedIncumbent<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NoSharedIncumbent<T>
where
    T: SolverNumeric,
{
    #[inline(always)]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> IncumbentStore<T> for NoSharedIncumbent<T>
where
    T: SolverNumeric,
{
    #[inline(always)]
    fn initial_upper_bound(&self) -> T {
        T::max_value()
    }

    #[inline(always)]
    fn tighten(&self, current_local_best: T) -> T {
        current_local_best
    }

    #[inline(always)]
    fn on_solution_found(&self, _: &Placement<T>) {}
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct SharedIncumbentAdapter<'a, T> {
    inner: &'a SharedIncumbent<T>,
}

impl<'a, T> SharedIncumbentAdapter<'a, T> {
    #[inline(always)]
    pub fn new(inner: &'a SharedIncumbent<T>) -> Self {
        Self { inner }
    }

    #[inline(always)]
    fn shared_bound(&self) -> T
    where
        T: SolverNumeric,
    {
        // An unset bound (`i64::MAX`) does not fit narrower types.
        self.inner.upper_bound_as().unwrap_or_else(|_| T::max_value())
    }
}

impl<T> IncumbentStore<T> for SharedIncumbentAdapter<'_, T>
where
    T: SolverNumeric,
{
    #[inline(always)]
    fn initial_upper_bound(&self) -> T {
        self.shared_bound()
    }

    #[inline(always)]
    fn tighten(&self, current_local_best: T) -> T {
        self.shared_bound().min(current_local_best)
    }

    #[inline(always)]
    fn on_solution_found(&self, placement: &Placement<T>) {
        self.inner.try_install(placement);
    }
}
