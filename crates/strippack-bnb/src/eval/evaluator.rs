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

use crate::state::SearchState;
use num_traits::{PrimInt, Signed};
use strippack_model::model::Model;

/// Bounds and objective of a packing, decoupled from the search engine.
///
/// The solver calls:
/// - `static_lower_bound` once per solve, as a proof target: a placement
///   reaching it is optimal without exhausting the tree,
/// - `lower_bound` at every node, pruning when it reaches the incumbent,
/// - `evaluate` at every complete leaf.
pub trait ObjectiveEvaluator<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;

    /// A bound that holds for every placement of `model`.
    fn static_lower_bound(&self, model: &Model<T>) -> T;

    /// The width of placing every item side by side, which is always
    /// feasible when every item fits the strip.
    #[inline]
    fn trivial_upper_bound(&self, model: &Model<T>) -> T {
        model.total_width()
    }

    /// A bound on the objective of every placement reachable from `state`.
    fn lower_bound(&mut self, model: &Model<T>, state: &SearchState<T>) -> T;

    /// The exact objective of a complete state, or `None` if some domain is
    /// not yet a single point.
    fn evaluate(&mut self, model: &Model<T>, state: &SearchState<T>) -> Option<T>;
}

impl<T> std::fmt::Debug for dyn ObjectiveEvaluator<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectiveEvaluator({})", self.name())
    }
}

impl<T> std::fmt::Display for dyn ObjectiveEvaluator<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectiveEvaluator({})", self.name())
    }
}
