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

use strippack_model::model::ModelError;

/// Why a solve produced no placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The instance was rejected before any search.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ModelError),
    /// The whole search space was explored without a single complete
    /// placement.
    #[error("no feasible placement exists")]
    NoFeasibleSolution,
    /// A limit stopped the search before any placement was found. Nothing
    /// is known about feasibility.
    #[error("search stopped before a placement was found: {reason}")]
    SearchExhausted { reason: String },
    /// The search was warm-started with `upper_bound` and proved that no
    /// strictly narrower placement exists.
    #[error("no placement narrower than {upper_bound} exists")]
    NoImprovingPlacement { upper_bound: i64 },
}

impl SolveError {
    /// Returns `true` if the error proves something about the instance, as
    /// opposed to a search that ran out of budget.
    #[inline]
    pub fn is_proof(&self) -> bool {
        matches!(
            self,
            SolveError::NoFeasibleSolution | SolveError::NoImprovingPlacement { .. }
        )
    }
}
