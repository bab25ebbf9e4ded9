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

use num_traits::{PrimInt, Signed};
use strippack_model::placement::Placement;

/// What a search established about an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverResult<T> {
    /// The search space was exhausted without a single complete placement.
    Infeasible,
    /// A placement was found and proven to have minimal width.
    Optimal(Placement<T>),
    /// A placement was found but the search stopped before proving optimality.
    Feasible(Placement<T>),
    /// The search stopped without a placement and without an infeasibility proof.
    Unknown,
}

impl<T> SolverResult<T> {
    /// Returns the placement carried by `Optimal` or `Feasible`.
    #[inline]
    pub fn placement(&self) -> Option<&Placement<T>> {
        match self {
            SolverResult::Optimal(placement) | SolverResult::Feasible(placement) => {
                Some(placement)
            }
            SolverResult::Infeasible | SolverResult::Unknown => None,
        }
    }

    /// Consumes the result and returns its placement, if any.
    #[inline]
    pub fn into_placement(self) -> Option<Placement<T>> {
        match self {
            SolverResult::Optimal(placement) | SolverResult::Feasible(placement) => {
                Some(placement)
            }
            SolverResult::Infeasible | SolverResult::Unknown => None,
        }
    }
}

impl<T> std::fmt::Display for SolverResult<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverResult::Infeasible => write!(f, "Infeasible"),
            SolverResult::Optimal(placement) => {
                write!(f, "Optimal(objective={})", placement.objective())
            }
            SolverResult::Feasible(placement) => {
                write!(f, "Feasible(objective={})", placement.objective())
            }
            SolverResult::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The incumbent was proven optimal.
    OptimalityProven,
    /// No placement exists.
    InfeasibilityProven,
    /// A monitor stopped the search; the string names the limit that fired.
    Aborted(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}
