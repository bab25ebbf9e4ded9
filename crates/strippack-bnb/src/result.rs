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

use crate::stats::BnbSolverStatistics;
use strippack_model::placement::Placement;
use strippack_search::result::{SolverResult, TerminationReason};

/// Result of the solver after termination.
#[derive(Debug, Clone)]
pub struct BnbSolverOutcome<T> {
    result: SolverResult<T>,
    termination_reason: TerminationReason,
    statistics: BnbSolverStatistics<T>,
}

impl<T> BnbSolverOutcome<T> {
    #[inline]
    pub fn optimal(placement: Placement<T>, statistics: BnbSolverStatistics<T>) -> Self {
        Self {
            result: SolverResult::Optimal(placement),
            termination_reason: TerminationReason::OptimalityProven,
            statistics,
        }
    }

    #[inline]
    pub fn infeasible(statistics: BnbSolverStatistics<T>) -> Self {
        Self {
            result: SolverResult::Infeasible,
            termination_reason: TerminationReason::InfeasibilityProven,
            statistics,
        }
    }

    /// An interrupted search. Carries the best placement found so far as
    /// `Feasible`, or `Unknown` if there is none: a stopped search proves
    /// nothing about infeasibility.
    #[inline]
    pub fn aborted<R>(
        placement: Option<Placement<T>>,
        reason: R,
        statistics: BnbSolverStatistics<T>,
    ) -> Self
    where
        R: Into<String>,
    {
        let result = match placement {
            Some(placement) => SolverResult::Feasible(placement),
            None => SolverResult::Unknown,
        };

        Self {
            result,
            termination_reason: TerminationReason::Aborted(reason.into()),
            statistics,
        }
    }

    #[inline]
    pub fn result(&self) -> &SolverResult<T> {
        &self.result
    }

    #[inline]
    pub fn termination_reason(&self) -> &TerminationReason {
        &self.termination_reason
    }

    #[inline]
    pub fn statistics(&self) -> &BnbSolverStatistics<T> {
        &self.statistics
    }

    #[inline]
    pub fn into_parts(self) -> (SolverResult<T>, TerminationReason, BnbSolverStatistics<T>) {
        (self.result, self.termination_reason, self.statistics)
    }
}

impl<T> std::fmt::Display for BnbSolverOutcome<T>
where
    T: num_traits::PrimInt + num_traits::Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BnbSolverOutcome(result: {}, termination: {})",
            self.result, self.termination_reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> BnbSolverStatistics<i64> {
        BnbSolverStatistics::default()
    }

    #[test]
    fn test_aborted_without_placement_is_unknown() {
        let outcome = BnbSolverOutcome::<i64>::aborted(None, "time limit", stats());
        assert_eq!(outcome.result(), &SolverResult::Unknown);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::Aborted("time limit".to_string())
        );
    }

    #[test]
    fn test_aborted_with_placement_is_feasible() {
        let placement = Placement::new(4, vec![0], vec![0]);
        let outcome = BnbSolverOutcome::aborted(Some(placement.clone()), "node limit", stats());
        assert_eq!(outcome.result(), &SolverResult::Feasible(placement));
    }

    #[test]
    fn test_optimal_and_infeasible() {
        let placement = Placement::new(2, vec![0, 1], vec![0, 0]);
        let optimal = BnbSolverOutcome::optimal(placement.clone(), stats());
        assert_eq!(
            optimal.termination_reason(),
            &TerminationReason::OptimalityProven
        );
        assert_eq!(optimal.result().placement(), Some(&placement));
        assert_eq!(
            format!("{}", optimal),
            "BnbSolverOutcome(result: Optimal(objective=2), termination: Optimality Proven)"
        );

        let infeasible = BnbSolverOutcome::<i64>::infeasible(stats());
        let (result, reason, _) = infeasible.into_parts();
        assert_eq!(result, SolverResult::Infeasible);
        assert_eq!(reason, TerminationReason::InfeasibilityProven);
    }
}
