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

//! Tree search monitoring interface
//!
//! Declares the `TreeSearchMonitor` trait and `PruneReason` for observing and
//! controlling the branch-and-bound search. A monitor influences execution
//! only through `search_command`; every other callback is observational.
//!
//! Lifecycle
//! - enter -> step -> {lower bound / prune | decisions / descend / backtrack}
//!   -> solution -> exit
//! - `BnbSolverStatistics` is passed to every callback.
//!
//! Every callback except `name` has an empty default, so a monitor only
//! implements what it cares about. Callbacks run on the search thread; keep
//! them cheap.

use crate::{branching::decision::Decision, state::SearchState, stats::BnbSolverStatistics};
use num_traits::{PrimInt, Signed};
use strippack_model::{model::Model, placement::Placement};
use strippack_search::command::SearchCommand;

/// Why a node was discarded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// Propagation emptied a domain, or a pair had no possible relation.
    Infeasible,
    /// The node's lower bound cannot beat the incumbent.
    BoundDominated,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "Infeasible"),
            PruneReason::BoundDominated => write!(f, "BoundDominated"),
        }
    }
}

#[allow(unused_variables)]
pub trait TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;

    fn on_enter_search(&mut self, model: &Model<T>, statistics: &BnbSolverStatistics<T>) {}

    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>) {}

    /// Polled once per step; `Terminate` stops the search and keeps the
    /// incumbent.
    fn search_command(
        &mut self,
        state: &SearchState<T>,
        statistics: &BnbSolverStatistics<T>,
    ) -> SearchCommand {
        SearchCommand::Continue
    }

    fn on_step(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {}

    fn on_lower_bound_computed(
        &mut self,
        state: &SearchState<T>,
        lower_bound: T,
        statistics: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_prune(
        &mut self,
        state: &SearchState<T>,
        reason: PruneReason,
        statistics: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_decisions_enqueued(
        &mut self,
        state: &SearchState<T>,
        count: usize,
        statistics: &BnbSolverStatistics<T>,
    ) {
    }

    /// Called before `decision` is applied.
    fn on_descend(
        &mut self,
        state: &SearchState<T>,
        decision: Decision,
        statistics: &BnbSolverStatistics<T>,
    ) {
    }

    fn on_backtrack(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {}

    /// Called for every strictly improving placement.
    fn on_solution_found(
        &mut self,
        placement: &Placement<T>,
        statistics: &BnbSolverStatistics<T>,
    ) {
    }
}

impl<T> std::fmt::Debug for dyn TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}

impl<T> std::fmt::Display for dyn TreeSearchMonitor<T>
where
    T: PrimInt + Signed,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TreeSearchMonitor({})", self.name())
    }
}
