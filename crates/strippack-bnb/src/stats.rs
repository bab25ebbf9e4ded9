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

use num_traits::Zero;
use std::time::Duration;

/// Counters collected while a branch-and-bound search runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BnbSolverStatistics<T> {
    /// Nodes entered, including the root.
    pub nodes_explored: u64,
    /// Levels left after their children were exhausted or pruned.
    pub backtracks: u64,
    /// Child decisions pushed onto the stack.
    pub decisions_generated: u64,
    /// The deepest level reached in the tree.
    pub max_depth: u64,
    /// Nodes pruned because propagation emptied a domain or left a pair
    /// without any possible relation.
    pub prunings_infeasible: u64,
    /// Nodes pruned because their lower bound could not beat the incumbent.
    pub prunings_bound: u64,
    /// Pairs resolved by propagation rather than by branching.
    pub forced_relations: u64,
    /// Strictly improving solutions accepted.
    pub solutions_found: u64,
    pub time_total: Duration,
    /// The lower bound computed at the root node.
    pub root_lower_bound: T,
}

impl<T> Default for BnbSolverStatistics<T>
where
    T: Zero,
{
    fn default() -> Self {
        Self {
            nodes_explored: 0,
            backtracks: 0,
            decisions_generated: 0,
            max_depth: 0,
            prunings_infeasible: 0,
            prunings_bound: 0,
            forced_relations: 0,
            solutions_found: 0,
            time_total: Duration::ZERO,
            root_lower_bound: T::zero(),
        }
    }
}

impl<T> BnbSolverStatistics<T> {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_backtrack(&mut self) {
        self.backtracks = self.backtracks.saturating_add(1);
    }

    #[inline]
    pub fn on_solution_found(&mut self) {
        self.solutions_found = self.solutions_found.saturating_add(1);
    }

    #[inline]
    pub fn on_depth_update(&mut self, depth: u64) {
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn on_decisions_generated(&mut self, count: usize) {
        self.decisions_generated = self.decisions_generated.saturating_add(count as u64);
    }

    #[inline]
    pub fn on_pruning_infeasible(&mut self) {
        self.prunings_infeasible = self.prunings_infeasible.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_forced_relations(&mut self, count: usize) {
        self.forced_relations = self.forced_relations.saturating_add(count as u64);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    #[inline]
    pub fn set_root_lower_bound(&mut self, bound: T) {
        self.root_lower_bound = bound;
    }
}

impl<T> BnbSolverStatistics<T>
where
    T: Ord + Copy,
{
    /// Folds the counters of another search (e.g. a parallel worker) into
    /// `self`. Counters add up, `max_depth` and `time_total` take the
    /// maximum, and the root bound keeps the smaller of the two.
    pub fn merge(&mut self, other: &Self) {
        self.nodes_explored = self.nodes_explored.saturating_add(other.nodes_explored);
        self.backtracks = self.backtracks.saturating_add(other.backtracks);
        self.decisions_generated = self
            .decisions_generated
            .saturating_add(other.decisions_generated);
        self.max_depth = self.max_depth.max(other.max_depth);
        self.prunings_infeasible = self
            .prunings_infeasible
            .saturating_add(other.prunings_infeasible);
        self.prunings_bound = self.prunings_bound.saturating_add(other.prunings_bound);
        self.forced_relations = self.forced_relations.saturating_add(other.forced_relations);
        self.solutions_found = self.solutions_found.saturating_add(other.solutions_found);
        self.time_total = self.time_total.max(other.time_total);
        self.root_lower_bound = self.root_lower_bound.min(other.root_lower_bound);
    }
}

impl<T> std::fmt::Display for BnbSolverStatistics<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Strippack-BnB Solver Statistics:")?;
        writeln!(f, "  Nodes explored:        {}", self.nodes_explored)?;
        writeln!(f, "  Backtracks:            {}", self.backtracks)?;
        writeln!(f, "  Max depth reached:     {}", self.max_depth)?;
        writeln!(f, "  Decisions generated:   {}", self.decisions_generated)?;
        writeln!(f, "  Forced relations:      {}", self.forced_relations)?;
        writeln!(f, "  Prunings (infeasible): {}", self.prunings_infeasible)?;
        writeln!(f, "  Prunings (bound):      {}", self.prunings_bound)?;
        writeln!(f, "  Solutions found:       {}", self.solutions_found)?;
        writeln!(f, "  Root lower bound:      {}", self.root_lower_bound)?;
        writeln!(f, "  Total time:            {:.2?}", self.time_total)?;
        Ok(())
    }
}
