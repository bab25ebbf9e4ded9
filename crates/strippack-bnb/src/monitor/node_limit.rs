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

use crate::{
    monitor::tree_search_monitor::TreeSearchMonitor, state::SearchState,
    stats::BnbSolverStatistics,
};
use num_traits::{PrimInt, Signed};
use strippack_search::command::SearchCommand;

/// Terminates the search once `node_limit` nodes have been explored.
///
/// Nodes of earlier searches driven by the same monitor count towards the
/// limit, so a parallel worker that explores several root alternatives
/// spends one budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLimitMonitor {
    node_limit: u64,
    nodes_spent: u64,
}

impl NodeLimitMonitor {
    /// Creates a new `NodeLimitMonitor` allowing `node_limit` nodes in total.
    #[inline]
    pub fn new(node_limit: u64) -> Self {
        Self {
            node_limit,
            nodes_spent: 0,
        }
    }

    /// Returns the node limit.
    #[inline]
    pub fn node_limit(&self) -> u64 {
        self.node_limit
    }

    /// Returns the nodes explored by finished searches.
    #[inline]
    pub fn nodes_spent(&self) -> u64 {
        self.nodes_spent
    }
}

impl<T> TreeSearchMonitor<T> for NodeLimitMonitor
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "NodeLimitMonitor"
    }

    fn search_command(
        &mut self,
        _state: &SearchState<T>,
        statistics: &BnbSolverStatistics<T>,
    ) -> SearchCommand {
        let explored = self.nodes_spent.saturating_add(statistics.nodes_explored);
        if explored >= self.node_limit {
            SearchCommand::Terminate(format!("node limit of {} reached", self.node_limit))
        } else {
            SearchCommand::Continue
        }
    }

    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>) {
        self.nodes_spent = self.nodes_spent.saturating_add(statistics.nodes_explored);
    }
}

impl std::fmt::Display for NodeLimitMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeLimitMonitor(node_limit: {})", self.node_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strippack_model::model::Model;

    #[test]
    fn test_terminates_at_limit() {
        let model = Model::<i64>::from_dimensions(4, &[(1, 1)]).unwrap();
        let state = SearchState::root(&model).unwrap();
        let mut monitor = NodeLimitMonitor::new(5);
        let mut stats = BnbSolverStatistics::default();

        stats.nodes_explored = 4;
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
        stats.nodes_explored = 5;
        assert_eq!(
            monitor.search_command(&state, &stats),
            SearchCommand::Terminate("node limit of 5 reached".to_string())
        );
    }

    #[test]
    fn test_budget_spans_consecutive_searches() {
        let model = Model::<i64>::from_dimensions(4, &[(1, 1)]).unwrap();
        let state = SearchState::root(&model).unwrap();
        let mut monitor = NodeLimitMonitor::new(5);
        let mut stats = BnbSolverStatistics::default();

        monitor.on_enter_search(&model, &stats);
        stats.nodes_explored = 3;
        monitor.on_exit_search(&stats);
        assert_eq!(monitor.nodes_spent(), 3);

        let mut second = BnbSolverStatistics::default();
        monitor.on_enter_search(&model, &second);
        second.nodes_explored = 1;
        assert_eq!(monitor.search_command(&state, &second), SearchCommand::Continue);
        second.nodes_explored = 2;
        assert!(monitor.search_command(&state, &second).is_terminate());
    }
}
