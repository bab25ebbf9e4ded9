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

//! Solver configuration.
//!
//! `SolverConfig` is plain data; `SolverBuilder` is the usual way to fill
//! it in:
//!
//! ```rust
//! use std::time::Duration;
//! use strippack_solver::config::{PairSelection, SolverBuilder};
//!
//! let solver = SolverBuilder::<i64>::new()
//!     .with_time_limit(Duration::from_secs(5))
//!     .with_threads(4)
//!     .with_pair_selection(PairSelection::Lexicographic)
//!     .build();
//! assert_eq!(solver.config().threads, 4);
//! ```

use std::time::Duration;
use strippack_bnb::branching::decision::RelationOrder;
use strippack_search::num::SolverNumeric;

use crate::solver::Solver;

/// Which undecided pair the search branches on next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PairSelection {
    /// The pair with the smallest combined domain volume.
    #[default]
    MostConstrained,
    /// The lowest undecided pair index.
    Lexicographic,
}

impl std::fmt::Display for PairSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairSelection::MostConstrained => write!(f, "MostConstrained"),
            PairSelection::Lexicographic => write!(f, "Lexicographic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig<T> {
    /// Wall-clock budget of the whole solve, measured from its start and
    /// shared by all workers.
    pub time_limit: Option<Duration>,
    /// Node budget. With several threads, every worker gets it once, for
    /// all root alternatives it explores.
    pub node_limit: Option<u64>,
    /// `1` runs the sequential engine; more split the root across threads.
    pub threads: usize,
    pub relation_order: RelationOrder,
    pub pair_selection: PairSelection,
    /// Emit periodic `info` progress events.
    pub log_progress: bool,
    /// Warm start: only placements strictly narrower than this are sought.
    pub initial_upper_bound: Option<T>,
}

impl<T> Default for SolverConfig<T> {
    fn default() -> Self {
        Self {
            time_limit: None,
            node_limit: None,
            threads: 1,
            relation_order: RelationOrder::default(),
            pair_selection: PairSelection::default(),
            log_progress: false,
            initial_upper_bound: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverBuilder<T> {
    config: SolverConfig<T>,
}

impl<T> Default for SolverBuilder<T>
where
    T: SolverNumeric,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SolverBuilder<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.config.time_limit = Some(limit);
        self
    }

    #[inline]
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.config.node_limit = Some(limit);
        self
    }

    /// Sets the number of worker threads; `0` is treated as `1`.
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads.max(1);
        self
    }

    #[inline]
    pub fn with_relation_order(mut self, order: RelationOrder) -> Self {
        self.config.relation_order = order;
        self
    }

    #[inline]
    pub fn with_pair_selection(mut self, selection: PairSelection) -> Self {
        self.config.pair_selection = selection;
        self
    }

    #[inline]
    pub fn with_progress_logging(mut self, enabled: bool) -> Self {
        self.config.log_progress = enabled;
        self
    }

    #[inline]
    pub fn with_initial_upper_bound(mut self, upper_bound: T) -> Self {
        self.config.initial_upper_bound = Some(upper_bound);
        self
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    #[inline]
    pub fn build(self) -> Solver<T> {
        Solver::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strippack_bnb::relation::Relation;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::<i64>::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.time_limit, None);
        assert_eq!(config.node_limit, None);
        assert_eq!(config.pair_selection, PairSelection::MostConstrained);
        assert_eq!(
            config.relation_order.relations(),
            &[
                Relation::Left,
                Relation::Right,
                Relation::Above,
                Relation::Below
            ]
        );
        assert!(!config.log_progress);
    }

    #[test]
    fn test_builder_sets_every_field() {
        let order =
            RelationOrder::new([Relation::Above, Relation::Below, Relation::Left, Relation::Right])
                .unwrap();
        let builder = SolverBuilder::<i32>::new()
            .with_time_limit(Duration::from_millis(250))
            .with_node_limit(10_000)
            .with_threads(0)
            .with_relation_order(order)
            .with_pair_selection(PairSelection::Lexicographic)
            .with_progress_logging(true)
            .with_initial_upper_bound(30);

        let config = builder.config();
        assert_eq!(config.time_limit, Some(Duration::from_millis(250)));
        assert_eq!(config.node_limit, Some(10_000));
        assert_eq!(config.threads, 1);
        assert_eq!(config.relation_order, order);
        assert_eq!(config.pair_selection, PairSelection::Lexicographic);
        assert!(config.log_progress);
        assert_eq!(config.initial_upper_bound, Some(30));
    }
}
