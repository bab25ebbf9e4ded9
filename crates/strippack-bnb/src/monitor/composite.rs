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

//! Monitoring combinators for tree search
//!
//! `CompositeTreeSearchMonitor` forwards every event to its children in
//! insertion order. `search_command` short-circuits on the first
//! `Terminate`, so put stricter stop conditions first; every other callback
//! always reaches all children.

use crate::{
    branching::decision::Decision,
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    state::SearchState,
    stats::BnbSolverStatistics,
};
use num_traits::{PrimInt, Signed};
use strippack_model::{model::Model, placement::Placement};
use strippack_search::command::SearchCommand;

/// A monitor that forwards every event to a list of child monitors.
pub struct CompositeTreeSearchMonitor<'a, T>
where
    T: PrimInt + Signed,
{
    monitors: Vec<Box<dyn TreeSearchMonitor<T> + Send + 'a>>,
}

impl<T> Default for CompositeTreeSearchMonitor<'_, T>
where
    T: PrimInt + Signed,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> CompositeTreeSearchMonitor<'a, T>
where
    T: PrimInt + Signed,
{
    /// Creates a new empty `CompositeTreeSearchMonitor`.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    /// Creates a new empty `CompositeTreeSearchMonitor` with room for
    /// `capacity` monitors.
    #[inline(always)]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    /// Adds a new monitor after the existing ones.
    #[inline(always)]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: TreeSearchMonitor<T> + Send + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    /// Adds an already boxed monitor after the existing ones.
    #[inline(always)]
    pub fn add_monitor_boxed(&mut self, monitor: Box<dyn TreeSearchMonitor<T> + Send + 'a>) {
        self.monitors.push(monitor);
    }

    /// Returns the number of child monitors.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Removes every child monitor.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.monitors.clear();
    }
}

impl<'a, T> FromIterator<Box<dyn TreeSearchMonitor<T> + Send + 'a>>
    for CompositeTreeSearchMonitor<'a, T>
where
    T: PrimInt + Signed,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn TreeSearchMonitor<T> + Send + 'a>>,
    {
        Self {
            monitors: iter.into_iter().collect(),
        }
    }
}

impl<T> TreeSearchMonitor<T> for CompositeTreeSearchMonitor<'_, T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "CompositeTreeSearchMonitor"
    }

    fn on_enter_search(&mut self, model: &Model<T>, statistics: &BnbSolverStatistics<T>) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(model, statistics);
        }
    }

    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(statistics);
        }
    }

    fn search_command(
        &mut self,
        state: &SearchState<T>,
        statistics: &BnbSolverStatistics<T>,
    ) -> SearchCommand {
        for monitor in &mut self.monitors {
            let command = monitor.search_command(state, statistics);
            if command.is_terminate() {
                return command;
            }
        }
        SearchCommand::Continue
    }

    fn on_step(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {
        for monitor in &mut self.monitors {
            monitor.on_step(state, statistics);
        }
    }

    fn on_lower_bound_computed(
        &mut self,
        state: &SearchState<T>,
        lower_bound: T,
        statistics: &BnbSolverStatistics<T>,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_lower_bound_computed(state, lower_bound, statistics);
        }
    }

    fn on_prune(
        &mut self,
        state: &SearchState<T>,
        reason: PruneReason,
        statistics: &BnbSolverStatistics<T>,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_prune(state, reason, statistics);
        }
    }

    fn on_decisions_enqueued(
        &mut self,
        state: &SearchState<T>,
        count: usize,
        statistics: &BnbSolverStatistics<T>,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_decisions_enqueued(state, count, statistics);
        }
    }

    fn on_descend(
        &mut self,
        state: &SearchState<T>,
        decision: Decision,
        statistics: &BnbSolverStatistics<T>,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_descend(state, decision, statistics);
        }
    }

    fn on_backtrack(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {
        for monitor in &mut self.monitors {
            monitor.on_backtrack(state, statistics);
        }
    }

    fn on_solution_found(
        &mut self,
        placement: &Placement<T>,
        statistics: &BnbSolverStatistics<T>,
    ) {
        for monitor in &mut self.monitors {
            monitor.on_solution_found(placement, statistics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct Counting {
        steps: Arc<AtomicUsize>,
        stop: bool,
    }

    impl TreeSearchMonitor<i64> for Counting {
        fn name(&self) -> &str {
            "Counting"
        }

        fn on_step(&mut self, _: &SearchState<i64>, _: &BnbSolverStatistics<i64>) {
            self.steps.fetch_add(1, Ordering::Relaxed);
        }

        fn search_command(
            &mut self,
            _: &SearchState<i64>,
            _: &BnbSolverStatistics<i64>,
        ) -> SearchCommand {
            if self.stop {
                SearchCommand::Terminate("stop".to_string())
            } else {
                SearchCommand::Continue
            }
        }
    }

    fn fixture() -> (SearchState<i64>, BnbSolverStatistics<i64>) {
        let model = Model::from_dimensions(4, &[(1, 1), (2, 2)]).unwrap();
        (SearchState::root(&model).unwrap(), BnbSolverStatistics::default())
    }

    #[test]
    fn test_events_fan_out_to_all_children() {
        let (state, stats) = fixture();
        let steps = Arc::new(AtomicUsize::new(0));
        let mut composite = CompositeTreeSearchMonitor::with_capacity(2);
        for _ in 0..2 {
            composite.add_monitor(Counting {
                steps: Arc::clone(&steps),
                stop: false,
            });
        }
        composite.on_step(&state, &stats);
        assert_eq!(steps.load(Ordering::Relaxed), 2);
        assert_eq!(composite.len(), 2);
        assert_eq!(composite.search_command(&state, &stats), SearchCommand::Continue);
    }

    #[test]
    fn test_search_command_short_circuits() {
        let (state, stats) = fixture();
        let steps = Arc::new(AtomicUsize::new(0));
        let mut composite: CompositeTreeSearchMonitor<'_, i64> = [
            Box::new(Counting {
                steps: Arc::clone(&steps),
                stop: true,
            }) as Box<dyn TreeSearchMonitor<i64> + Send>,
            Box::new(Counting {
                steps: Arc::clone(&steps),
                stop: false,
            }),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            composite.search_command(&state, &stats),
            SearchCommand::Terminate("stop".to_string())
        );
        composite.clear();
        assert!(composite.is_empty());
    }
}
