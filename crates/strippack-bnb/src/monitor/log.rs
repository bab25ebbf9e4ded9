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
use std::time::{Duration, Instant};
use strippack_model::{model::Model, placement::Placement};

/// Reports search progress as `tracing` events.
///
/// A progress line is emitted at most once per `log_interval`; the clock is
/// only read when `nodes_explored & clock_check_mask == 0`.
#[derive(Debug, Clone)]
pub struct LogTreeSearchMonitor<T> {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    best_objective: Option<T>,
}

impl<T> LogTreeSearchMonitor<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_log_time: now,
            log_interval,
            clock_check_mask,
            best_objective: None,
        }
    }

    #[inline]
    pub fn best_objective(&self) -> Option<T> {
        self.best_objective
    }

    fn log_progress(&mut self, state: &SearchState<T>, stats: &BnbSolverStatistics<T>) {
        let now = Instant::now();
        let best = self
            .best_objective
            .map(|objective| objective.to_string())
            .unwrap_or_else(|| "inf".to_string());
        tracing::info!(
            elapsed = ?now.duration_since(self.start_time),
            nodes = stats.nodes_explored,
            undecided = state.relations().num_undecided(),
            best = %best,
            backtracks = stats.backtracks,
            pruned_bound = stats.prunings_bound,
            pruned_infeasible = stats.prunings_infeasible,
            "search progress"
        );
        self.last_log_time = now;
    }
}

impl<T> Default for LogTreeSearchMonitor<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 4095)
    }
}

impl<T> std::fmt::Display for LogTreeSearchMonitor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogTreeSearchMonitor(log_interval: {:.2?}, clock_check_mask: {})",
            self.log_interval, self.clock_check_mask
        )
    }
}

impl<T> TreeSearchMonitor<T> for LogTreeSearchMonitor<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn name(&self) -> &str {
        "LogTreeSearchMonitor"
    }

    fn on_enter_search(&mut self, model: &Model<T>, _statistics: &BnbSolverStatistics<T>) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = None;
        tracing::info!(
            items = model.num_items(),
            strip_height = %model.strip_height(),
            total_width = %model.total_width(),
            "search started"
        );
    }

    fn on_step(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {
        if (statistics.nodes_explored & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_progress(state, statistics);
        }
    }

    fn on_solution_found(
        &mut self,
        placement: &Placement<T>,
        statistics: &BnbSolverStatistics<T>,
    ) {
        self.best_objective = Some(placement.objective());
        tracing::info!(
            objective = %placement.objective(),
            nodes = statistics.nodes_explored,
            "improving placement found"
        );
    }

    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>) {
        tracing::info!(
            elapsed = ?self.start_time.elapsed(),
            nodes = statistics.nodes_explored,
            solutions = statistics.solutions_found,
            "search finished"
        );
    }
}
