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
use strippack_model::model::Model;
use strippack_search::command::SearchCommand;

/// Terminates the search once `time_limit` has elapsed.
///
/// The clock is read only every `check_interval` polls. By default it
/// starts in `on_enter_search`, so every search gets the full budget. An
/// anchored monitor measures from a fixed instant instead, and consecutive
/// searches driven by it share one budget.
#[derive(Debug, Clone)]
pub struct TimeLimitMonitor {
    time_limit: Duration,
    start_time: Option<Instant>,
    anchored: bool,
    check_interval: u64,
    ops_since_last_check: u64,
}

impl TimeLimitMonitor {
    /// Creates a new `TimeLimitMonitor` reading the clock every
    /// `check_interval` polls (at least every poll).
    pub fn new(time_limit: Duration, check_interval: u64) -> Self {
        Self {
            time_limit,
            start_time: None,
            anchored: false,
            check_interval: check_interval.max(1),
            ops_since_last_check: 0,
        }
    }

    /// Creates a new `TimeLimitMonitor` that reads the clock every 1024 polls.
    pub fn with_default_check_interval(time_limit: Duration) -> Self {
        Self::new(time_limit, 1_024)
    }

    /// Measures the limit from `start` rather than from each search entry.
    pub fn anchored_at(mut self, start: Instant) -> Self {
        self.start_time = Some(start);
        self.anchored = true;
        self
    }

    #[inline]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Returns `true` if the clock is pinned by `anchored_at`.
    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }
}

impl<T> TreeSearchMonitor<T> for TimeLimitMonitor
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _model: &Model<T>, _statistics: &BnbSolverStatistics<T>) {
        if !self.anchored {
            self.start_time = Some(Instant::now());
        }
        self.ops_since_last_check = 0;
    }

    fn search_command(
        &mut self,
        _state: &SearchState<T>,
        _statistics: &BnbSolverStatistics<T>,
    ) -> SearchCommand {
        self.ops_since_last_check = self.ops_since_last_check.saturating_add(1);
        if self.ops_since_last_check < self.check_interval {
            return SearchCommand::Continue;
        }
        self.ops_since_last_check = 0;

        match self.start_time {
            Some(start) if start.elapsed() >= self.time_limit => SearchCommand::Terminate(
                format!("time limit of {:.2?} exceeded", self.time_limit),
            ),
            _ => SearchCommand::Continue,
        }
    }

    fn on_exit_search(&mut self, _statistics: &BnbSolverStatistics<T>) {
        if !self.anchored {
            self.start_time = None;
        }
    }
}

impl std::fmt::Display for TimeLimitMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TimeLimitMonitor(time_limit: {:.2?}, check_interval: {})",
            self.time_limit, self.check_interval
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Model<i64>, SearchState<i64>, BnbSolverStatistics<i64>) {
        let model = Model::from_dimensions(4, &[(1, 1)]).unwrap();
        let state = SearchState::root(&model).unwrap();
        (model, state, BnbSolverStatistics::default())
    }

    #[test]
    fn test_zero_limit_terminates_on_first_check() {
        let (model, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 1);
        monitor.on_enter_search(&model, &stats);
        assert!(monitor.search_command(&state, &stats).is_terminate());
    }

    #[test]
    fn test_clock_is_checked_every_interval() {
        let (model, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 3);
        monitor.on_enter_search(&model, &stats);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
        assert!(monitor.search_command(&state, &stats).is_terminate());
    }

    #[test]
    fn test_generous_limit_continues() {
        let (model, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::from_secs(3600), 1);
        monitor.on_enter_search(&model, &stats);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
    }

    #[test]
    fn test_unanchored_clock_restarts_per_search() {
        let (model, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::from_millis(200), 1);
        monitor.on_enter_search(&model, &stats);
        std::thread::sleep(Duration::from_millis(250));
        monitor.on_exit_search(&stats);

        monitor.on_enter_search(&model, &stats);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
    }

    #[test]
    fn test_anchored_budget_spans_consecutive_searches() {
        let (model, state, stats) = fixture();
        let start = Instant::now().checked_sub(Duration::from_secs(1)).unwrap();
        let mut monitor = TimeLimitMonitor::new(Duration::from_millis(500), 1).anchored_at(start);
        assert!(monitor.is_anchored());

        // Already past the budget before the first search begins.
        monitor.on_enter_search(&model, &stats);
        assert!(monitor.search_command(&state, &stats).is_terminate());
        monitor.on_exit_search(&stats);

        // A second search with the same monitor gets no fresh budget.
        monitor.on_enter_search(&model, &stats);
        assert!(monitor.search_command(&state, &stats).is_terminate());
    }

    #[test]
    fn test_anchored_monitor_is_active_before_entry() {
        let (_, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 1).anchored_at(Instant::now());
        assert!(monitor.search_command(&state, &stats).is_terminate());
    }

    #[test]
    fn test_inactive_outside_search() {
        let (_, state, stats) = fixture();
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 1);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
    }
}
