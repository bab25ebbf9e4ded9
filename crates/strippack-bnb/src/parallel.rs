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

//! Parallel root splitting.
//!
//! `ParallelBnbSolver` propagates the root once, asks the decision builder
//! for the root branch pair, and distributes the resulting alternatives
//! round-robin over scoped worker threads. Every worker owns a private
//! `BnbSolver` (and with it a private domain store and trail) and explores
//! its alternatives with the relation fixed up front. All workers prune
//! against one `SharedIncumbent`, so a width found in one subtree cuts the
//! others.
//!
//! The combined outcome is optimal only if every worker exhausted all of its
//! subtrees. As soon as one worker is aborted by its monitor, the others are
//! stopped too and the best shared placement is reported as feasible.

use crate::{
    bnb::BnbSolver,
    branching::decision::{Decision, DecisionBuilder},
    eval::evaluator::ObjectiveEvaluator,
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    propagate::Propagator,
    result::BnbSolverOutcome,
    state::SearchState,
    stats::BnbSolverStatistics,
    trail::SearchTrail,
};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use strippack_model::{model::Model, placement::Placement};
use strippack_search::{
    command::SearchCommand, incumbent::SharedIncumbent, num::SolverNumeric,
    result::TerminationReason,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelBnbSolver {
    num_threads: usize,
}

impl Default for ParallelBnbSolver {
    fn default() -> Self {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(num_threads)
    }
}

impl ParallelBnbSolver {
    /// Creates a solver using at most `num_threads` workers (at least one).
    #[inline]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Solves `model` with a fresh shared incumbent.
    ///
    /// `monitor_factory` is called once per worker with the worker's index;
    /// the monitors are created on the worker threads. A worker keeps its
    /// monitor for every root alternative it explores, so limits should be
    /// cumulative: anchor a `TimeLimitMonitor` at the solve's start.
    pub fn solve<T, B, E, S, F>(
        &self,
        model: &Model<T>,
        builder: &B,
        evaluator: &E,
        monitor_factory: F,
    ) -> BnbSolverOutcome<T>
    where
        T: SolverNumeric,
        B: DecisionBuilder<T> + Clone + Send,
        E: ObjectiveEvaluator<T> + Clone + Send,
        S: TreeSearchMonitor<T>,
        F: Fn(usize) -> S + Sync,
    {
        let incumbent = SharedIncumbent::new();
        self.solve_with_incumbent(model, builder, evaluator, monitor_factory, &incumbent)
    }

    /// Solves `model` sharing `incumbent` between all workers.
    ///
    /// Only placements strictly narrower than the incumbent's bound are
    /// searched for; the best one ends up installed in `incumbent`.
    pub fn solve_with_incumbent<T, B, E, S, F>(
        &self,
        model: &Model<T>,
        builder: &B,
        evaluator: &E,
        monitor_factory: F,
        incumbent: &SharedIncumbent<T>,
    ) -> BnbSolverOutcome<T>
    where
        T: SolverNumeric,
        B: DecisionBuilder<T> + Clone + Send,
        E: ObjectiveEvaluator<T> + Clone + Send,
        S: TreeSearchMonitor<T>,
        F: Fn(usize) -> S + Sync,
    {
        let start_time = std::time::Instant::now();

        let cutoff = incumbent
            .upper_bound_as()
            .unwrap_or_else(|_| T::max_value())
            .min(evaluator.trivial_upper_bound(model).saturating_add(T::one()));
        let decisions = match Self::split_root(model, &mut builder.clone(), cutoff) {
            RootSplit::Infeasible => {
                let mut statistics = BnbSolverStatistics::default();
                statistics.on_node_explored();
                statistics.on_pruning_infeasible();
                statistics.set_total_time(start_time.elapsed());
                return BnbSolverOutcome::infeasible(statistics);
            }
            RootSplit::Branch(decisions) if self.num_threads > 1 && decisions.len() > 1 => {
                decisions
            }
            _ => {
                return BnbSolver::preallocated(model.num_items()).solve_with_incumbent(
                    model,
                    &mut builder.clone(),
                    &mut evaluator.clone(),
                    monitor_factory(0),
                    incumbent,
                );
            }
        };

        let num_workers = self.num_threads.min(decisions.len());
        tracing::debug!(
            workers = num_workers,
            alternatives = decisions.len(),
            "splitting root across workers"
        );

        let stop_flag = AtomicBool::new(false);
        let reports: Vec<WorkerReport<T>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..num_workers)
                .map(|worker| {
                    let assigned: Vec<Decision> = decisions
                        .iter()
                        .copied()
                        .skip(worker)
                        .step_by(num_workers)
                        .collect();
                    let mut builder = builder.clone();
                    let mut evaluator = evaluator.clone();
                    let monitor_factory = &monitor_factory;
                    let stop_flag = &stop_flag;

                    scope.spawn(move || {
                        let mut monitor = monitor_factory(worker);
                        let mut solver = BnbSolver::preallocated(model.num_items());
                        let mut report = WorkerReport::new();

                        for decision in assigned {
                            let outcome = solver.solve_with_fixed_and_incumbent(
                                model,
                                &mut builder,
                                &mut evaluator,
                                WorkerMonitor::new(&mut monitor, stop_flag),
                                &[decision],
                                incumbent,
                            );
                            let (_, termination_reason, statistics) = outcome.into_parts();
                            report.absorb(statistics);

                            if let TerminationReason::Aborted(reason) = termination_reason {
                                report.originated_stop = !stop_flag.swap(true, Ordering::AcqRel);
                                report.aborted = Some(reason);
                                break;
                            }
                        }
                        report
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });

        let mut combined = WorkerReport::new();
        for report in &reports {
            if let Some(statistics) = &report.statistics {
                combined.absorb(statistics.clone());
            }
        }
        let mut statistics = combined.statistics.unwrap_or_default();
        statistics.set_total_time(start_time.elapsed());

        let abort_reason = reports
            .iter()
            .find(|report| report.originated_stop)
            .or_else(|| reports.iter().find(|report| report.aborted.is_some()))
            .and_then(|report| report.aborted.clone());

        match abort_reason {
            Some(reason) => BnbSolverOutcome::aborted(incumbent.snapshot(), reason, statistics),
            None => match incumbent.snapshot() {
                Some(placement) => BnbSolverOutcome::optimal(placement, statistics),
                None => BnbSolverOutcome::infeasible(statistics),
            },
        }
    }

    fn split_root<T, B>(model: &Model<T>, builder: &mut B, cutoff: T) -> RootSplit
    where
        T: SolverNumeric,
        B: DecisionBuilder<T>,
    {
        let Ok(mut state) = SearchState::root(model) else {
            return RootSplit::Infeasible;
        };
        let mut trail = SearchTrail::new();
        if Propagator::new()
            .propagate(model, &mut state, &mut trail, cutoff)
            .is_infeasible()
        {
            return RootSplit::Infeasible;
        }

        match builder.select_branch_pair(model, &state) {
            Some(pair) => RootSplit::Branch(builder.branch(model, &state, pair)),
            None => RootSplit::Leaf,
        }
    }
}

impl std::fmt::Display for ParallelBnbSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParallelBnbSolver(num_threads: {})", self.num_threads)
    }
}

enum RootSplit {
    Infeasible,
    Leaf,
    Branch(SmallVec<[Decision; 4]>),
}

struct WorkerReport<T> {
    /// `None` until the first search finished; merging into zeroed
    /// statistics would drag the root bound down to zero.
    statistics: Option<BnbSolverStatistics<T>>,
    aborted: Option<String>,
    /// `true` for the worker whose abort stopped the others.
    originated_stop: bool,
}

impl<T> WorkerReport<T>
where
    T: Ord + Copy,
{
    fn new() -> Self {
        Self {
            statistics: None,
            aborted: None,
            originated_stop: false,
        }
    }

    fn absorb(&mut self, statistics: BnbSolverStatistics<T>) {
        match &mut self.statistics {
            Some(total) => total.merge(&statistics),
            None => self.statistics = Some(statistics),
        }
    }
}

/// Forwards to the worker's own monitor and stops the search once any
/// sibling has been aborted.
struct WorkerMonitor<'a, M> {
    inner: &'a mut M,
    stop_flag: &'a AtomicBool,
}

impl<'a, M> WorkerMonitor<'a, M> {
    #[inline]
    fn new(inner: &'a mut M, stop_flag: &'a AtomicBool) -> Self {
        Self { inner, stop_flag }
    }
}

impl<T, M> TreeSearchMonitor<T> for WorkerMonitor<'_, M>
where
    T: SolverNumeric,
    M: TreeSearchMonitor<T>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn on_enter_search(&mut self, model: &Model<T>, statistics: &BnbSolverStatistics<T>) {
        self.inner.on_enter_search(model, statistics);
    }

    fn on_exit_search(&mut self, statistics: &BnbSolverStatistics<T>) {
        self.inner.on_exit_search(statistics);
    }

    fn search_command(
        &mut self,
        state: &SearchState<T>,
        statistics: &BnbSolverStatistics<T>,
    ) -> SearchCommand {
        if self.stop_flag.load(Ordering::Acquire) {
            return SearchCommand::Terminate("stopped after a sibling worker was aborted".to_string());
        }
        self.inner.search_command(state, statistics)
    }

    fn on_step(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {
        self.inner.on_step(state, statistics);
    }

    fn on_lower_bound_computed(
        &mut self,
        state: &SearchState<T>,
        lower_bound: T,
        statistics: &BnbSolverStatistics<T>,
    ) {
        self.inner
            .on_lower_bound_computed(state, lower_bound, statistics);
    }

    fn on_prune(
        &mut self,
        state: &SearchState<T>,
        reason: PruneReason,
        statistics: &BnbSolverStatistics<T>,
    ) {
        self.inner.on_prune(state, reason, statistics);
    }

    fn on_decisions_enqueued(
        &mut self,
        state: &SearchState<T>,
        count: usize,
        statistics: &BnbSolverStatistics<T>,
    ) {
        self.inner.on_decisions_enqueued(state, count, statistics);
    }

    fn on_descend(
        &mut self,
        state: &SearchState<T>,
        decision: Decision,
        statistics: &BnbSolverStatistics<T>,
    ) {
        self.inner.on_descend(state, decision, statistics);
    }

    fn on_backtrack(&mut self, state: &SearchState<T>, statistics: &BnbSolverStatistics<T>) {
        self.inner.on_backtrack(state, statistics);
    }

    fn on_solution_found(&mut self, placement: &Placement<T>, statistics: &BnbSolverStatistics<T>) {
        self.inner.on_solution_found(placement, statistics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        branching::{lexicographic::LexicographicBuilder, most_constrained::MostConstrainedBuilder},
        eval::makespan::MakespanEvaluator,
        monitor::{
            no_op::NoOperationMonitor, node_limit::NodeLimitMonitor,
            time_limit::TimeLimitMonitor,
        },
    };
    use std::time::{Duration, Instant};
    use strippack_model::model::ModelBuilder;
    use strippack_search::result::SolverResult;

    fn sequential_objective(model: &Model<i64>) -> Option<i64> {
        BnbSolver::new()
            .solve(
                model,
                &mut MostConstrainedBuilder::new(),
                &mut MakespanEvaluator::new(),
                NoOperationMonitor::new(),
            )
            .result()
            .placement()
            .map(|p| p.objective())
    }

    #[test]
    fn test_parallel_matches_sequential_optimum() {
        let instances: [(i64, &[(i64, i64)]); 3] = [
            (5, &[(2, 3), (2, 2), (1, 5), (3, 2)]),
            (10, &[(3, 6), (4, 7), (1, 1)]),
            (6, &[(2, 3), (3, 3), (1, 6), (2, 2), (4, 1)]),
        ];
        let solver = ParallelBnbSolver::new(4);
        for (strip_height, dims) in instances {
            let model = Model::from_dimensions(strip_height, dims).unwrap();
            let outcome = solver.solve(
                &model,
                &MostConstrainedBuilder::new(),
                &MakespanEvaluator::new(),
                |_| NoOperationMonitor::new(),
            );
            assert_eq!(
                outcome.termination_reason(),
                &TerminationReason::OptimalityProven
            );
            let placement = outcome.result().placement().unwrap();
            assert_eq!(placement.validate(&model), Ok(()));
            assert_eq!(Some(placement.objective()), sequential_objective(&model));
        }
    }

    #[test]
    fn test_single_thread_falls_back_to_sequential() {
        let model = Model::from_dimensions(10, &[(3, 6), (4, 7)]).unwrap();
        let outcome = ParallelBnbSolver::new(0).solve(
            &model,
            &LexicographicBuilder::new(),
            &MakespanEvaluator::new(),
            |_| NoOperationMonitor::new(),
        );
        assert_eq!(outcome.result().placement().map(|p| p.objective()), Some(7));
    }

    #[test]
    fn test_infeasible_root_is_reported() {
        let mut builder = ModelBuilder::<i64>::new(3);
        builder.add_item(1, 4);
        builder.add_item(1, 1);
        let model = builder.build_relaxed().unwrap();

        let outcome = ParallelBnbSolver::new(2).solve(
            &model,
            &MostConstrainedBuilder::new(),
            &MakespanEvaluator::new(),
            |_| NoOperationMonitor::new(),
        );
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
    }

    #[test]
    fn test_anchored_time_limit_is_shared_by_workers() {
        let model = Model::from_dimensions(5, &[(2, 3), (2, 2), (1, 5), (3, 2)]).unwrap();
        let start = Instant::now().checked_sub(Duration::from_secs(1)).unwrap();
        let outcome = ParallelBnbSolver::new(4).solve(
            &model,
            &LexicographicBuilder::new(),
            &MakespanEvaluator::new(),
            |_| TimeLimitMonitor::new(Duration::from_millis(500), 1).anchored_at(start),
        );

        // The budget ran out before the solve began; no worker may restart it.
        match outcome.termination_reason() {
            TerminationReason::Aborted(reason) => assert!(reason.contains("time limit")),
            other => panic!("unexpected termination: {}", other),
        }
        assert_eq!(outcome.result(), &SolverResult::Unknown);
    }

    #[test]
    fn test_worker_abort_stops_all_workers() {
        let model = Model::from_dimensions(
            10,
            &[
                (1, 2),
                (3, 4),
                (5, 6),
                (7, 8),
                (3, 3),
                (6, 3),
                (8, 2),
                (1, 4),
                (7, 6),
                (3, 4),
            ],
        )
        .unwrap();
        let incumbent = SharedIncumbent::new();
        let outcome = ParallelBnbSolver::new(4).solve_with_incumbent(
            &model,
            &MostConstrainedBuilder::new(),
            &MakespanEvaluator::new(),
            |_| NodeLimitMonitor::new(200),
            &incumbent,
        );

        match outcome.termination_reason() {
            TerminationReason::Aborted(reason) => assert!(reason.contains("node limit")),
            TerminationReason::OptimalityProven => {
                assert!(outcome.result().placement().is_some());
            }
            other => panic!("unexpected termination: {}", other),
        }
        if let Some(placement) = outcome.result().placement() {
            assert_eq!(placement.validate(&model), Ok(()));
            assert_eq!(incumbent.upper_bound(), placement.objective());
        }
    }
}
