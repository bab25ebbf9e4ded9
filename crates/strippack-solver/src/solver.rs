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

//! # Strip Packing Solver
//!
//! `Solver` turns a `SolverConfig` into a concrete search: it picks the
//! decision builder, stacks the monitors for the configured limits and
//! runs either the sequential `BnbSolver` or, with more than one thread,
//! the `ParallelBnbSolver` root split. The raw `BnbSolverOutcome` is then
//! mapped to a `PackingResult` or a `SolveError`:
//!
//! | Outcome      | Mapped to                                               |
//! |--------------|---------------------------------------------------------|
//! | `Optimal`    | `Ok`, status `optimal`                                  |
//! | `Feasible`   | `Ok`, status `best-effort`                              |
//! | `Infeasible` | `NoImprovingPlacement` when warm-started, else `NoFeasibleSolution` |
//! | `Unknown`    | `SearchExhausted` with the abort reason                 |
//!
//! ## Usage
//!
//! ```rust
//! use strippack_solver::config::SolverBuilder;
//!
//! let solver = SolverBuilder::<i64>::new().with_node_limit(100_000).build();
//! let result = solver.solve_items(10, &[(3, 6), (4, 7)]).unwrap();
//! assert_eq!(result.objective(), 7);
//! assert!(result.is_optimal());
//! ```

use crate::{
    config::{PairSelection, SolverConfig},
    error::SolveError,
    result::{PackingResult, PackingStatus},
};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use strippack_bnb::{
    bnb::BnbSolver,
    branching::{
        decision::DecisionBuilder, lexicographic::LexicographicBuilder,
        most_constrained::MostConstrainedBuilder,
    },
    eval::makespan::MakespanEvaluator,
    monitor::{
        composite::CompositeTreeSearchMonitor, interrupt::InterruptMonitor,
        log::LogTreeSearchMonitor, node_limit::NodeLimitMonitor, time_limit::TimeLimitMonitor,
    },
    parallel::ParallelBnbSolver,
    result::BnbSolverOutcome,
};
use strippack_model::model::Model;
use strippack_search::{
    incumbent::SharedIncumbent,
    num::SolverNumeric,
    result::{SolverResult, TerminationReason},
};

/// Clock reads happen once per this many nodes (mask).
const LOG_CLOCK_CHECK_MASK: u64 = 4095;

#[derive(Debug, Clone, Default)]
pub struct Solver<T> {
    config: SolverConfig<T>,
}

impl<T> Solver<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Finds a placement of `model` of minimal width.
    ///
    /// # Errors
    ///
    /// See `SolveError`. A model with an item taller than the strip (only
    /// constructible through `ModelBuilder::build_relaxed`) yields
    /// `NoFeasibleSolution`.
    pub fn solve(&self, model: &Model<T>) -> Result<PackingResult<T>, SolveError> {
        let outcome = self.run(model, None);
        self.map_outcome(model, outcome)
    }

    /// Like `solve`, but stops as soon as `stop_flag` is set.
    pub fn solve_with_interrupt(
        &self,
        model: &Model<T>,
        stop_flag: &AtomicBool,
    ) -> Result<PackingResult<T>, SolveError> {
        let outcome = self.run(model, Some(stop_flag));
        self.map_outcome(model, outcome)
    }

    /// Validates `(width, height)` pairs against `strip_height` and solves.
    ///
    /// # Errors
    ///
    /// `SolveError::InvalidInput` if the instance is rejected, otherwise
    /// as `solve`.
    pub fn solve_items(
        &self,
        strip_height: T,
        dimensions: &[(T, T)],
    ) -> Result<PackingResult<T>, SolveError> {
        let model = Model::from_dimensions(strip_height, dimensions)?;
        self.solve(&model)
    }

    /// Runs the search and returns the engine's outcome unmapped.
    #[inline]
    pub fn solve_outcome(&self, model: &Model<T>) -> BnbSolverOutcome<T> {
        self.run(model, None)
    }

    fn run(&self, model: &Model<T>, stop_flag: Option<&AtomicBool>) -> BnbSolverOutcome<T> {
        let started = Instant::now();
        tracing::debug!(
            items = model.num_items(),
            strip_height = %model.strip_height(),
            threads = self.config.threads,
            pair_selection = %self.config.pair_selection,
            relation_order = %self.config.relation_order,
            "starting strip packing search"
        );

        let incumbent = match self.config.initial_upper_bound {
            Some(upper_bound) => SharedIncumbent::with_upper_bound(upper_bound),
            None => SharedIncumbent::new(),
        };
        let order = self.config.relation_order;
        let outcome = match self.config.pair_selection {
            PairSelection::MostConstrained => self.run_with_builder(
                model,
                MostConstrainedBuilder::with_relation_order(order),
                stop_flag,
                started,
                &incumbent,
            ),
            PairSelection::Lexicographic => self.run_with_builder(
                model,
                LexicographicBuilder::with_relation_order(order),
                stop_flag,
                started,
                &incumbent,
            ),
        };

        let statistics = outcome.statistics();
        tracing::debug!(
            result = %outcome.result(),
            termination = %outcome.termination_reason(),
            nodes = statistics.nodes_explored,
            solutions = statistics.solutions_found,
            elapsed = ?statistics.time_total,
            "strip packing search finished"
        );
        outcome
    }

    fn run_with_builder<B>(
        &self,
        model: &Model<T>,
        mut builder: B,
        stop_flag: Option<&AtomicBool>,
        started: Instant,
        incumbent: &SharedIncumbent<T>,
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T> + Clone + Send,
    {
        let mut evaluator = MakespanEvaluator::new();
        if self.config.threads > 1 {
            ParallelBnbSolver::new(self.config.threads).solve_with_incumbent(
                model,
                &builder,
                &evaluator,
                |_| self.build_monitor(stop_flag, started),
                incumbent,
            )
        } else {
            BnbSolver::preallocated(model.num_items()).solve_with_incumbent(
                model,
                &mut builder,
                &mut evaluator,
                self.build_monitor(stop_flag, started),
                incumbent,
            )
        }
    }

    /// Stacks the monitors for the configured limits. The time limit is
    /// anchored at `started`, so parallel workers share one wall-clock budget
    /// across all root alternatives they explore.
    fn build_monitor<'a>(
        &self,
        stop_flag: Option<&'a AtomicBool>,
        started: Instant,
    ) -> CompositeTreeSearchMonitor<'a, T> {
        let mut monitor = CompositeTreeSearchMonitor::with_capacity(4);
        if let Some(stop_flag) = stop_flag {
            monitor.add_monitor(InterruptMonitor::new(stop_flag));
        }
        if let Some(limit) = self.config.time_limit {
            monitor.add_monitor(
                TimeLimitMonitor::with_default_check_interval(limit).anchored_at(started),
            );
        }
        if let Some(limit) = self.config.node_limit {
            monitor.add_monitor(NodeLimitMonitor::new(limit));
        }
        if self.config.log_progress {
            monitor.add_monitor(LogTreeSearchMonitor::<T>::new(
                Duration::from_secs(1),
                LOG_CLOCK_CHECK_MASK,
            ));
        }
        monitor
    }

    fn map_outcome(
        &self,
        model: &Model<T>,
        outcome: BnbSolverOutcome<T>,
    ) -> Result<PackingResult<T>, SolveError> {
        let (result, termination_reason, statistics) = outcome.into_parts();
        match result {
            SolverResult::Optimal(placement) => Ok(PackingResult::new(
                placement,
                PackingStatus::Optimal,
                statistics,
            )),
            SolverResult::Feasible(placement) => Ok(PackingResult::new(
                placement,
                PackingStatus::BestEffort,
                statistics,
            )),
            SolverResult::Infeasible => match self.config.initial_upper_bound {
                Some(upper_bound) if model.fits_strip() => Err(SolveError::NoImprovingPlacement {
                    upper_bound: upper_bound.into(),
                }),
                _ => Err(SolveError::NoFeasibleSolution),
            },
            SolverResult::Unknown => {
                let reason = match termination_reason {
                    TerminationReason::Aborted(reason) => reason,
                    other => other.to_string(),
                };
                Err(SolveError::SearchExhausted { reason })
            }
        }
    }
}

impl<T> std::fmt::Display for Solver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Solver(threads: {}, pair_selection: {}, relation_order: {})",
            self.config.threads, self.config.pair_selection, self.config.relation_order
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverBuilder;
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;
    use strippack_model::{
        index::ItemIndex,
        model::{ModelBuilder, ModelError},
    };

    const SCENARIO_C: [(i64, i64); 10] = [
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
    ];

    #[test]
    fn test_scenario_a_single_item() {
        let result = SolverBuilder::new()
            .build()
            .solve_items(10i64, &[(3, 4)])
            .unwrap();
        assert_eq!(result.objective(), 3);
        assert_eq!(result.positions().collect::<Vec<_>>(), vec![(0, 0)]);
        assert_eq!(result.status(), PackingStatus::Optimal);
    }

    #[test]
    fn test_scenario_b_tall_items_side_by_side() {
        let result = SolverBuilder::new()
            .build()
            .solve_items(10i64, &[(3, 6), (4, 7)])
            .unwrap();
        assert_eq!(result.objective(), 7);
        assert_eq!(result.positions().collect::<Vec<_>>(), vec![(0, 0), (3, 0)]);
        assert!(result.is_optimal());
    }

    #[test]
    fn test_scenario_c_is_solved_to_optimality() {
        let model = Model::from_dimensions(10i64, &SCENARIO_C).unwrap();
        let result = SolverBuilder::new().build().solve(&model).unwrap();
        assert_eq!(result.objective(), 21);
        assert!(result.is_optimal());
        assert_eq!(result.placement().validate(&model), Ok(()));
    }

    #[test]
    fn test_scenario_c_under_node_limit_is_feasible() {
        let model = Model::from_dimensions(10i64, &SCENARIO_C).unwrap();
        for threads in [1, 4] {
            let solver = SolverBuilder::new()
                .with_node_limit(50_000)
                .with_threads(threads)
                .build();
            let result = solver.solve(&model).unwrap();
            assert_eq!(result.placement().validate(&model), Ok(()));
            assert!(result.objective() >= 21);
            assert!(result.objective() < 44);
            let recomputed = result
                .positions()
                .zip(model.widths())
                .map(|((x, _), &w)| x + w)
                .max()
                .unwrap();
            assert_eq!(recomputed, result.objective());
        }
    }

    #[test]
    fn test_scenario_d_tall_item_is_rejected() {
        let solver = SolverBuilder::new().build();
        let error = solver.solve_items(10i64, &[(3, 12)]).unwrap_err();
        assert_eq!(
            error,
            SolveError::InvalidInput(ModelError::ItemTallerThanStrip {
                item: ItemIndex::new(0),
                height: 12,
                strip_height: 10,
            })
        );

        let mut builder = ModelBuilder::new(10i64);
        builder.add_item(3, 12);
        let relaxed = builder.build_relaxed().unwrap();
        assert_eq!(solver.solve(&relaxed).unwrap_err(), SolveError::NoFeasibleSolution);
    }

    #[test]
    fn test_unsatisfiable_dependency_has_no_feasible_solution() {
        let mut builder = ModelBuilder::new(10i64);
        let producer = builder.add_item(3, 6);
        let consumer = builder.add_item(3, 7);
        builder.add_dependency(producer, consumer, 1);
        let model = builder.build().unwrap();

        for threads in [1, 3] {
            let solver = SolverBuilder::new().with_threads(threads).build();
            assert_eq!(solver.solve(&model).unwrap_err(), SolveError::NoFeasibleSolution);
        }
    }

    #[test]
    fn test_warm_start_bound() {
        let model = Model::from_dimensions(10i64, &[(3, 6), (4, 7)]).unwrap();

        let tight = SolverBuilder::new().with_initial_upper_bound(7).build();
        assert_eq!(
            tight.solve(&model).unwrap_err(),
            SolveError::NoImprovingPlacement { upper_bound: 7 }
        );

        let loose = SolverBuilder::new().with_initial_upper_bound(8).build();
        assert_eq!(loose.solve(&model).unwrap().objective(), 7);
    }

    #[test]
    fn test_budget_without_placement_is_search_exhausted() {
        let model = Model::from_dimensions(10i64, &SCENARIO_C).unwrap();
        let solver = SolverBuilder::new().with_node_limit(1).build();
        match solver.solve(&model) {
            Err(SolveError::SearchExhausted { reason }) => {
                assert!(reason.contains("node limit"));
            }
            other => panic!("expected SearchExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_stops_search() {
        let model = Model::from_dimensions(10i64, &SCENARIO_C).unwrap();
        let stop_flag = AtomicBool::new(false);
        stop_flag.store(true, Ordering::Relaxed);

        let error = SolverBuilder::new()
            .build()
            .solve_with_interrupt(&model, &stop_flag)
            .unwrap_err();
        assert!(!error.is_proof());
        assert!(error.to_string().contains("interrupt"));
    }

    #[test]
    fn test_repeated_solves_are_identical() {
        let model = Model::from_dimensions(6i64, &[(2, 3), (3, 3), (1, 6), (2, 2), (4, 1)]).unwrap();
        let solver = SolverBuilder::new().build();
        let first = solver.solve(&model).unwrap();
        let second = solver.solve(&model).unwrap();
        assert_eq!(first.placement(), second.placement());
        assert_eq!(
            first.statistics().nodes_explored,
            second.statistics().nodes_explored
        );
    }

    #[test]
    fn test_progress_logging_does_not_change_result() {
        let model = Model::from_dimensions(5i64, &[(2, 3), (2, 2), (1, 5), (3, 2)]).unwrap();
        let quiet = SolverBuilder::new().build().solve(&model).unwrap();
        let logged = SolverBuilder::new()
            .with_progress_logging(true)
            .build()
            .solve(&model)
            .unwrap();
        assert_eq!(quiet.placement(), logged.placement());
    }

    #[test]
    fn test_display() {
        let solver = SolverBuilder::<i64>::new()
            .with_threads(2)
            .with_pair_selection(PairSelection::Lexicographic)
            .build();
        assert_eq!(
            solver.to_string(),
            "Solver(threads: 2, pair_selection: Lexicographic, relation_order: {LEFT, RIGHT, ABOVE, BELOW})"
        );
    }

    fn instance() -> impl Strategy<Value = (i32, Vec<(i32, i32)>)> {
        (1..=5i32).prop_flat_map(|h| (Just(h), prop::collection::vec((1..=4i32, 1..=h), 1..=5)))
    }

    /// Smallest strip width that admits a placement, found by trying every
    /// integer position of every item.
    fn exhaustive_optimum(model: &Model<i32>) -> Option<i32> {
        let widest = model.widths().iter().copied().max().unwrap_or(0);
        (widest..=model.total_width()).find(|&width| {
            let mut positions = Vec::with_capacity(model.num_items());
            place_remaining(model, width, &mut positions)
        })
    }

    fn place_remaining(model: &Model<i32>, width: i32, positions: &mut Vec<(i32, i32)>) -> bool {
        if positions.len() == model.num_items() {
            return true;
        }
        let item = ItemIndex::new(positions.len());
        let (w, h) = (model.item_width(item), model.item_height(item));
        for x in 0..=width - w {
            for y in 0..=model.strip_height() - h {
                positions.push((x, y));
                if fits_with_placed(model, positions) && place_remaining(model, width, positions) {
                    return true;
                }
                positions.pop();
            }
        }
        false
    }

    /// Checks the last placed item against every earlier one.
    fn fits_with_placed(model: &Model<i32>, positions: &[(i32, i32)]) -> bool {
        let last = positions.len() - 1;
        let (x, y) = positions[last];
        let (w, h) = (model.widths()[last], model.heights()[last]);
        let disjoint = positions[..last].iter().enumerate().all(|(j, &(xj, yj))| {
            let (wj, hj) = (model.widths()[j], model.heights()[j]);
            x + w <= xj || xj + wj <= x || y + h <= yj || yj + hj <= y
        });
        disjoint
            && model.dependencies().iter().all(|dependency| {
                let (p, c) = (dependency.producer().get(), dependency.consumer().get());
                if p > last || c > last {
                    return true;
                }
                let (xp, xc) = (positions[p].0, positions[c].0);
                xp <= xc && xc + dependency.op_cost() <= xp + model.widths()[p]
            })
    }

    fn dependent_instance() -> impl Strategy<Value = (i32, Vec<(i32, i32)>, Vec<(usize, usize, i32)>)> {
        (1..=6i32, 1..=4usize).prop_flat_map(|(h, n)| {
            (
                Just(h),
                prop::collection::vec((1..=3i32, 1..=h), n),
                prop::collection::vec((0..n, 0..n, 0..=3i32), 0..=2),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn test_optimum_matches_exhaustive_enumeration(
            (h, dims, dependencies) in dependent_instance(),
        ) {
            let mut builder = ModelBuilder::new(h);
            for &(width, height) in &dims {
                builder.add_item(width, height);
            }
            for &(p, c, op_cost) in dependencies.iter().filter(|(p, c, _)| p != c) {
                builder.add_dependency(ItemIndex::new(p), ItemIndex::new(c), op_cost);
            }
            let model = builder.build().unwrap();
            let expected = exhaustive_optimum(&model);

            for threads in [1, 3] {
                let solver = SolverBuilder::new().with_threads(threads).build();
                match (solver.solve(&model), expected) {
                    (Ok(result), Some(objective)) => {
                        prop_assert!(result.is_optimal());
                        prop_assert_eq!(result.objective(), objective);
                        prop_assert_eq!(result.placement().validate(&model), Ok(()));
                    }
                    (Err(SolveError::NoFeasibleSolution), None) => {}
                    (outcome, expected) => {
                        prop_assert!(false, "solver returned {:?}, enumeration {:?}", outcome, expected);
                    }
                }
            }
        }

        #[test]
        fn test_solutions_are_valid_and_selection_independent((h, dims) in instance()) {
            let model = Model::from_dimensions(h, &dims).unwrap();
            let most_constrained = SolverBuilder::new().build().solve(&model).unwrap();
            let lexicographic = SolverBuilder::new()
                .with_pair_selection(PairSelection::Lexicographic)
                .build()
                .solve(&model)
                .unwrap();
            let parallel = SolverBuilder::new().with_threads(3).build().solve(&model).unwrap();

            prop_assert!(most_constrained.is_optimal());
            prop_assert_eq!(most_constrained.placement().validate(&model), Ok(()));
            prop_assert_eq!(lexicographic.placement().validate(&model), Ok(()));
            prop_assert_eq!(parallel.placement().validate(&model), Ok(()));
            prop_assert_eq!(most_constrained.objective(), lexicographic.objective());
            prop_assert_eq!(most_constrained.objective(), parallel.objective());
        }
    }
}
