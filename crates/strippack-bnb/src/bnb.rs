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

//! Branch-and-bound solver for two-dimensional strip packing.
//!
//! This module implements a stateful search engine that explores the
//! relation assignments of all item pairs depth-first. Every node runs the
//! propagator to a fixpoint under the current objective cutoff, so that a
//! node either fails, is bounded away, or hands a smaller set of still
//! possible relations to the branching heuristic. A node whose pairs are all
//! resolved becomes a leaf: every coordinate is fixed at its lower bound and
//! the resulting placement is, by construction of the cutoff, strictly
//! better than the incumbent.
//!
//! `BnbSolver` keeps its trail, stack and state between solves so repeated
//! runs do not reallocate. A search session owns the per-run state
//! (incumbent, statistics, timing) and consumes itself into a
//! `BnbSolverOutcome`. Exploration order is fixed by the `DecisionBuilder`,
//! so runs are deterministic.

use crate::{
    branching::decision::{Decision, DecisionBuilder},
    eval::evaluator::ObjectiveEvaluator,
    incumbent::{IncumbentStore, NoSharedIncumbent, SharedIncumbentAdapter},
    monitor::tree_search_monitor::{PruneReason, TreeSearchMonitor},
    propagate::{PropagationOutcome, Propagator},
    result::BnbSolverOutcome,
    stack::SearchStack,
    state::SearchState,
    stats::BnbSolverStatistics,
    trail::SearchTrail,
};
use num_traits::{PrimInt, Signed};
use strippack_model::{model::Model, placement::Placement};
use strippack_search::{
    command::SearchCommand, incumbent::SharedIncumbent, num::SolverNumeric,
    result::TerminationReason,
};

/// A propagating branch-and-bound solver.
///
/// This is only the execution engine: which pair to branch on and in which
/// order its relations are tried is up to a `DecisionBuilder`, bounds and
/// the objective come from an `ObjectiveEvaluator`.
#[derive(Debug, Clone)]
pub struct BnbSolver<T>
where
    T: PrimInt + Signed,
{
    trail: SearchTrail<T>,
    stack: SearchStack,
    state: SearchState<T>,
    propagator: Propagator,
}

impl<T> Default for BnbSolver<T>
where
    T: PrimInt + Signed,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BnbSolver<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            trail: SearchTrail::new(),
            stack: SearchStack::new(),
            state: SearchState::new(),
            propagator: Propagator::new(),
        }
    }

    /// Creates a solver with storage for models of `num_items` items.
    ///
    /// The solver grows its storage on demand anyway; this only moves the
    /// allocations to construction time.
    #[inline]
    pub fn preallocated(num_items: usize) -> Self {
        let mut state = SearchState::new();
        state.domains_mut().ensure_capacity(num_items);
        Self {
            trail: SearchTrail::preallocated(num_items),
            stack: SearchStack::preallocated(num_items),
            state,
            propagator: Propagator::preallocated(num_items),
        }
    }

    /// Bytes currently reserved by the trail and the decision stack.
    #[inline]
    pub fn allocated_memory_bytes(&self) -> usize {
        self.trail.allocated_memory_bytes() + self.stack.allocated_memory_bytes()
    }

    /// Solves `model` as a standalone, single-threaded search.
    #[inline]
    pub fn solve<B, E, S>(
        &mut self,
        model: &Model<T>,
        builder: &mut B,
        evaluator: &mut E,
        monitor: S,
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T>,
        E: ObjectiveEvaluator<T>,
        S: TreeSearchMonitor<T>,
        T: SolverNumeric,
    {
        self.solve_internal(model, &[], builder, evaluator, monitor, NoSharedIncumbent::new())
    }

    /// Solves `model` while sharing the best known width through
    /// `incumbent`.
    ///
    /// Only placements strictly narrower than the incumbent's bound are
    /// searched for. If another solver holds a better placement when this
    /// one finishes, the outcome is `Infeasible`: nothing better exists in
    /// the explored space.
    #[inline]
    pub fn solve_with_incumbent<B, E, S>(
        &mut self,
        model: &Model<T>,
        builder: &mut B,
        evaluator: &mut E,
        monitor: S,
        incumbent: &SharedIncumbent<T>,
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T>,
        E: ObjectiveEvaluator<T>,
        S: TreeSearchMonitor<T>,
        T: SolverNumeric,
    {
        let backing = SharedIncumbentAdapter::new(incumbent);
        self.solve_internal(model, &[], builder, evaluator, monitor, backing)
    }

    /// Solves `model` with the relations in `fixed` resolved up front.
    ///
    /// Conflicting or out-of-range decisions make the instance infeasible.
    #[inline]
    pub fn solve_with_fixed<B, E, S>(
        &mut self,
        model: &Model<T>,
        builder: &mut B,
        evaluator: &mut E,
        monitor: S,
        fixed: &[Decision],
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T>,
        E: ObjectiveEvaluator<T>,
        S: TreeSearchMonitor<T>,
        T: SolverNumeric,
    {
        self.solve_internal(model, fixed, builder, evaluator, monitor, NoSharedIncumbent::new())
    }

    /// Combines `solve_with_fixed` and `solve_with_incumbent`; this is what
    /// each worker of a parallel search runs.
    #[inline]
    pub fn solve_with_fixed_and_incumbent<B, E, S>(
        &mut self,
        model: &Model<T>,
        builder: &mut B,
        evaluator: &mut E,
        monitor: S,
        fixed: &[Decision],
        incumbent: &SharedIncumbent<T>,
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T>,
        E: ObjectiveEvaluator<T>,
        S: TreeSearchMonitor<T>,
        T: SolverNumeric,
    {
        let backing = SharedIncumbentAdapter::new(incumbent);
        self.solve_internal(model, fixed, builder, evaluator, monitor, backing)
    }

    fn solve_internal<B, E, S, I>(
        &mut self,
        model: &Model<T>,
        fixed: &[Decision],
        builder: &mut B,
        evaluator: &mut E,
        mut monitor: S,
        backing: I,
    ) -> BnbSolverOutcome<T>
    where
        B: DecisionBuilder<T>,
        E: ObjectiveEvaluator<T>,
        S: TreeSearchMonitor<T>,
        I: IncumbentStore<T>,
        T: SolverNumeric,
    {
        let session = BnbSolverSearchSession::new(
            self,
            model,
            fixed,
            builder,
            evaluator,
            &mut monitor,
            backing,
        );
        let outcome = session.run();
        self.reset();
        outcome
    }

    /// Clears the logical state of the trail, stack and search state while
    /// keeping their capacity.
    #[inline]
    fn reset(&mut self) {
        self.trail.reset();
        self.stack.reset();
        self.state.reset();
    }
}

/// The state and logic of a single search run.
struct BnbSolverSearchSession<'a, T, B, E, S, I>
where
    T: SolverNumeric,
    I: IncumbentStore<T>,
{
    solver: &'a mut BnbSolver<T>,
    model: &'a Model<T>,
    fixed: &'a [Decision],
    builder: &'a mut B,
    evaluator: &'a mut E,
    monitor: &'a mut S,
    incumbent: I,
    /// Objective cutoff: only placements strictly below it are accepted.
    best_objective: T,
    best_placement: Option<Placement<T>>,
    static_lower_bound: T,
    stats: BnbSolverStatistics<T>,
    start_time: std::time::Instant,
}

impl<T, B, E, S, I> std::fmt::Display for BnbSolverSearchSession<'_, T, B, E, S, I>
where
    T: SolverNumeric,
    I: IncumbentStore<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let placement = match &self.best_placement {
            Some(placement) => format!("Placement(objective: {})", placement.objective()),
            None => "none".to_string(),
        };
        write!(
            f,
            "SearchSession(best_objective: {}, best_placement: {}, depth: {})",
            self.best_objective,
            placement,
            self.solver.stack.depth()
        )
    }
}

impl<'a, T, B, E, S, I> BnbSolverSearchSession<'a, T, B, E, S, I>
where
    T: SolverNumeric,
    B: DecisionBuilder<T>,
    E: ObjectiveEvaluator<T>,
    S: TreeSearchMonitor<T>,
    I: IncumbentStore<T>,
{
    fn new(
        solver: &'a mut BnbSolver<T>,
        model: &'a Model<T>,
        fixed: &'a [Decision],
        builder: &'a mut B,
        evaluator: &'a mut E,
        monitor: &'a mut S,
        incumbent: I,
    ) -> Self {
        // Side by side always fits, so the first leaf must beat `W + 1`.
        let trivial_cutoff = evaluator
            .trivial_upper_bound(model)
            .saturating_add(T::one());
        let best_objective = incumbent.initial_upper_bound().min(trivial_cutoff);
        let static_lower_bound = evaluator.static_lower_bound(model);

        Self {
            solver,
            model,
            fixed,
            builder,
            evaluator,
            monitor,
            incumbent,
            best_objective,
            best_placement: None,
            static_lower_bound,
            stats: BnbSolverStatistics::default(),
            start_time: std::time::Instant::now(),
        }
    }

    fn run(mut self) -> BnbSolverOutcome<T> {
        self.monitor.on_enter_search(self.model, &self.stats);

        if !self.initialize() {
            self.stats.set_total_time(self.start_time.elapsed());
            self.monitor.on_exit_search(&self.stats);
            return self.finalize(TerminationReason::InfeasibilityProven);
        }

        let termination_reason = loop {
            self.best_objective = self.incumbent.tighten(self.best_objective);
            self.monitor.on_step(&self.solver.state, &self.stats);

            if let SearchCommand::Terminate(reason) =
                self.monitor.search_command(&self.solver.state, &self.stats)
            {
                break TerminationReason::Aborted(reason);
            }

            // Nothing can be narrower than the static bound.
            if self.best_objective <= self.static_lower_bound {
                break self.exhausted();
            }

            if self.solver.stack.is_current_level_empty() {
                if self.solver.stack.depth() <= 1 {
                    break self.exhausted();
                }
                self.backtrack_step();
            } else {
                self.process_next_decision();
            }
        };

        self.stats.set_total_time(self.start_time.elapsed());
        self.monitor.on_exit_search(&self.stats);
        self.finalize(termination_reason)
    }

    /// The reason to report once no better placement can exist.
    #[inline]
    fn exhausted(&self) -> TerminationReason {
        match &self.best_placement {
            Some(placement) if placement.objective() <= self.best_objective => {
                TerminationReason::OptimalityProven
            }
            _ => TerminationReason::InfeasibilityProven,
        }
    }

    fn finalize(self, reason: TerminationReason) -> BnbSolverOutcome<T> {
        match reason {
            TerminationReason::OptimalityProven => match self.best_placement {
                Some(placement) => BnbSolverOutcome::optimal(placement, self.stats),
                None => BnbSolverOutcome::infeasible(self.stats),
            },
            TerminationReason::InfeasibilityProven => BnbSolverOutcome::infeasible(self.stats),
            TerminationReason::Aborted(reason) => {
                BnbSolverOutcome::aborted(self.best_placement, reason, self.stats)
            }
        }
    }

    /// Sets up the root node: initial domains, fixed relations, the root
    /// frames, and the root's children.
    ///
    /// Returns `false` if the instance is infeasible before any search.
    fn initialize(&mut self) -> bool {
        let num_items = self.model.num_items();
        self.solver.trail.ensure_capacity(num_items);
        self.solver.stack.ensure_capacity(num_items);

        if self.solver.state.initialize(self.model).is_err() {
            return false;
        }
        self.stats.set_root_lower_bound(self.static_lower_bound);

        let num_pairs = self.solver.state.relations().num_pairs();
        for decision in self.fixed {
            if decision.pair().get() >= num_pairs {
                return false;
            }
            if self
                .solver
                .trail
                .resolve(&mut self.solver.state, decision.pair(), decision.relation())
                .is_err()
            {
                return false;
            }
        }

        // Root frame. It must exist before any decision is pushed.
        self.solver.trail.push_frame();
        self.solver.stack.push_frame();
        self.stats.on_node_explored();
        self.stats.on_depth_update(1);

        self.expand();
        true
    }

    #[inline]
    fn backtrack_step(&mut self) {
        self.stats.on_backtrack();
        self.monitor.on_backtrack(&self.solver.state, &self.stats);

        self.solver.trail.backtrack(&mut self.solver.state);
        self.solver.stack.pop_frame();
    }

    #[inline]
    fn process_next_decision(&mut self) {
        if let Some(decision) = self.solver.stack.pop() {
            self.descend(decision);
        }
    }

    /// Opens a child node for `decision` and expands it.
    fn descend(&mut self, decision: Decision) {
        self.solver.trail.push_frame();
        self.solver.stack.push_frame();

        self.stats.on_node_explored();
        self.stats
            .on_depth_update(self.solver.stack.depth() as u64);
        self.monitor
            .on_descend(&self.solver.state, decision, &self.stats);

        // A sibling's propagation cannot have resolved this pair, but a
        // conflicting relation is still a prune, never a panic.
        if self
            .solver
            .trail
            .resolve(&mut self.solver.state, decision.pair(), decision.relation())
            .is_err()
        {
            self.prune(PruneReason::Infeasible);
            return;
        }

        self.expand();
    }

    /// Propagates the current node and either prunes it, completes it as a
    /// leaf, or pushes its children onto the current stack level.
    fn expand(&mut self) {
        let outcome = self.solver.propagator.propagate(
            self.model,
            &mut self.solver.state,
            &mut self.solver.trail,
            self.best_objective,
        );
        match outcome {
            PropagationOutcome::Infeasible => {
                self.prune(PruneReason::Infeasible);
                return;
            }
            PropagationOutcome::Consistent { forced_relations } => {
                self.stats.on_forced_relations(forced_relations);
            }
        }

        let lower_bound = self.evaluator.lower_bound(self.model, &self.solver.state);
        self.monitor
            .on_lower_bound_computed(&self.solver.state, lower_bound, &self.stats);
        if self.solver.stack.depth() == 1 {
            self.stats
                .set_root_lower_bound(lower_bound.max(self.static_lower_bound));
        }
        if lower_bound >= self.best_objective {
            self.prune(PruneReason::BoundDominated);
            return;
        }

        let Some(pair) = self
            .builder
            .select_branch_pair(self.model, &self.solver.state)
        else {
            self.handle_complete_solution();
            return;
        };

        let decisions = self.builder.branch(self.model, &self.solver.state, pair);
        // Reversed, so the first decision is popped first.
        self.solver.stack.extend(decisions.iter().rev().copied());
        self.stats.on_decisions_generated(decisions.len());
        self.monitor
            .on_decisions_enqueued(&self.solver.state, decisions.len(), &self.stats);
    }

    /// Fixes every coordinate of a fully resolved node at its lower bound
    /// and installs the placement if it improves on the incumbent.
    fn handle_complete_solution(&mut self) {
        self.solver.trail.fix_at_lower(&mut self.solver.state);

        let objective = match self.evaluator.evaluate(self.model, &self.solver.state) {
            Some(objective) => objective,
            None => {
                self.prune(PruneReason::Infeasible);
                return;
            }
        };
        if objective >= self.best_objective {
            self.prune(PruneReason::BoundDominated);
            return;
        }

        let Some(placement) = self.solver.state.placement(objective) else {
            self.prune(PruneReason::Infeasible);
            return;
        };
        debug_assert!(
            placement.validate(self.model).is_ok(),
            "called `BnbSolverSearchSession::handle_complete_solution` on an invalid leaf: {:?}",
            placement.validate(self.model)
        );

        self.best_objective = objective;
        self.incumbent.on_solution_found(&placement);
        self.stats.on_solution_found();
        self.monitor.on_solution_found(&placement, &self.stats);
        self.best_placement = Some(placement);
    }

    #[inline]
    fn prune(&mut self, reason: PruneReason) {
        match reason {
            PruneReason::Infeasible => self.stats.on_pruning_infeasible(),
            PruneReason::BoundDominated => self.stats.on_pruning_bound(),
        }
        self.monitor.on_prune(&self.solver.state, reason, &self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        branching::{
            decision::RelationOrder, lexicographic::LexicographicBuilder,
            most_constrained::MostConstrainedBuilder,
        },
        eval::makespan::MakespanEvaluator,
        monitor::{no_op::NoOperationMonitor, node_limit::NodeLimitMonitor},
        relation::{PairIndex, Relation},
    };
    use proptest::prelude::*;
    use strippack_model::model::ModelBuilder;
    use strippack_search::result::SolverResult;

    type IntegerType = i64;

    fn scenario_c() -> Model<IntegerType> {
        Model::from_dimensions(
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
        .unwrap()
    }

    fn solve(model: &Model<IntegerType>) -> BnbSolverOutcome<IntegerType> {
        let mut solver = BnbSolver::new();
        solver.solve(
            model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
        )
    }

    fn optimal_objective(outcome: &BnbSolverOutcome<IntegerType>) -> IntegerType {
        match outcome.result() {
            SolverResult::Optimal(placement) => placement.objective(),
            other => panic!("expected an optimal result, got {}", other),
        }
    }

    #[test]
    fn test_single_item_is_placed_at_origin() {
        let model = Model::from_dimensions(10, &[(3, 4)]).unwrap();
        let outcome = solve(&model);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::OptimalityProven
        );
        let placement = outcome.result().placement().unwrap();
        assert_eq!(placement.objective(), 3);
        assert_eq!(placement.position(strippack_model::index::ItemIndex::new(0)), (0, 0));
    }

    #[test]
    fn test_tall_items_are_placed_side_by_side() {
        let model = Model::from_dimensions(10, &[(3, 6), (4, 7)]).unwrap();
        let outcome = solve(&model);
        assert_eq!(optimal_objective(&outcome), 7);
        assert_eq!(outcome.result().placement().unwrap().validate(&model), Ok(()));
    }

    #[test]
    fn test_stackable_items_share_a_column() {
        let model = Model::from_dimensions(10, &[(3, 4), (3, 6), (2, 10)]).unwrap();
        let outcome = solve(&model);
        assert_eq!(optimal_objective(&outcome), 5);
    }

    #[test]
    fn test_scenario_c_is_solved_to_optimality() {
        let model = scenario_c();
        let mut solver = BnbSolver::preallocated(model.num_items());
        let outcome = solver.solve(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
        );

        // The area bound ceil(210 / 10) is attained.
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::OptimalityProven
        );
        assert_eq!(optimal_objective(&outcome), 21);
        assert_eq!(outcome.result().placement().unwrap().validate(&model), Ok(()));
        assert!(outcome.statistics().solutions_found >= 1);
        assert_eq!(outcome.statistics().root_lower_bound, 21);
    }

    #[test]
    fn test_dependency_is_respected_by_optimum() {
        let mut builder = ModelBuilder::<IntegerType>::new(10);
        let producer = builder.add_item(4, 3);
        let consumer = builder.add_item(2, 5);
        builder.add_dependency(producer, consumer, 2);
        let model = builder.build().unwrap();

        let outcome = solve(&model);
        assert_eq!(optimal_objective(&outcome), 4);
        let placement = outcome.result().placement().unwrap();
        assert_eq!(placement.validate(&model), Ok(()));
        let (xp, _) = placement.position(producer);
        let (xc, _) = placement.position(consumer);
        assert!(xp <= xc && xc + 2 <= xp + 4);
    }

    #[test]
    fn test_dependency_can_make_instance_infeasible() {
        // The items cannot be stacked, yet the dependency makes them share
        // x coordinates.
        let mut builder = ModelBuilder::<IntegerType>::new(10);
        let producer = builder.add_item(3, 6);
        let consumer = builder.add_item(3, 7);
        builder.add_dependency(producer, consumer, 1);
        let model = builder.build().unwrap();

        let outcome = solve(&model);
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::InfeasibilityProven
        );
    }

    #[test]
    fn test_relaxed_model_with_tall_item_is_infeasible() {
        let mut builder = ModelBuilder::<IntegerType>::new(5);
        builder.add_item(2, 3);
        builder.add_item(2, 6);
        let model = builder.build_relaxed().unwrap();

        let outcome = solve(&model);
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
        assert_eq!(
            outcome.termination_reason(),
            &TerminationReason::InfeasibilityProven
        );
    }

    #[test]
    fn test_solver_is_deterministic_and_reusable() {
        let model = Model::from_dimensions(6, &[(2, 3), (3, 3), (1, 6), (2, 2), (4, 1)]).unwrap();
        let mut solver = BnbSolver::new();
        let run = |solver: &mut BnbSolver<IntegerType>| {
            solver.solve(
                &model,
                &mut MostConstrainedBuilder::new(),
                &mut MakespanEvaluator::new(),
                NoOperationMonitor::new(),
            )
        };
        let first = run(&mut solver);
        let second = run(&mut solver);
        assert_eq!(first.result(), second.result());
        assert_eq!(
            first.statistics().nodes_explored,
            second.statistics().nodes_explored
        );

        // Clean end state.
        assert!(solver.trail.is_empty());
        assert!(solver.stack.is_empty());
        assert_eq!(solver.state.num_items(), 0);
    }

    #[test]
    fn test_fixed_relation_is_respected() {
        let model = Model::from_dimensions(10, &[(3, 4), (3, 4)]).unwrap();
        assert_eq!(optimal_objective(&solve(&model)), 3);

        let mut solver = BnbSolver::new();
        let outcome = solver.solve_with_fixed(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
            &[Decision::new(PairIndex::new(0), Relation::Left)],
        );
        let placement = outcome.result().placement().unwrap();
        assert_eq!(placement.objective(), 6);
        assert_eq!(placement.xs(), &[0, 3]);
    }

    #[test]
    fn test_conflicting_fixed_relations_are_infeasible() {
        let model = Model::from_dimensions(10, &[(3, 4), (3, 4)]).unwrap();
        let mut solver = BnbSolver::new();
        let outcome = solver.solve_with_fixed(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
            &[
                Decision::new(PairIndex::new(0), Relation::Left),
                Decision::new(PairIndex::new(0), Relation::Above),
            ],
        );
        assert_eq!(outcome.result(), &SolverResult::Infeasible);

        let outcome = solver.solve_with_fixed(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
            &[Decision::new(PairIndex::new(7), Relation::Left)],
        );
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
        assert!(solver.trail.is_empty());
    }

    #[test]
    fn test_shared_incumbent_bound_is_respected() {
        let model = Model::from_dimensions(10, &[(3, 6), (4, 7)]).unwrap();
        let mut solver = BnbSolver::new();

        // Nothing is strictly narrower than the optimum.
        let tight = SharedIncumbent::with_upper_bound(7);
        let outcome = solver.solve_with_incumbent(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
            &tight,
        );
        assert_eq!(outcome.result(), &SolverResult::Infeasible);
        assert!(!tight.has_placement());

        let loose = SharedIncumbent::with_upper_bound(20);
        let outcome = solver.solve_with_incumbent(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
            &loose,
        );
        assert_eq!(optimal_objective(&outcome), 7);
        assert_eq!(loose.upper_bound(), 7);
        assert_eq!(loose.snapshot().map(|p| p.objective()), Some(7));
    }

    #[test]
    fn test_node_limit_aborts_search() {
        let model = scenario_c();
        let mut solver = BnbSolver::new();
        let outcome = solver.solve(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NodeLimitMonitor::new(1),
        );
        assert!(matches!(
            outcome.termination_reason(),
            TerminationReason::Aborted(_)
        ));
        assert_eq!(outcome.result(), &SolverResult::Unknown);
        assert!(solver.trail.is_empty());
    }

    #[test]
    fn test_relation_order_does_not_change_optimum() {
        let model = Model::from_dimensions(5, &[(2, 3), (2, 2), (1, 5), (3, 2)]).unwrap();
        let reversed = RelationOrder::new([
            Relation::Below,
            Relation::Above,
            Relation::Right,
            Relation::Left,
        ])
        .unwrap();
        let mut solver = BnbSolver::new();
        let a = solver.solve(
            &model,
            &mut MostConstrainedBuilder::new(),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
        );
        let b = solver.solve(
            &model,
            &mut LexicographicBuilder::with_relation_order(reversed),
            &mut MakespanEvaluator::new(),
            NoOperationMonitor::new(),
        );
        assert_eq!(optimal_objective(&a), optimal_objective(&b));
        // Area 21 over height 5.
        assert_eq!(optimal_objective(&a), 5);
    }

    #[test]
    fn test_statistics_are_coherent() {
        let model = Model::from_dimensions(4, &[(1, 3), (2, 2), (2, 2), (1, 1)]).unwrap();
        let outcome = solve(&model);
        let stats = outcome.statistics();
        assert!(stats.nodes_explored >= 1);
        assert!(stats.solutions_found >= 1);
        assert!(stats.max_depth >= 1);
        assert!(stats.root_lower_bound <= optimal_objective(&outcome));
    }

    fn instance() -> impl Strategy<Value = (IntegerType, Vec<(IntegerType, IntegerType)>)> {
        (1..=6 as IntegerType).prop_flat_map(|h| {
            (
                Just(h),
                prop::collection::vec((1..=4 as IntegerType, 1..=h), 1..=5),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_every_optimum_is_a_valid_placement((h, dims) in instance()) {
            let model = Model::from_dimensions(h, &dims).unwrap();
            let outcome = solve(&model);
            prop_assert!(matches!(outcome.result(), SolverResult::Optimal(_)));
            let placement = outcome.result().placement().cloned().unwrap();

            prop_assert_eq!(placement.validate(&model), Ok(()));
            let recomputed = placement
                .positions()
                .zip(model.widths())
                .map(|((x, _), &w)| x + w)
                .max()
                .unwrap();
            prop_assert_eq!(placement.objective(), recomputed);

            let evaluator = MakespanEvaluator::new();
            prop_assert!(placement.objective() >= evaluator.static_lower_bound(&model));
            prop_assert!(placement.objective() <= model.total_width());
        }

        #[test]
        fn test_branching_heuristics_agree_on_optimum((h, dims) in instance()) {
            let model = Model::from_dimensions(h, &dims).unwrap();
            let mut solver = BnbSolver::new();
            let a = solver.solve(
                &model,
                &mut MostConstrainedBuilder::new(),
                &mut MakespanEvaluator::new(),
                NoOperationMonitor::new(),
            );
            let b = solver.solve(
                &model,
                &mut LexicographicBuilder::new(),
                &mut MakespanEvaluator::new(),
                NoOperationMonitor::new(),
            );
            prop_assert_eq!(
                a.result().placement().map(|p| p.objective()),
                b.result().placement().map(|p| p.objective())
            );
        }
    }
}
