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

//! Fixpoint bound propagation.
//!
//! One call to `Propagator::propagate` performs, in order:
//!
//! 1. The objective cut: with cutoff `U`, every `x_i.upper` is narrowed to
//!    `U - 1 - w_i`, so any surviving leaf is strictly better than `U`.
//! 2. Rounds over the item pairs until no domain changes. In each round only
//!    pairs touching an item whose domain changed in the previous round are
//!    visited (the first round visits all of them):
//!    - a resolved pair enforces its precedence `before + size <= after` by
//!      raising `after.lower` and lowering `before.upper`;
//!    - an undecided pair counts its still-possible relations. None left
//!      means the node is infeasible; exactly one left is resolved on the
//!      trail and enforced right away;
//!    - every model dependency touching a changed item enforces its two
//!      static x precedences.
//!
//! Every step only narrows an interval of a finite lattice, so the rounds
//! terminate. All changes go through the trail and are undone on backtrack.
//! The y-domain strip bound needs no rule of its own: it holds from
//! `initialize` on and narrowing never widens a domain.

use crate::{
    domain::{Axis, EmptyDomain},
    relation::{PairIndex, PairRelation, Precedence, Relation},
    state::SearchState,
    trail::SearchTrail,
};
use fixedbitset::FixedBitSet;
use num_traits::{PrimInt, Signed};
use strippack_model::{index::ItemIndex, model::Model};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropagationOutcome {
    /// The fixpoint was reached; `forced_relations` pairs were resolved on
    /// the way.
    Consistent { forced_relations: usize },
    Infeasible,
}

impl PropagationOutcome {
    #[inline]
    pub(crate) fn is_infeasible(&self) -> bool {
        matches!(self, PropagationOutcome::Infeasible)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Propagator {
    dirty: FixedBitSet,
    next: FixedBitSet,
}

impl Propagator {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            dirty: FixedBitSet::new(),
            next: FixedBitSet::new(),
        }
    }

    #[inline]
    pub(crate) fn preallocated(num_items: usize) -> Self {
        Self {
            dirty: FixedBitSet::with_capacity(num_items),
            next: FixedBitSet::with_capacity(num_items),
        }
    }

    /// Runs propagation to a fixpoint under the objective cutoff `cutoff`.
    ///
    /// On `Infeasible` the state may be partially narrowed; the caller
    /// discards the node by backtracking the trail.
    pub(crate) fn propagate<T>(
        &mut self,
        model: &Model<T>,
        state: &mut SearchState<T>,
        trail: &mut SearchTrail<T>,
        cutoff: T,
    ) -> PropagationOutcome
    where
        T: PrimInt + Signed,
    {
        match self.run(model, state, trail, cutoff) {
            Ok(forced_relations) => PropagationOutcome::Consistent { forced_relations },
            Err(EmptyDomain) => PropagationOutcome::Infeasible,
        }
    }

    fn run<T>(
        &mut self,
        model: &Model<T>,
        state: &mut SearchState<T>,
        trail: &mut SearchTrail<T>,
        cutoff: T,
    ) -> Result<usize, EmptyDomain>
    where
        T: PrimInt + Signed,
    {
        let num_items = state.num_items();
        self.reset(num_items);

        let cut = cutoff.saturating_sub(T::one());
        for item in ItemIndex::range(num_items) {
            let upper = cut.saturating_sub(model.item_width(item));
            trail.narrow(state, Axis::X, item, T::min_value(), upper)?;
        }
        self.dirty.insert_range(..);

        let num_pairs = state.relations().num_pairs();
        let mut forced = 0;
        while self.dirty.ones().next().is_some() {
            self.next.clear();
            for k in 0..num_pairs {
                let pair_index = PairIndex::new(k);
                let pair = state.relations().pair(pair_index);
                if !self.dirty.contains(pair.first().get())
                    && !self.dirty.contains(pair.second().get())
                {
                    continue;
                }

                let relation = match state.relations().relation(pair_index) {
                    PairRelation::Resolved(relation) => relation,
                    PairRelation::Undecided => {
                        match Self::single_possible_relation(model, state, pair_index)? {
                            Some(relation) => {
                                trail.resolve(state, pair_index, relation)?;
                                forced += 1;
                                relation
                            }
                            None => continue,
                        }
                    }
                };

                let precedence = relation.precedence(model, pair);
                self.enforce(state, trail, &precedence)?;
            }

            for dependency in model.dependencies() {
                if !self.dirty.contains(dependency.producer().get())
                    && !self.dirty.contains(dependency.consumer().get())
                {
                    continue;
                }
                for precedence in Precedence::from_dependency(model, dependency) {
                    self.enforce(state, trail, &precedence)?;
                }
            }
            std::mem::swap(&mut self.dirty, &mut self.next);
        }

        Ok(forced)
    }

    /// Returns the only relation of an undecided pair that can still hold,
    /// `None` if several can, or `EmptyDomain` if none can.
    #[inline]
    fn single_possible_relation<T>(
        model: &Model<T>,
        state: &SearchState<T>,
        pair_index: PairIndex,
    ) -> Result<Option<Relation>, EmptyDomain>
    where
        T: PrimInt + Signed,
    {
        let pair = state.relations().pair(pair_index);
        let mut possible = Relation::ALL
            .into_iter()
            .filter(|relation| relation.precedence(model, pair).is_possible(state.domains()));

        match (possible.next(), possible.next()) {
            (None, _) => Err(EmptyDomain),
            (Some(only), None) => Ok(Some(only)),
            (Some(_), Some(_)) => Ok(None),
        }
    }

    #[inline]
    fn enforce<T>(
        &mut self,
        state: &mut SearchState<T>,
        trail: &mut SearchTrail<T>,
        precedence: &Precedence<T>,
    ) -> Result<(), EmptyDomain>
    where
        T: PrimInt + Signed,
    {
        let axis = precedence.axis();
        let (after_lower, before_upper) = precedence.required_bounds(state.domains());

        if trail.narrow(state, axis, precedence.after(), after_lower, T::max_value())? {
            self.next.insert(precedence.after().get());
        }
        if trail.narrow(state, axis, precedence.before(), T::min_value(), before_upper)? {
            self.next.insert(precedence.before().get());
        }
        Ok(())
    }

    fn reset(&mut self, num_items: usize) {
        self.dirty.clear();
        self.next.clear();
        self.dirty.grow(num_items);
        self.next.grow(num_items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strippack_core::math::interval::ClosedInterval;
    use strippack_model::model::ModelBuilder;

    fn item(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    fn setup(h: i64, dims: &[(i64, i64)]) -> (Model<i64>, SearchState<i64>, SearchTrail<i64>) {
        let model = Model::from_dimensions(h, dims).unwrap();
        let state = SearchState::root(&model).unwrap();
        (model, state, SearchTrail::new())
    }

    #[test]
    fn test_objective_cut_bounds_every_x() {
        let (model, mut state, mut trail) = setup(10, &[(2, 1), (3, 1), (4, 1)]);
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 7);
        assert!(!outcome.is_infeasible());
        // x_i.upper <= 7 - 1 - w_i
        assert_eq!(state.domains().x(item(0)), ClosedInterval::new(0, 4));
        assert_eq!(state.domains().x(item(1)), ClosedInterval::new(0, 3));
        assert_eq!(state.domains().x(item(2)), ClosedInterval::new(0, 2));
    }

    #[test]
    fn test_cut_below_widest_item_is_infeasible() {
        let (model, mut state, mut trail) = setup(10, &[(2, 1), (5, 1)]);
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 5);
        assert_eq!(outcome, PropagationOutcome::Infeasible);
    }

    #[test]
    fn test_tall_pair_is_forced_side_by_side() {
        // Heights 6 and 7 in a strip of 10 cannot be stacked; with a cutoff
        // that forbids RIGHT only LEFT remains.
        let (model, mut state, mut trail) = setup(10, &[(2, 6), (3, 7)]);
        let mut propagator = Propagator::preallocated(2);

        let outcome = propagator.propagate(&model, &mut state, &mut trail, 6);
        assert_eq!(outcome, PropagationOutcome::Consistent { forced_relations: 0 });

        trail.narrow(&mut state, Axis::X, item(0), 0, 0).unwrap();
        let outcome = propagator.propagate(&model, &mut state, &mut trail, 6);
        assert_eq!(outcome, PropagationOutcome::Consistent { forced_relations: 1 });
        assert_eq!(
            state.relations().relation(PairIndex::new(0)).resolved(),
            Some(Relation::Left)
        );
        // x_1 >= x_0 + 2 = 2 and x_1 <= 6 - 1 - 3 = 2
        assert_eq!(state.domains().x(item(1)), ClosedInterval::singleton(2));
    }

    #[test]
    fn test_resolved_relations_propagate_transitively() {
        // No two of these heights fit on top of each other.
        let (model, mut state, mut trail) = setup(10, &[(2, 6), (3, 7), (4, 8)]);
        let table = state.relations().clone();
        trail
            .resolve(&mut state, table.pair_index(item(0), item(1)), Relation::Left)
            .unwrap();
        trail
            .resolve(&mut state, table.pair_index(item(1), item(2)), Relation::Left)
            .unwrap();

        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 10);
        assert!(!outcome.is_infeasible());
        // Chain 0 | 1 | 2 needs width 9 within cutoff 10.
        assert_eq!(state.domains().x(item(0)).upper(), 0);
        assert_eq!(state.domains().x(item(1)), ClosedInterval::new(2, 2));
        assert_eq!(state.domains().x(item(2)).lower(), 5);
        // The remaining pair (0, 2) has a single possible relation.
        assert!(state.relations().is_complete());
    }

    #[test]
    fn test_contradictory_relations_are_infeasible() {
        let (model, mut state, mut trail) = setup(10, &[(2, 1), (3, 1), (4, 1)]);
        let table = state.relations().clone();
        trail
            .resolve(&mut state, table.pair_index(item(0), item(1)), Relation::Left)
            .unwrap();
        trail
            .resolve(&mut state, table.pair_index(item(1), item(2)), Relation::Left)
            .unwrap();
        trail
            .resolve(&mut state, table.pair_index(item(0), item(2)), Relation::Right)
            .unwrap();
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 100);
        assert_eq!(outcome, PropagationOutcome::Infeasible);
    }

    fn dependent_setup(
        h: i64,
        dims: &[(i64, i64)],
        dependencies: &[(usize, usize, i64)],
    ) -> (Model<i64>, SearchState<i64>, SearchTrail<i64>) {
        let mut builder = ModelBuilder::new(h);
        for &(w, h) in dims {
            builder.add_item(w, h);
        }
        for &(producer, consumer, op_cost) in dependencies {
            builder.add_dependency(item(producer), item(consumer), op_cost);
        }
        let model = builder.build().unwrap();
        let state = SearchState::root(&model).unwrap();
        (model, state, SearchTrail::new())
    }

    #[test]
    fn test_dependency_bounds_the_consumer() {
        // Item 1 reads item 0 for two units; w_0 = 4, W = 9.
        let (model, mut state, mut trail) =
            dependent_setup(10, &[(4, 3), (2, 3), (3, 3)], &[(0, 1, 2)]);
        trail.narrow(&mut state, Axis::X, item(0), 3, 3).unwrap();

        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 10);
        assert!(!outcome.is_infeasible());
        // 3 <= x_1 <= 3 + 4 - 2
        assert_eq!(state.domains().x(item(1)), ClosedInterval::new(3, 5));
    }

    #[test]
    fn test_dependency_bounds_the_producer() {
        let (model, mut state, mut trail) =
            dependent_setup(10, &[(4, 3), (2, 3), (3, 3)], &[(0, 1, 2)]);
        trail.narrow(&mut state, Axis::X, item(1), 4, 4).unwrap();

        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 10);
        assert!(!outcome.is_infeasible());
        // 4 + 2 - 4 <= x_0 <= 4
        assert_eq!(state.domains().x(item(0)), ClosedInterval::new(2, 4));
    }

    #[test]
    fn test_dependency_longer_than_producer_is_infeasible() {
        let (model, mut state, mut trail) = dependent_setup(10, &[(2, 3), (2, 3)], &[(0, 1, 3)]);
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 5);
        assert_eq!(outcome, PropagationOutcome::Infeasible);
    }

    #[test]
    fn test_dependency_rules_out_side_by_side_relations() {
        // The items cannot be stacked and the dependency keeps x_1 within
        // [x_0, x_0 + 2]: once x_0 is fixed no relation is left.
        let (model, mut state, mut trail) = dependent_setup(10, &[(3, 6), (3, 7)], &[(0, 1, 1)]);
        trail.narrow(&mut state, Axis::X, item(0), 0, 0).unwrap();
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 7);
        assert_eq!(outcome, PropagationOutcome::Infeasible);
    }

    #[test]
    fn test_backtrack_undoes_propagation() {
        let (model, mut state, mut trail) = setup(10, &[(2, 6), (3, 7)]);
        let root = state.clone();
        trail.push_frame();
        let outcome = Propagator::new().propagate(&model, &mut state, &mut trail, 4);
        // x_1 is cut to [0, 0] and x_0 to [0, 1]: no relation fits.
        assert_eq!(outcome, PropagationOutcome::Infeasible);
        trail.backtrack(&mut state);
        assert_eq!(state.domains().xs(), root.domains().xs());
        assert_eq!(state.relations().num_undecided(), 1);
    }
}
