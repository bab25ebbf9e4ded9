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
    relation::{PairIndex, Relation},
    state::SearchState,
};
use num_traits::{PrimInt, Signed};
use smallvec::SmallVec;
use strippack_model::model::Model;

/// Resolve `pair` to `relation`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decision {
    pair: PairIndex,
    relation: Relation,
}

impl Decision {
    #[inline(always)]
    pub const fn new(pair: PairIndex, relation: Relation) -> Self {
        Self { pair, relation }
    }

    #[inline(always)]
    pub const fn pair(&self) -> PairIndex {
        self.pair
    }

    #[inline(always)]
    pub const fn relation(&self) -> Relation {
        self.relation
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Decision(pair: {}, relation: {})",
            self.pair, self.relation
        )
    }
}

/// The order in which the children of a branching node are explored.
///
/// Always a permutation of the four relations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelationOrder([Relation; 4]);

impl Default for RelationOrder {
    fn default() -> Self {
        Self(Relation::ALL)
    }
}

impl RelationOrder {
    /// Creates an order from `relations`, or `None` if a relation repeats.
    pub fn new(relations: [Relation; 4]) -> Option<Self> {
        let distinct = Relation::ALL
            .iter()
            .all(|r| relations.iter().filter(|&&x| x == *r).count() == 1);
        distinct.then_some(Self(relations))
    }

    #[inline]
    pub fn relations(&self) -> &[Relation; 4] {
        &self.0
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Relation> + '_ {
        self.0.iter().copied()
    }
}

impl std::fmt::Display for RelationOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{{{}, {}, {}, {}}}", a, b, c, d)
    }
}

/// Chooses where and how the search branches.
pub trait DecisionBuilder<T>
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str;

    /// The order in which `branch` emits relations.
    fn relation_order(&self) -> RelationOrder;

    /// Picks the undecided pair to branch on, or `None` if every pair is resolved.
    fn select_branch_pair(&mut self, model: &Model<T>, state: &SearchState<T>)
    -> Option<PairIndex>;

    /// Returns one decision per relation of `pair` that is still possible,
    /// in `relation_order`.
    fn branch(
        &mut self,
        model: &Model<T>,
        state: &SearchState<T>,
        pair: PairIndex,
    ) -> SmallVec<[Decision; 4]> {
        let items = state.relations().pair(pair);
        self.relation_order()
            .iter()
            .filter(|relation| {
                relation
                    .precedence(model, items)
                    .is_possible(state.domains())
            })
            .map(|relation| Decision::new(pair, relation))
            .collect()
    }
}
