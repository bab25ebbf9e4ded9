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

//! Most-constrained pair first
//!
//! Branches on the undecided pair whose two items have the smallest combined
//! domain volume, where the volume of an item is `|x| * |y|`, the number of
//! origins it can still take. Pairs of items that are already pinned down
//! are resolved first, which keeps the decisions close to the propagated
//! frontier and lets failures surface early. Ties go to the lowest pair
//! index so the search stays deterministic.

use crate::{
    branching::decision::{DecisionBuilder, RelationOrder},
    relation::PairIndex,
    state::SearchState,
};
use num_traits::{PrimInt, Signed};
use strippack_model::model::Model;

#[derive(Debug, Clone, Default)]
pub struct MostConstrainedBuilder {
    order: RelationOrder,
}

impl MostConstrainedBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_relation_order(order: RelationOrder) -> Self {
        Self { order }
    }
}

impl<T> DecisionBuilder<T> for MostConstrainedBuilder
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "MostConstrainedBuilder"
    }

    #[inline]
    fn relation_order(&self) -> RelationOrder {
        self.order
    }

    fn select_branch_pair(
        &mut self,
        _model: &Model<T>,
        state: &SearchState<T>,
    ) -> Option<PairIndex> {
        let domains = state.domains();
        // `min_by_key` keeps the first minimum, i.e. the lowest pair index.
        state
            .relations()
            .undecided()
            .min_by_key(|(_, pair)| {
                domains
                    .volume(pair.first())
                    .saturating_add(domains.volume(pair.second()))
            })
            .map(|(index, _)| index)
    }
}

impl std::fmt::Display for MostConstrainedBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MostConstrainedBuilder(order: {})", self.order)
    }
}
