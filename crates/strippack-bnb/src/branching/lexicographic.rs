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

//! Lexicographic pair selection
//!
//! Branches on the undecided pair with the lowest index, i.e. `(0, 1)`,
//! `(0, 2)`, ... in row-major order. Cheap and fully predictable; mostly
//! useful as a baseline against `MostConstrainedBuilder`.

use crate::{
    branching::decision::{DecisionBuilder, RelationOrder},
    relation::PairIndex,
    state::SearchState,
};
use num_traits::{PrimInt, Signed};
use strippack_model::model::Model;

#[derive(Debug, Clone, Default)]
pub struct LexicographicBuilder {
    order: RelationOrder,
}

impl LexicographicBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_relation_order(order: RelationOrder) -> Self {
        Self { order }
    }
}

impl<T> DecisionBuilder<T> for LexicographicBuilder
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "LexicographicBuilder"
    }

    #[inline]
    fn relation_order(&self) -> RelationOrder {
        self.order
    }

    #[inline]
    fn select_branch_pair(
        &mut self,
        _model: &Model<T>,
        state: &SearchState<T>,
    ) -> Option<PairIndex> {
        state.relations().undecided().map(|(index, _)| index).next()
    }
}

impl std::fmt::Display for LexicographicBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LexicographicBuilder(order: {})", self.order)
    }
}
