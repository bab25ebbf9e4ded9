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

//! Used-width (makespan) evaluator.
//!
//! The objective of a placement is `max_i (x_i + w_i)`. Every item starts no
//! earlier than the lower bound of its x domain, so `max_i (x_i.lower + w_i)`
//! bounds it from below at every node. Before search, the width of the
//! widest item and the area bound `ceil(sum_i w_i * h_i / H)` also hold.

use crate::{eval::evaluator::ObjectiveEvaluator, state::SearchState};
use num_traits::{NumCast, PrimInt, Signed};
use strippack_model::model::Model;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MakespanEvaluator;

impl MakespanEvaluator {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl<T> ObjectiveEvaluator<T> for MakespanEvaluator
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "MakespanEvaluator"
    }

    fn static_lower_bound(&self, model: &Model<T>) -> T {
        let widest = model
            .widths()
            .iter()
            .copied()
            .max()
            .unwrap_or_else(T::zero);

        // The area sum is carried in i128 so it cannot overflow for any T
        // up to i64.
        let strip_height = model.strip_height().to_i128().unwrap_or(i128::MAX);
        let area = model.total_area();
        let area_bound = if strip_height > 0 {
            (area + strip_height - 1) / strip_height
        } else {
            0
        };
        let area_bound = <T as NumCast>::from(area_bound).unwrap_or_else(T::max_value);

        widest.max(area_bound)
    }

    #[inline]
    fn lower_bound(&mut self, model: &Model<T>, state: &SearchState<T>) -> T {
        state
            .domains()
            .xs()
            .iter()
            .zip(model.widths())
            .map(|(x, &w)| x.lower() + w)
            .max()
            .unwrap_or_else(T::zero)
    }

    fn evaluate(&mut self, model: &Model<T>, state: &SearchState<T>) -> Option<T> {
        let mut objective = T::zero();
        for (x, &w) in state.domains().xs().iter().zip(model.widths()) {
            if !x.is_singleton() {
                return None;
            }
            objective = objective.max(x.lower() + w);
        }
        Some(objective)
    }
}

impl std::fmt::Display for MakespanEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MakespanEvaluator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::Axis, trail::SearchTrail};
    use strippack_model::index::ItemIndex;

    fn scenario_c() -> Model<i64> {
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

    #[test]
    fn test_static_lower_bound_uses_area_and_widest_item() {
        let model = scenario_c();
        let evaluator = MakespanEvaluator::new();
        // area 201 over height 10
        assert_eq!(evaluator.static_lower_bound(&model), 21);
        assert_eq!(evaluator.trivial_upper_bound(&model), 44);

        let wide = Model::<i64>::from_dimensions(10, &[(9, 1), (1, 1)]).unwrap();
        assert_eq!(evaluator.static_lower_bound(&wide), 9);
    }

    #[test]
    fn test_static_lower_bound_in_narrow_type() {
        let model = Model::<i16>::from_dimensions(3, &[(2, 3), (2, 3), (1, 1)]).unwrap();
        // area 13 over height 3 rounds up to 5
        assert_eq!(MakespanEvaluator.static_lower_bound(&model), 5);
    }

    #[test]
    fn test_lower_bound_is_monotone_under_narrowing() {
        let model = scenario_c();
        let mut state = SearchState::root(&model).unwrap();
        let mut trail = SearchTrail::new();
        let mut evaluator = MakespanEvaluator::new();

        let mut previous = evaluator.lower_bound(&model, &state);
        assert_eq!(previous, 8);
        for (item, lower) in [(3, 5), (8, 2), (6, 20), (0, 30)] {
            trail
                .narrow(&mut state, Axis::X, ItemIndex::new(item), lower, i64::MAX)
                .unwrap();
            let bound = evaluator.lower_bound(&model, &state);
            assert!(bound >= previous);
            previous = bound;
        }
        assert_eq!(previous, 31);
    }

    #[test]
    fn test_evaluate_requires_fixed_x() {
        let model = Model::<i64>::from_dimensions(5, &[(2, 5), (3, 5)]).unwrap();
        let mut state = SearchState::root(&model).unwrap();
        let mut trail = SearchTrail::new();
        let mut evaluator = MakespanEvaluator::new();
        assert_eq!(evaluator.evaluate(&model, &state), None);

        trail
            .narrow(&mut state, Axis::X, ItemIndex::new(0), 0, 0)
            .unwrap();
        trail
            .narrow(&mut state, Axis::X, ItemIndex::new(1), 2, 2)
            .unwrap();
        assert_eq!(evaluator.evaluate(&model, &state), Some(5));
    }
}
