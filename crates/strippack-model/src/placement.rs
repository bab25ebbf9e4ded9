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

use crate::{index::ItemIndex, model::Model};
use num_traits::{PrimInt, Signed};

/// Why a placement does not solve its model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementViolation {
    #[error("placement has {positions} positions but the model has {items} items")]
    LengthMismatch { positions: usize, items: usize },
    #[error("{item} has a negative coordinate")]
    NegativeCoordinate { item: ItemIndex },
    #[error("{item} extends beyond the strip height")]
    OutOfStrip { item: ItemIndex },
    #[error("{a} and {b} overlap")]
    Overlap { a: ItemIndex, b: ItemIndex },
    #[error("{consumer} violates its dependency on {producer}")]
    DependencyViolated {
        producer: ItemIndex,
        consumer: ItemIndex,
    },
    #[error("reported objective {reported} differs from the actual used width {actual}")]
    ObjectiveMismatch { reported: i64, actual: i64 },
}

/// Concrete origins for every item together with the used strip width.
///
/// Stored as a Structure of Arrays indexed by `ItemIndex`: `xs[i]` and
/// `ys[i]` are the lower left corner of item `i`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement<T> {
    objective: T,
    xs: Vec<T>,
    ys: Vec<T>,
}

impl<T> Placement<T>
where
    T: PrimInt + Signed,
{
    /// Creates a new `Placement`.
    ///
    /// # Panics
    ///
    /// Panics if `xs` and `ys` have different lengths.
    pub fn new(objective: T, xs: Vec<T>, ys: Vec<T>) -> Self {
        assert_eq!(
            xs.len(),
            ys.len(),
            "called `Placement::new` with inconsistent vector lengths: xs.len() = {}, ys.len() = {}",
            xs.len(),
            ys.len()
        );
        Self { objective, xs, ys }
    }

    /// Creates a placement whose objective is recomputed from the origins.
    pub fn from_origins(model: &Model<T>, xs: Vec<T>, ys: Vec<T>) -> Self {
        let objective = used_width(model, &xs);
        Self::new(objective, xs, ys)
    }

    /// Places every item side by side at `y = 0`, in input order.
    ///
    /// This layout has objective `model.total_width()` and is feasible
    /// whenever every item fits the strip and the model has no dependencies.
    pub fn side_by_side(model: &Model<T>) -> Self {
        let mut xs = Vec::with_capacity(model.num_items());
        let mut cursor = T::zero();
        for &w in model.widths() {
            xs.push(cursor);
            cursor = cursor + w;
        }
        Self::new(cursor, xs, vec![T::zero(); model.num_items()])
    }

    #[inline]
    pub fn objective(&self) -> T {
        self.objective
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Returns the origin `(x, y)` of the item at `item_index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `item_index` is out of bounds.
    #[inline]
    pub fn position(&self, item_index: ItemIndex) -> (T, T) {
        let index = item_index.get();
        debug_assert!(
            index < self.num_items(),
            "called `Placement::position` with item index out of bounds: the len is {} but the index is {}",
            self.num_items(),
            index
        );
        (self.xs[index], self.ys[index])
    }

    /// Iterates over all origins in input order.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = (T, T)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Checks the placement against `model` without trusting the solver.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: a length mismatch, a negative
    /// coordinate, an item above the strip, an overlapping pair (lowest
    /// indices first), a violated dependency, or an objective that is not
    /// the used width.
    pub fn validate(&self, model: &Model<T>) -> Result<(), PlacementViolation> {
        let n = model.num_items();
        if self.num_items() != n {
            return Err(PlacementViolation::LengthMismatch {
                positions: self.num_items(),
                items: n,
            });
        }

        let h = model.strip_height();
        for i in ItemIndex::range(n) {
            let (x, y) = self.position(i);
            if x < T::zero() || y < T::zero() {
                return Err(PlacementViolation::NegativeCoordinate { item: i });
            }
            if y + model.item_height(i) > h {
                return Err(PlacementViolation::OutOfStrip { item: i });
            }
        }

        for a in ItemIndex::range(n) {
            for b in ItemIndex::range(n).skip(a.get() + 1) {
                if self.overlaps(model, a, b) {
                    return Err(PlacementViolation::Overlap { a, b });
                }
            }
        }

        for dependency in model.dependencies() {
            let (producer, consumer) = (dependency.producer(), dependency.consumer());
            let (xp, _) = self.position(producer);
            let (xc, _) = self.position(consumer);
            if xp > xc || xc + dependency.op_cost() > xp + model.item_width(producer) {
                return Err(PlacementViolation::DependencyViolated { producer, consumer });
            }
        }

        let actual = used_width(model, &self.xs);
        if actual != self.objective {
            return Err(PlacementViolation::ObjectiveMismatch {
                reported: self.objective.to_i64().unwrap_or(i64::MAX),
                actual: actual.to_i64().unwrap_or(i64::MAX),
            });
        }
        Ok(())
    }

    /// Returns `true` if the interiors of items `a` and `b` intersect.
    fn overlaps(&self, model: &Model<T>, a: ItemIndex, b: ItemIndex) -> bool {
        let (xa, ya) = self.position(a);
        let (xb, yb) = self.position(b);
        let separated = xa + model.item_width(a) <= xb
            || xb + model.item_width(b) <= xa
            || ya + model.item_height(a) <= yb
            || yb + model.item_height(b) <= ya;
        !separated
    }

    /// Renders the placement together with the item sizes of `model`.
    pub fn report<'a>(&'a self, model: &'a Model<T>) -> PlacementReport<'a, T> {
        PlacementReport {
            placement: self,
            model,
        }
    }
}

/// The maximum right edge over all items.
fn used_width<T>(model: &Model<T>, xs: &[T]) -> T
where
    T: PrimInt + Signed,
{
    xs.iter()
        .zip(model.widths())
        .map(|(&x, &w)| x + w)
        .fold(T::zero(), std::cmp::max)
}

fn write_pairs<T, I>(f: &mut std::fmt::Formatter<'_>, label: &str, pairs: I) -> std::fmt::Result
where
    T: std::fmt::Display,
    I: Iterator<Item = (T, T)>,
{
    write!(f, "{} = [", label)?;
    for (k, (a, b)) in pairs.enumerate() {
        if k > 0 {
            write!(f, ", ")?;
        }
        write!(f, "[{}, {}]", a, b)?;
    }
    write!(f, "]")
}

impl<T> std::fmt::Display for Placement<T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total_time = {}", self.objective)?;
        write_pairs(f, "positions", self.positions())
    }
}

/// `Display` adapter printing a placement in the instance output format:
///
/// ```text
/// total_time = 5
/// positions = [[0, 0], [3, 0]]
/// sizes = [[3, 4], [2, 7]]
/// dep_info = [[1, 2]]
/// ```
///
/// The `dep_info` line lists every dependency as `[producer, consumer]`
/// with one-based item numbers. It is omitted when the model has none.
pub struct PlacementReport<'a, T>
where
    T: PrimInt + Signed,
{
    placement: &'a Placement<T>,
    model: &'a Model<T>,
}

impl<T> std::fmt::Display for PlacementReport<'_, T>
where
    T: PrimInt + Signed + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.placement)?;
        let sizes = self
            .model
            .widths()
            .iter()
            .copied()
            .zip(self.model.heights().iter().copied());
        write_pairs(f, "sizes", sizes)?;

        if self.model.has_dependencies() {
            writeln!(f)?;
            let dependencies = self
                .model
                .dependencies()
                .iter()
                .map(|d| (d.producer().get() + 1, d.consumer().get() + 1));
            write_pairs(f, "dep_info", dependencies)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;

    fn model(h: i64, dims: &[(i64, i64)]) -> Model<i64> {
        Model::from_dimensions(h, dims).unwrap()
    }

    fn item(i: usize) -> ItemIndex {
        ItemIndex::new(i)
    }

    #[test]
    fn test_accessors() {
        let p = Placement::new(5i64, vec![0, 3], vec![1, 2]);
        assert_eq!(p.objective(), 5);
        assert_eq!(p.num_items(), 2);
        assert_eq!(p.position(item(1)), (3, 2));
        assert_eq!(p.positions().collect::<Vec<_>>(), vec![(0, 1), (3, 2)]);
    }

    #[test]
    #[should_panic(expected = "inconsistent vector lengths")]
    fn test_new_panics_on_length_mismatch() {
        let _ = Placement::new(1i64, vec![0], vec![]);
    }

    #[test]
    fn test_side_by_side_is_valid() {
        let m = model(10, &[(3, 4), (2, 7), (4, 10)]);
        let p = Placement::side_by_side(&m);
        assert_eq!(p.xs(), &[0, 3, 5]);
        assert_eq!(p.objective(), m.total_width());
        assert_eq!(p.validate(&m), Ok(()));
    }

    #[test]
    fn test_from_origins_recomputes_objective() {
        let m = model(10, &[(3, 4), (2, 6)]);
        let p = Placement::from_origins(&m, vec![0, 0], vec![0, 4]);
        assert_eq!(p.objective(), 3);
        assert_eq!(p.validate(&m), Ok(()));
    }

    #[test]
    fn test_validate_detects_overlap() {
        let m = model(10, &[(3, 4), (2, 6)]);
        let p = Placement::new(3i64, vec![0, 1], vec![0, 3]);
        assert_eq!(
            p.validate(&m),
            Err(PlacementViolation::Overlap {
                a: item(0),
                b: item(1)
            })
        );
    }

    #[test]
    fn test_validate_accepts_touching_edges() {
        let m = model(4, &[(2, 2), (2, 2), (2, 2)]);
        let p = Placement::new(4i64, vec![0, 2, 0], vec![0, 0, 2]);
        assert_eq!(p.validate(&m), Ok(()));
    }

    #[test]
    fn test_validate_detects_strip_and_sign_violations() {
        let m = model(5, &[(1, 3)]);
        assert_eq!(
            Placement::new(1i64, vec![0], vec![3]).validate(&m),
            Err(PlacementViolation::OutOfStrip { item: item(0) })
        );
        assert_eq!(
            Placement::new(0i64, vec![-1], vec![0]).validate(&m),
            Err(PlacementViolation::NegativeCoordinate { item: item(0) })
        );
    }

    #[test]
    fn test_validate_detects_objective_and_length_mismatch() {
        let m = model(5, &[(2, 3), (1, 1)]);
        assert_eq!(
            Placement::new(7i64, vec![0, 2], vec![0, 0]).validate(&m),
            Err(PlacementViolation::ObjectiveMismatch {
                reported: 7,
                actual: 3
            })
        );
        assert_eq!(
            Placement::new(2i64, vec![0], vec![0]).validate(&m),
            Err(PlacementViolation::LengthMismatch {
                positions: 1,
                items: 2
            })
        );
    }

    fn dependent_model() -> Model<i64> {
        // Item 1 reads item 0 during its first two units.
        let mut builder = ModelBuilder::new(10);
        let producer = builder.add_item(4, 3);
        let consumer = builder.add_item(2, 5);
        builder.add_dependency(producer, consumer, 2);
        builder.build().unwrap()
    }

    #[test]
    fn test_validate_checks_dependencies() {
        let m = dependent_model();
        // Stacked, consumer starts inside the producer's lifetime.
        assert_eq!(Placement::new(4i64, vec![0, 2], vec![0, 3]).validate(&m), Ok(()));
        assert_eq!(Placement::new(5i64, vec![1, 2], vec![0, 3]).validate(&m), Ok(()));

        let violation = Err(PlacementViolation::DependencyViolated {
            producer: item(0),
            consumer: item(1),
        });
        // Consumer starts before its producer.
        assert_eq!(Placement::new(5i64, vec![1, 0], vec![0, 3]).validate(&m), violation);
        // Producer ends before the consumer's operation does.
        assert_eq!(Placement::new(5i64, vec![0, 3], vec![0, 3]).validate(&m), violation);
        // Side by side is no longer feasible.
        assert_eq!(Placement::side_by_side(&m).validate(&m), violation);
    }

    #[test]
    fn test_report_lists_dependencies_one_based() {
        let m = dependent_model();
        let p = Placement::new(4i64, vec![0, 2], vec![0, 3]);
        assert_eq!(
            format!("{}", p.report(&m)),
            "total_time = 4\npositions = [[0, 0], [2, 3]]\nsizes = [[4, 3], [2, 5]]\ndep_info = [[1, 2]]"
        );
    }

    #[test]
    fn test_report_format() {
        let m = model(10, &[(3, 4), (2, 7)]);
        let p = Placement::new(5i64, vec![0, 3], vec![0, 0]);
        assert_eq!(
            format!("{}", p.report(&m)),
            "total_time = 5\npositions = [[0, 0], [3, 0]]\nsizes = [[3, 4], [2, 7]]"
        );
        assert_eq!(
            format!("{}", p),
            "total_time = 5\npositions = [[0, 0], [3, 0]]"
        );
    }
}
