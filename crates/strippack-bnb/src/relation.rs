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

//! Pairwise non-overlap relations.
//!
//! Two rectangles `i < j` do not overlap iff at least one of four relations
//! holds. Each relation is a precedence `before + size <= after` on a single
//! axis:
//!
//! | Relation | Constraint              | Axis | before | after | size  |
//! |----------|-------------------------|------|--------|-------|-------|
//! | `Left`   | `x_i + w_i <= x_j`      | x    | `i`    | `j`   | `w_i` |
//! | `Right`  | `x_j + w_j <= x_i`      | x    | `j`    | `i`   | `w_j` |
//! | `Above`  | `y_j + h_j <= y_i`      | y    | `j`    | `i`   | `h_j` |
//! | `Below`  | `y_i + h_i <= y_j`      | y    | `i`    | `j`   | `h_i` |
//!
//! The relation of every pair lives in a `RelationTable`, a flat vector over
//! the `n (n - 1) / 2` pairs in lexicographic `(i, j)` order.
//!
//! A model `Dependency` is a pair of static precedences of the same shape on
//! the x axis, with a size that may be zero or negative:
//! `x_p + 0 <= x_c` and `x_c + (op_cost - w_p) <= x_p`.

use crate::domain::{Axis, DomainStore};
use num_traits::{PrimInt, Signed};
use strippack_core::utils::index::{TypedIndex, TypedIndexTag};
use strippack_model::{
    index::ItemIndex,
    model::{Dependency, Model},
};

/// A tag type for pair indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PairIndexTag;

impl TypedIndexTag for PairIndexTag {
    const NAME: &'static str = "PairIndex";
}

/// Index of an unordered item pair in lexicographic `(i, j)` order.
pub type PairIndex = TypedIndex<PairIndexTag>;

/// Where the first item of a pair lies relative to the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// The first item lies entirely left of the second.
    Left,
    /// The first item lies entirely right of the second.
    Right,
    /// The first item lies entirely above the second.
    Above,
    /// The first item lies entirely below the second.
    Below,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Left,
        Relation::Right,
        Relation::Above,
        Relation::Below,
    ];

    /// Returns the precedence constraint this relation imposes on `pair`.
    #[inline]
    pub fn precedence<T>(self, model: &Model<T>, pair: ItemPair) -> Precedence<T>
    where
        T: PrimInt + Signed,
    {
        let (i, j) = (pair.first(), pair.second());
        match self {
            Relation::Left => Precedence::new(Axis::X, i, j, model.item_width(i)),
            Relation::Right => Precedence::new(Axis::X, j, i, model.item_width(j)),
            Relation::Above => Precedence::new(Axis::Y, j, i, model.item_height(j)),
            Relation::Below => Precedence::new(Axis::Y, i, j, model.item_height(i)),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Left => write!(f, "LEFT"),
            Relation::Right => write!(f, "RIGHT"),
            Relation::Above => write!(f, "ABOVE"),
            Relation::Below => write!(f, "BELOW"),
        }
    }
}

/// The relation variable of one pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PairRelation {
    #[default]
    Undecided,
    Resolved(Relation),
}

impl PairRelation {
    #[inline]
    pub fn is_undecided(&self) -> bool {
        matches!(self, PairRelation::Undecided)
    }

    #[inline]
    pub fn resolved(&self) -> Option<Relation> {
        match self {
            PairRelation::Undecided => None,
            PairRelation::Resolved(relation) => Some(*relation),
        }
    }
}

impl std::fmt::Display for PairRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairRelation::Undecided => write!(f, "UNDECIDED"),
            PairRelation::Resolved(relation) => write!(f, "{}", relation),
        }
    }
}

/// Two items with `first < second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemPair {
    first: ItemIndex,
    second: ItemIndex,
}

impl ItemPair {
    /// Creates a new `ItemPair`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `first >= second`.
    #[inline]
    pub fn new(first: ItemIndex, second: ItemIndex) -> Self {
        debug_assert!(
            first < second,
            "called `ItemPair::new` with unordered items: {} is not below {}",
            first,
            second
        );
        Self { first, second }
    }

    #[inline]
    pub fn first(&self) -> ItemIndex {
        self.first
    }

    #[inline]
    pub fn second(&self) -> ItemIndex {
        self.second
    }

    #[inline]
    pub fn contains(&self, item: ItemIndex) -> bool {
        self.first == item || self.second == item
    }
}

impl std::fmt::Display for ItemPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first.get(), self.second.get())
    }
}

/// The difference constraint `before + size <= after` on one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Precedence<T> {
    axis: Axis,
    before: ItemIndex,
    after: ItemIndex,
    size: T,
}

impl<T> Precedence<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new(axis: Axis, before: ItemIndex, after: ItemIndex, size: T) -> Self {
        Self {
            axis,
            before,
            after,
            size,
        }
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    #[inline]
    pub fn before(&self) -> ItemIndex {
        self.before
    }

    #[inline]
    pub fn after(&self) -> ItemIndex {
        self.after
    }

    #[inline]
    pub fn size(&self) -> T {
        self.size
    }

    /// The two x-axis precedences that `dependency` imposes: the producer
    /// starts no later than the consumer, and outlives the consumer's
    /// operation.
    #[inline]
    pub fn from_dependency(model: &Model<T>, dependency: &Dependency<T>) -> [Self; 2] {
        let (producer, consumer) = (dependency.producer(), dependency.consumer());
        [
            Self::new(Axis::X, producer, consumer, T::zero()),
            Self::new(
                Axis::X,
                consumer,
                producer,
                dependency.op_cost() - model.item_width(producer),
            ),
        ]
    }

    /// Returns `true` if some values of the current domains satisfy the constraint.
    #[inline]
    pub fn is_possible(&self, domains: &DomainStore<T>) -> bool {
        let before = domains.domain(self.axis, self.before);
        let after = domains.domain(self.axis, self.after);
        before.lower() + self.size <= after.upper()
    }

    /// Returns `true` if every value of the current domains satisfies the constraint.
    #[inline]
    pub fn is_entailed(&self, domains: &DomainStore<T>) -> bool {
        let before = domains.domain(self.axis, self.before);
        let after = domains.domain(self.axis, self.after);
        before.upper() + self.size <= after.lower()
    }

    /// The bounds that make the domains consistent with the constraint:
    /// `(after.lower >= before.lower + size, before.upper <= after.upper - size)`.
    #[inline]
    pub fn required_bounds(&self, domains: &DomainStore<T>) -> (T, T) {
        let before = domains.domain(self.axis, self.before);
        let after = domains.domain(self.axis, self.after);
        (before.lower() + self.size, after.upper() - self.size)
    }
}

impl<T> std::fmt::Display for Precedence<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{} + {} <= {}_{}",
            self.axis,
            self.before.get(),
            self.size,
            self.axis,
            self.after.get()
        )
    }
}

/// The relation variables of all pairs of a model.
#[derive(Clone, Debug, Default)]
pub struct RelationTable {
    pairs: Vec<ItemPair>,
    relations: Vec<PairRelation>,
    num_items: usize,
    num_undecided: usize,
}

impl RelationTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the table to `num_items` items with every pair undecided.
    pub fn initialize(&mut self, num_items: usize) {
        if self.num_items != num_items || self.pairs.is_empty() {
            self.pairs.clear();
            for i in ItemIndex::range(num_items) {
                for j in ItemIndex::range(num_items).skip(i.get() + 1) {
                    self.pairs.push(ItemPair::new(i, j));
                }
            }
            self.num_items = num_items;
        }
        self.relations.clear();
        self.relations
            .resize(self.pairs.len(), PairRelation::Undecided);
        self.num_undecided = self.pairs.len();
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn num_undecided(&self) -> usize {
        self.num_undecided
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.num_undecided == 0
    }

    /// Returns the index of the pair `{a, b}`, in either order.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `a == b` or either item is out of bounds.
    #[inline]
    pub fn pair_index(&self, a: ItemIndex, b: ItemIndex) -> PairIndex {
        let (i, j) = if a < b {
            (a.get(), b.get())
        } else {
            (b.get(), a.get())
        };
        debug_assert!(
            i != j && j < self.num_items,
            "called `RelationTable::pair_index` with invalid items: ({}, {}) for {} items",
            i,
            j,
            self.num_items
        );
        // Pairs starting before row `i`: i*n - i*(i+1)/2.
        PairIndex::new(i * self.num_items - i * (i + 1) / 2 + (j - i - 1))
    }

    #[inline]
    pub fn pair(&self, pair_index: PairIndex) -> ItemPair {
        let index = pair_index.get();
        debug_assert!(
            index < self.num_pairs(),
            "called `RelationTable::pair` with pair index out of bounds: the len is {} but the index is {}",
            self.num_pairs(),
            index
        );
        self.pairs[index]
    }

    #[inline]
    pub fn relation(&self, pair_index: PairIndex) -> PairRelation {
        let index = pair_index.get();
        debug_assert!(
            index < self.num_pairs(),
            "called `RelationTable::relation` with pair index out of bounds: the len is {} but the index is {}",
            self.num_pairs(),
            index
        );
        self.relations[index]
    }

    #[inline]
    pub(crate) fn set(&mut self, pair_index: PairIndex, relation: PairRelation) {
        let index = pair_index.get();
        debug_assert!(
            index < self.num_pairs(),
            "called `RelationTable::set` with pair index out of bounds: the len is {} but the index is {}",
            self.num_pairs(),
            index
        );
        let previous = std::mem::replace(&mut self.relations[index], relation);
        match (previous.is_undecided(), relation.is_undecided()) {
            (true, false) => self.num_undecided -= 1,
            (false, true) => self.num_undecided += 1,
            _ => {}
        }
    }

    /// Iterates over all pairs with their current relation.
    pub fn iter(&self) -> impl Iterator<Item = (PairIndex, ItemPair, PairRelation)> + '_ {
        self.pairs
            .iter()
            .zip(&self.relations)
            .enumerate()
            .map(|(k, (&pair, &relation))| (PairIndex::new(k), pair, relation))
    }

    /// Iterates over the pairs that are still undecided.
    pub fn undecided(&self) -> impl Iterator<Item = (PairIndex, ItemPair)> + '_ {
        self.iter()
            .filter(|(_, _, relation)| relation.is_undecided())
            .map(|(index, pair, _)| (index, pair))
    }

    #[inline]
    pub fn reset(&mut self) {
        self.relations.clear();
        self.num_undecided = 0;
    }
}

impl std::fmt::Display for RelationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RelationTable(pairs: {}, undecided: {})",
            self.num_pairs(),
            self.num_undecided
        )
    }
}
