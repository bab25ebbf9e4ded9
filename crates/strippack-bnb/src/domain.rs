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

//! Geometry and domain store.
//!
//! Every item owns two closed integer intervals: the admissible values of
//! its x origin and of its y origin. The store is an arena indexed by
//! `ItemIndex` (Structure of Arrays, one vector per axis). It only ever
//! narrows; widening happens exclusively when the trail restores a previous
//! interval on backtrack.
//!
//! After `initialize` the following hold for every item `i` and keep
//! holding for the rest of the search, because narrowing is an intersection:
//! - `x(i).lower >= 0` and `x(i).upper <= total_width - w_i`
//! - `y(i).lower >= 0` and `y(i).upper + h_i <= strip_height`

use num_traits::{PrimInt, Signed};
use strippack_core::math::interval::ClosedInterval;
use strippack_model::{
    index::ItemIndex,
    model::{Model, ModelError},
};

/// A coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Horizontal, the direction of the objective.
    X,
    /// Vertical, bounded by the strip height.
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Marker error: a narrowing left a domain without values.
///
/// This is local infeasibility. The search engine recovers from it by
/// pruning the current node; it never reaches the caller of a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, thiserror::Error)]
#[error("domain became empty")]
pub struct EmptyDomain;

/// Per-item x and y domains.
#[derive(Clone, Debug, Default)]
pub struct DomainStore<T>
where
    T: PrimInt,
{
    xs: Vec<ClosedInterval<T>>,
    ys: Vec<ClosedInterval<T>>,
}

impl<T> DomainStore<T>
where
    T: PrimInt,
{
    /// Returns the number of items whose domains are stored.
    #[inline]
    pub fn num_items(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T> DomainStore<T>
where
    T: PrimInt + Signed,
{
    /// Creates an empty store; `initialize` sizes it for a model.
    #[inline]
    pub fn new() -> Self {
        Self {
            xs: Vec::new(),
            ys: Vec::new(),
        }
    }

    /// Creates an empty store with room for `num_items` items.
    #[inline]
    pub fn preallocated(num_items: usize) -> Self {
        Self {
            xs: Vec::with_capacity(num_items),
            ys: Vec::with_capacity(num_items),
        }
    }

    /// Resets every domain to its initial extent for `model`:
    /// `x(i) = [0, total_width - w_i]` and `y(i) = [0, strip_height - h_i]`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ItemTallerThanStrip` if an item cannot fit the
    /// strip vertically; the store is left empty in that case.
    pub fn initialize(&mut self, model: &Model<T>) -> Result<(), ModelError> {
        self.xs.clear();
        self.ys.clear();

        let total_width = model.total_width();
        let strip_height = model.strip_height();
        for item in model.items() {
            let y = match ClosedInterval::try_new(T::zero(), strip_height - item.height()) {
                Some(y) => y,
                None => {
                    self.xs.clear();
                    self.ys.clear();
                    return Err(ModelError::ItemTallerThanStrip {
                        item: item.index(),
                        height: item.height().to_i64().unwrap_or(i64::MAX),
                        strip_height: strip_height.to_i64().unwrap_or(i64::MAX),
                    });
                }
            };
            // total_width >= w_i because widths are positive.
            self.xs
                .push(ClosedInterval::new(T::zero(), total_width - item.width()));
            self.ys.push(y);
        }
        Ok(())
    }

    /// Returns the x domain of `item_index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `item_index` is out of bounds.
    #[inline]
    pub fn x(&self, item_index: ItemIndex) -> ClosedInterval<T> {
        self.domain(Axis::X, item_index)
    }

    /// Returns the y domain of `item_index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `item_index` is out of bounds.
    #[inline]
    pub fn y(&self, item_index: ItemIndex) -> ClosedInterval<T> {
        self.domain(Axis::Y, item_index)
    }

    /// Returns the domain of `item_index` on `axis`.
    #[inline]
    pub fn domain(&self, axis: Axis, item_index: ItemIndex) -> ClosedInterval<T> {
        let index = item_index.get();
        debug_assert!(
            index < self.num_items(),
            "called `DomainStore::domain` with item index out of bounds: the len is {} but the index is {}",
            self.num_items(),
            index
        );
        match axis {
            Axis::X => self.xs[index],
            Axis::Y => self.ys[index],
        }
    }

    /// Returns all x domains in item order.
    #[inline]
    pub fn xs(&self) -> &[ClosedInterval<T>] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[ClosedInterval<T>] {
        &self.ys
    }

    /// Intersects the x domain of `item_index` with `[lower, upper]`.
    ///
    /// Returns the previous interval if the domain shrank, `None` if it was
    /// already contained in the bounds.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDomain` if the intersection is empty. The domain is
    /// left untouched in that case.
    #[inline]
    pub fn narrow_x(
        &mut self,
        item_index: ItemIndex,
        lower: T,
        upper: T,
    ) -> Result<Option<ClosedInterval<T>>, EmptyDomain> {
        self.narrow(Axis::X, item_index, lower, upper)
    }

    /// Intersects the y domain of `item_index` with `[lower, upper]`.
    ///
    /// See `narrow_x` for the return value.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDomain` if the intersection is empty.
    #[inline]
    pub fn narrow_y(
        &mut self,
        item_index: ItemIndex,
        lower: T,
        upper: T,
    ) -> Result<Option<ClosedInterval<T>>, EmptyDomain> {
        self.narrow(Axis::Y, item_index, lower, upper)
    }

    /// Intersects the domain of `item_index` on `axis` with `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDomain` if the intersection is empty.
    pub fn narrow(
        &mut self,
        axis: Axis,
        item_index: ItemIndex,
        lower: T,
        upper: T,
    ) -> Result<Option<ClosedInterval<T>>, EmptyDomain> {
        let current = self.domain(axis, item_index);
        let narrowed = current.restrict(lower, upper).ok_or(EmptyDomain)?;
        if narrowed == current {
            return Ok(None);
        }
        self.set(axis, item_index, narrowed);
        Ok(Some(current))
    }

    /// Overwrites a domain. Used by the trail to restore previous values.
    #[inline]
    pub(crate) fn set(&mut self, axis: Axis, item_index: ItemIndex, interval: ClosedInterval<T>) {
        let index = item_index.get();
        debug_assert!(
            index < self.num_items(),
            "called `DomainStore::set` with item index out of bounds: the len is {} but the index is {}",
            self.num_items(),
            index
        );
        match axis {
            Axis::X => self.xs[index] = interval,
            Axis::Y => self.ys[index] = interval,
        }
    }

    /// Returns `true` if every domain is a single point.
    pub fn is_fixed(&self) -> bool {
        self.xs.iter().chain(&self.ys).all(|d| d.is_singleton())
    }

    /// Returns the number of points in `x(i) × y(i)`, saturating.
    #[inline]
    pub fn volume(&self, item_index: ItemIndex) -> u128 {
        let x = self.x(item_index).num_points() as u128;
        let y = self.y(item_index).num_points() as u128;
        x.saturating_mul(y)
    }

    /// Drops every domain but keeps the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.xs.clear();
        self.ys.clear();
    }

    /// Reserves room for at least `num_items` items.
    #[inline]
    pub fn ensure_capacity(&mut self, num_items: usize) {
        self.xs.reserve(num_items.saturating_sub(self.xs.len()));
        self.ys.reserve(num_items.saturating_sub(self.ys.len()));
    }
}

impl<T> std::fmt::Display for DomainStore<T>
where
    T: PrimInt + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DomainStore(items: {})", self.xs.len())
    }
}
