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

//! Undo log for in-place search.
//!
//! Every mutation of the `SearchState` during search goes through
//! `SearchTrail`, which records the overwritten value before applying the
//! change. Entries are grouped into frames, one per search node; popping a
//! frame restores the state the node was entered with. Only fields that
//! actually changed are recorded, so the cost of a backtrack is proportional
//! to the work done below it.
//!
//! `snapshot` and `restore` expose the same mechanism without frames, for
//! callers that inspect a state and roll it back.

#![allow(dead_code)]

use crate::{
    domain::{Axis, EmptyDomain},
    relation::{PairIndex, PairRelation, Relation},
    state::SearchState,
};
use num_traits::{PrimInt, Signed};
use strippack_core::math::interval::ClosedInterval;
use strippack_model::index::ItemIndex;

/// A recorded change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrailEntry<T>
where
    T: PrimInt,
{
    /// A domain was narrowed; `previous` is the interval before.
    Domain {
        item: ItemIndex,
        axis: Axis,
        previous: ClosedInterval<T>,
    },
    /// An undecided pair was resolved.
    Relation { pair: PairIndex },
}

/// Position in the trail returned by `SearchTrail::snapshot`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrailMark(usize);

/// Undo log of every domain narrowing and relation resolution, grouped
/// into frames that match the search depth.
#[derive(Debug, Clone)]
pub struct SearchTrail<T>
where
    T: PrimInt,
{
    entries: Vec<TrailEntry<T>>,
    frames: Vec<usize>,
}

impl<T> Default for SearchTrail<T>
where
    T: PrimInt + Signed,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SearchTrail<T>
where
    T: PrimInt + Signed,
{
    /// Creates a new empty `SearchTrail`.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Creates a trail sized for a model with `num_items` items.
    ///
    /// A full descent resolves every pair once and fixes both coordinates
    /// of every item, so `pairs + 2 * items` entries are reserved up front;
    /// propagation may still push more.
    #[inline]
    pub fn preallocated(num_items: usize) -> Self {
        let mut trail = Self::new();
        trail.ensure_capacity(num_items);
        trail
    }

    /// Grows the buffers to the sizes `preallocated` would choose.
    pub fn ensure_capacity(&mut self, num_items: usize) {
        let num_pairs = num_items * num_items.saturating_sub(1) / 2;
        let entry_capacity = num_pairs.saturating_add(2 * num_items);
        let frame_capacity = num_pairs.saturating_add(1);
        if self.entries.capacity() < entry_capacity {
            self.entries.reserve(entry_capacity - self.entries.len());
        }
        if self.frames.capacity() < frame_capacity {
            self.frames.reserve(frame_capacity - self.frames.len());
        }
    }

    /// Returns the number of recorded changes.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of open frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.entries.is_empty()
    }

    /// Opens a new frame at the current trail position.
    #[inline]
    pub fn push_frame(&mut self) {
        self.frames.push(self.entries.len());
    }

    /// Narrows a domain and records its previous value.
    ///
    /// Returns `true` if the domain changed.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDomain` if the narrowing would empty the domain; the
    /// state is unchanged and nothing is recorded.
    #[inline]
    pub fn narrow(
        &mut self,
        state: &mut SearchState<T>,
        axis: Axis,
        item: ItemIndex,
        lower: T,
        upper: T,
    ) -> Result<bool, EmptyDomain> {
        match state.domains_mut().narrow(axis, item, lower, upper)? {
            Some(previous) => {
                self.entries.push(TrailEntry::Domain {
                    item,
                    axis,
                    previous,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolves `pair` to `relation` and records it.
    ///
    /// Returns `true` if the pair was undecided. Resolving a pair to the
    /// relation it already has is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EmptyDomain` if the pair is already resolved to a different
    /// relation: no relation value is left for it.
    #[inline]
    pub fn resolve(
        &mut self,
        state: &mut SearchState<T>,
        pair: PairIndex,
        relation: Relation,
    ) -> Result<bool, EmptyDomain> {
        match state.relations().relation(pair) {
            PairRelation::Undecided => {
                state
                    .relations_mut()
                    .set(pair, PairRelation::Resolved(relation));
                self.entries.push(TrailEntry::Relation { pair });
                Ok(true)
            }
            PairRelation::Resolved(current) if current == relation => Ok(false),
            PairRelation::Resolved(_) => Err(EmptyDomain),
        }
    }

    /// Fixes every coordinate to the lower bound of its domain.
    pub fn fix_at_lower(&mut self, state: &mut SearchState<T>) {
        for item in ItemIndex::range(state.num_items()) {
            for axis in [Axis::X, Axis::Y] {
                let lower = state.domains().domain(axis, item).lower();
                // Narrowing to a value inside the domain cannot fail.
                let _ = self.narrow(state, axis, item, lower, lower);
            }
        }
    }

    /// Returns the current trail position.
    #[inline]
    pub fn snapshot(&self) -> TrailMark {
        TrailMark(self.entries.len())
    }

    /// Undoes every change recorded after `mark`.
    pub fn restore(&mut self, state: &mut SearchState<T>, mark: TrailMark) {
        while self.entries.len() > mark.0 {
            if let Some(entry) = self.entries.pop() {
                Self::undo(state, entry);
            }
        }
    }

    /// Pops the innermost frame and undoes its changes.
    pub fn backtrack(&mut self, state: &mut SearchState<T>) {
        if let Some(start) = self.frames.pop() {
            self.restore(state, TrailMark(start));
        }
    }

    /// Undoes every recorded change and drops all frames.
    pub fn clear(&mut self, state: &mut SearchState<T>) {
        self.restore(state, TrailMark(0));
        self.frames.clear();
    }

    /// Forgets all entries and frames without touching any state.
    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
        self.frames.clear();
    }

    /// Returns the heap memory held by the buffers, in bytes.
    #[inline]
    pub fn allocated_memory_bytes(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<TrailEntry<T>>()
            + self.frames.capacity() * std::mem::size_of::<usize>()
    }

    #[inline]
    fn undo(state: &mut SearchState<T>, entry: TrailEntry<T>) {
        match entry {
            TrailEntry::Domain {
                item,
                axis,
                previous,
            } => state.domains_mut().set(axis, item, previous),
            TrailEntry::Relation { pair } => {
                state.relations_mut().set(pair, PairRelation::Undecided)
            }
        }
    }
}

impl<T> std::fmt::Display for SearchTrail<T>
where
    T: PrimInt,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchTrail(entries: {}, frames: {})",
            self.entries.len(),
            self.frames.len()
        )
    }
}
