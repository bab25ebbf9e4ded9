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

//! Mutable search state.
//!
//! `SearchState` bundles the two mutable parts of a search node: the
//! coordinate domains of every item and the relation variable of every item
//! pair. All mutation during search goes through the trail so it can be
//! undone; monitors and heuristics only ever see `&SearchState`.

use crate::{domain::DomainStore, relation::RelationTable};
use num_traits::{PrimInt, Signed};
use strippack_model::{
    model::{Model, ModelError},
    placement::Placement,
};

#[derive(Debug, Clone, Default)]
pub struct SearchState<T>
where
    T: PrimInt,
{
    domains: DomainStore<T>,
    relations: RelationTable,
}

impl<T> SearchState<T>
where
    T: PrimInt + Signed,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            domains: DomainStore::new(),
            relations: RelationTable::new(),
        }
    }

    /// Creates the root state of `model`: domains at their initial extent,
    /// every pair undecided.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ItemTallerThanStrip` if an item cannot fit.
    pub fn root(model: &Model<T>) -> Result<Self, ModelError> {
        let mut state = Self::new();
        state.initialize(model)?;
        Ok(state)
    }

    /// Resets this state to the root state of `model`, reusing its storage.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ItemTallerThanStrip` if an item cannot fit.
    pub fn initialize(&mut self, model: &Model<T>) -> Result<(), ModelError> {
        self.domains.initialize(model)?;
        self.relations.initialize(model.num_items());
        Ok(())
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.domains.num_items()
    }

    #[inline]
    pub fn domains(&self) -> &DomainStore<T> {
        &self.domains
    }

    #[inline]
    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    #[inline]
    pub(crate) fn domains_mut(&mut self) -> &mut DomainStore<T> {
        &mut self.domains
    }

    #[inline]
    pub(crate) fn relations_mut(&mut self) -> &mut RelationTable {
        &mut self.relations
    }

    /// Returns `true` if every relation is resolved and every domain is a point.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.relations.is_complete() && self.domains.is_fixed()
    }

    /// Converts a complete state into a placement with the given objective.
    ///
    /// Returns `None` if some domain is not a single point.
    pub fn placement(&self, objective: T) -> Option<Placement<T>> {
        if !self.domains.is_fixed() {
            return None;
        }
        let xs = self.domains.xs().iter().map(|d| d.lower()).collect();
        let ys = self.domains.ys().iter().map(|d| d.lower()).collect();
        Some(Placement::new(objective, xs, ys))
    }

    pub fn reset(&mut self) {
        self.domains.reset();
        self.relations.reset();
    }
}

impl<T> std::fmt::Display for SearchState<T>
where
    T: PrimInt + std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchState(items: {}, pairs: {}, undecided: {})",
            self.domains.num_items(),
            self.relations.num_pairs(),
            self.relations.num_undecided()
        )
    }
}
