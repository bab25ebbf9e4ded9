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

//! Decision stack with per-node frames.
//!
//! Each search node opens a frame and pushes the decisions of its children.
//! Decisions are pushed in reverse exploration order so that `pop` yields
//! the first child first. Popping a frame drops whatever children of that
//! node were not explored.

#![allow(dead_code)]

use crate::branching::decision::Decision;

/// Pending decisions of the depth-first search, grouped into one frame per
/// open node.
#[derive(Clone, Debug, Default)]
pub struct SearchStack {
    entries: Vec<Decision>,
    frames: Vec<usize>,
}

impl SearchStack {
    /// Creates a new empty `SearchStack`.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Creates a stack sized for a full descent over `num_items` items:
    /// one frame per pair plus the root, and at most four open children
    /// per frame.
    #[inline]
    pub fn preallocated(num_items: usize) -> Self {
        let mut stack = Self::new();
        stack.ensure_capacity(num_items);
        stack
    }

    /// Grows the buffers to the sizes `preallocated` would choose.
    pub fn ensure_capacity(&mut self, num_items: usize) {
        let num_pairs = num_items * num_items.saturating_sub(1) / 2;
        let frame_capacity = num_pairs.saturating_add(1);
        let entry_capacity = frame_capacity.saturating_mul(4);
        if self.entries.capacity() < entry_capacity {
            self.entries.reserve(entry_capacity - self.entries.len());
        }
        if self.frames.capacity() < frame_capacity {
            self.frames.reserve(frame_capacity - self.frames.len());
        }
    }

    /// Returns the number of pending decisions over all frames.
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
        self.frames.is_empty()
    }

    /// Opens a new frame for the children of the current node.
    #[inline]
    pub fn push_frame(&mut self) {
        self.frames.push(self.entries.len());
    }

    /// Closes the innermost frame, dropping its unexplored decisions.
    #[inline]
    pub fn pop_frame(&mut self) -> Option<()> {
        let start = self.frames.pop()?;
        self.entries.truncate(start);
        Some(())
    }

    /// Pushes decisions onto the innermost frame. The last one is popped first.
    #[inline]
    pub fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Decision>,
    {
        self.entries.extend(iter);
    }

    /// Pops the next decision of the innermost frame.
    #[inline]
    pub fn pop(&mut self) -> Option<Decision> {
        if self.is_current_level_empty() {
            return None;
        }
        self.entries.pop()
    }

    /// Returns `true` if the innermost frame has no decisions left, or if
    /// there is no frame at all.
    #[inline]
    pub fn is_current_level_empty(&self) -> bool {
        match self.frames.last() {
            Some(&start) => self.entries.len() == start,
            None => true,
        }
    }

    #[inline]
    pub fn current_frame_entries(&self) -> &[Decision] {
        match self.frames.last() {
            Some(&start) => &self.entries[start..],
            None => &[],
        }
    }

    /// Clears the stack but keeps its capacity.
    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
        self.frames.clear();
    }

    /// Returns the heap memory held by the buffers, in bytes.
    #[inline]
    pub fn allocated_memory_bytes(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<Decision>()
            + self.frames.capacity() * std::mem::size_of::<usize>()
    }
}

impl std::fmt::Display for SearchStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SearchStack(entries: {}, frames: {})",
            self.entries.len(),
            self.frames.len()
        )
    }
}
