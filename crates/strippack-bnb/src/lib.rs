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

//! Strippack-BnB: propagating branch-and-bound for strip packing
//!
//! Places axis-aligned rectangles of fixed orientation into a strip of
//! height `H`, minimising the used width. Each unordered item pair carries a
//! relation variable (left, right, above, below or undecided); every
//! resolved relation is a precedence constraint on one axis, and bound
//! propagation over those precedences narrows the per-item coordinate
//! domains until a complete, overlap-free layout remains.
//!
//! Core flow
//! - Provide a `strippack_model::model::Model<T>`.
//! - Choose a `branching::decision::DecisionBuilder` (which pair to branch
//!   on and in which relation order).
//! - Choose an `eval::evaluator::ObjectiveEvaluator` (bounds + objective).
//! - Optionally add monitors, fixed relations and a shared incumbent.
//! - Run `bnb::BnbSolver`, or `parallel::ParallelBnbSolver` to split the
//!   root across threads.
//!
//! Design highlights
//! - Domains and relations are mutated in place and restored through a
//!   trail of previous values; no node copies the full state.
//! - Propagation runs to a fixpoint after every decision, forcing pairs
//!   that have a single feasible relation left and cutting every coordinate
//!   that cannot lead to a strictly better width.
//! - Deterministic: depth-first search in a fixed branching order.
//!
//! Module map
//! - `domain`: per-item coordinate intervals.
//! - `relation`: pair relations and their precedence semantics.
//! - `state`: the mutable search state (domains + relations).
//! - `propagate`: the fixpoint propagator.
//! - `branching`: pair selection and relation ordering.
//! - `eval`: lower bounds and the objective.
//! - `monitor`: tree-search monitors (logging, limits, composites).
//! - `bnb`: the sequential engine and its search session.
//! - `parallel`: root splitting over scoped threads.
//! - `result`, `stats`: outcomes and counters.

pub mod bnb;
pub mod branching;
pub mod domain;
pub mod eval;
mod incumbent;
pub mod monitor;
pub mod parallel;
mod propagate;
pub mod relation;
pub mod result;
mod stack;
pub mod state;
pub mod stats;
mod trail;
