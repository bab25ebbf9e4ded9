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

//! # Strippack Solver
//!
//! High-level entry point for strip packing. This crate wires the
//! branch-and-bound engine of `strippack-bnb` to a configuration, a monitor
//! stack built from that configuration, and a caller-facing result type.
//!
//! ## Modules
//!
//! - `config`: `SolverConfig` and the `SolverBuilder` used to set limits,
//!   thread count, branching order and warm-start bounds.
//! - `error`: `SolveError`, distinguishing invalid input, proven
//!   infeasibility and budgets that ran out before any placement was found.
//! - `result`: `PackingResult`, a placement plus whether it is proven
//!   optimal or only the best found within the budget.
//! - `solver`: `Solver`, which runs the search and maps its outcome.

pub mod config;
pub mod error;
pub mod result;
pub mod solver;
