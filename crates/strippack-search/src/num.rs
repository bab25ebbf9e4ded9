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

//! # Solver Numeric Trait
//!
//! `SolverNumeric` collects the integer capabilities the search engines
//! need into one bound: signed primitive arithmetic, lossless widening to
//! `i64` for the shared incumbent, fallible narrowing back from it, and
//! `Send + Sync` so a model can be shared by parallel workers.
//!
//! Every signed primitive up to `i64` qualifies. `i128` and `isize` are
//! excluded because they do not convert losslessly into `i64`.

use num_traits::{FromPrimitive, PrimInt, Signed};
use std::hash::Hash;

/// Integer types usable as coordinates and objective values.
pub trait SolverNumeric:
    PrimInt
    + Signed
    + FromPrimitive
    + Into<i64>
    + TryFrom<i64>
    + std::fmt::Debug
    + std::fmt::Display
    + Send
    + Sync
    + Hash
    + 'static
{
}

impl<T> SolverNumeric for T where
    T: PrimInt
        + Signed
        + FromPrimitive
        + Into<i64>
        + TryFrom<i64>
        + std::fmt::Debug
        + std::fmt::Display
        + Send
        + Sync
        + Hash
        + 'static
{
}
