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

use strippack_bnb::stats::BnbSolverStatistics;
use strippack_model::{model::Model, placement::Placement};
use strippack_search::num::SolverNumeric;

/// Whether a returned placement is known to be optimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackingStatus {
    /// The search exhausted the tree or reached the static lower bound.
    Optimal,
    /// A limit stopped the search; the placement is the best found so far.
    BestEffort,
}

impl std::fmt::Display for PackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingStatus::Optimal => write!(f, "optimal"),
            PackingStatus::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// A successful solve: the placement, its status, and how the search went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingResult<T> {
    placement: Placement<T>,
    status: PackingStatus,
    statistics: BnbSolverStatistics<T>,
}

impl<T> PackingResult<T>
where
    T: SolverNumeric,
{
    #[inline]
    pub fn new(
        placement: Placement<T>,
        status: PackingStatus,
        statistics: BnbSolverStatistics<T>,
    ) -> Self {
        Self {
            placement,
            status,
            statistics,
        }
    }

    #[inline]
    pub fn placement(&self) -> &Placement<T> {
        &self.placement
    }

    #[inline]
    pub fn into_placement(self) -> Placement<T> {
        self.placement
    }

    /// The used width.
    #[inline]
    pub fn objective(&self) -> T {
        self.placement.objective()
    }

    /// The `(x, y)` origins in input order.
    #[inline]
    pub fn positions(&self) -> impl ExactSizeIterator<Item = (T, T)> + '_ {
        self.placement.positions()
    }

    #[inline]
    pub fn status(&self) -> PackingStatus {
        self.status
    }

    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.status == PackingStatus::Optimal
    }

    #[inline]
    pub fn statistics(&self) -> &BnbSolverStatistics<T> {
        &self.statistics
    }

    /// A `Display` adapter that also echoes the item sizes of `model`.
    #[inline]
    pub fn report<'a>(&'a self, model: &'a Model<T>) -> PackingReport<'a, T> {
        PackingReport {
            result: self,
            model,
        }
    }
}

impl<T> std::fmt::Display for PackingResult<T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.placement)?;
        write!(f, "status = {}", self.status)
    }
}

/// Renders a result in the instance output format:
///
/// ```text
/// total_time = 7
/// positions = [[0, 0], [3, 0]]
/// sizes = [[3, 6], [4, 7]]
/// status = optimal
/// ```
pub struct PackingReport<'a, T>
where
    T: SolverNumeric,
{
    result: &'a PackingResult<T>,
    model: &'a Model<T>,
}

impl<T> std::fmt::Display for PackingReport<'_, T>
where
    T: SolverNumeric,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.result.placement.report(self.model))?;
        write!(f, "status = {}", self.result.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: PackingStatus) -> PackingResult<i64> {
        PackingResult::new(
            Placement::new(7, vec![0, 3], vec![0, 0]),
            status,
            BnbSolverStatistics::default(),
        )
    }

    #[test]
    fn test_accessors() {
        let r = result(PackingStatus::Optimal);
        assert_eq!(r.objective(), 7);
        assert!(r.is_optimal());
        assert_eq!(r.positions().collect::<Vec<_>>(), vec![(0, 0), (3, 0)]);
        assert!(!result(PackingStatus::BestEffort).is_optimal());
    }

    #[test]
    fn test_display_includes_status() {
        let text = result(PackingStatus::BestEffort).to_string();
        assert!(text.starts_with("total_time = 7\n"));
        assert!(text.contains("positions = [[0, 0], [3, 0]]"));
        assert!(text.ends_with("status = best-effort"));
    }

    #[test]
    fn test_report_echoes_sizes() {
        let model = Model::from_dimensions(10, &[(3, 6), (4, 7)]).unwrap();
        let r = result(PackingStatus::Optimal);
        let text = r.report(&model).to_string();
        assert_eq!(
            text,
            "total_time = 7\npositions = [[0, 0], [3, 0]]\nsizes = [[3, 6], [4, 7]]\nstatus = optimal"
        );
    }
}
