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

use crate::monitor::tree_search_monitor::TreeSearchMonitor;
use num_traits::{PrimInt, Signed};

/// A monitor that does nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOperationMonitor;

impl NoOperationMonitor {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl<T> TreeSearchMonitor<T> for NoOperationMonitor
where
    T: PrimInt + Signed,
{
    fn name(&self) -> &str {
        "NoOperationMonitor"
    }
}

impl std::fmt::Display for NoOperationMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NoOperationMonitor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::SearchState, stats::BnbSolverStatistics};
    use strippack_model::model::Model;
    use strippack_search::command::SearchCommand;

    #[test]
    fn test_never_terminates() {
        let model = Model::<i64>::from_dimensions(4, &[(1, 1)]).unwrap();
        let state = SearchState::root(&model).unwrap();
        let stats = BnbSolverStatistics::default();
        let mut monitor = NoOperationMonitor::new();
        TreeSearchMonitor::<i64>::on_enter_search(&mut monitor, &model, &stats);
        assert_eq!(monitor.search_command(&state, &stats), SearchCommand::Continue);
        assert_eq!(TreeSearchMonitor::<i64>::name(&monitor), "NoOperationMonitor");
    }
}
