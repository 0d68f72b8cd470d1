use crate::core::{Board, Index};
use crate::engine::SearchObserver;

/// Terminal outcome as seen from the statistics side. Running is anything
/// before a terminal signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Running,
    Solved,
    Exhausted,
    Cancelled,
}

/// Passive counters fed by engine events. No logic of its own: steps and
/// backtracks mirror the numbers the engine stamps on its events, solutions
/// are deep snapshots taken the instant they are reported (the live board is
/// unwound right after). Reset is explicit and must happen before reusing
/// the same stats for a new run.
pub struct SearchStats<B: Board> {
    steps: usize,
    backtracks: usize,
    outcome: RunOutcome,
    solutions: Vec<B>,
}

impl<B: Board> SearchStats<B> {
    pub fn new() -> Self {
        SearchStats {
            steps: 0,
            backtracks: 0,
            outcome: RunOutcome::Running,
            solutions: Vec::new(),
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn backtracks(&self) -> usize {
        self.backtracks
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn solution_count(&self) -> usize {
        self.solutions.len()
    }

    pub fn solutions(&self) -> &[B] {
        &self.solutions
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.backtracks = 0;
        self.outcome = RunOutcome::Running;
        self.solutions.clear();
    }
}

impl<B: Board> Default for SearchStats<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Board> SearchObserver<B> for SearchStats<B> {
    fn on_step(&mut self, _at: Index, _value: B::Value, step: usize) {
        self.steps = step;
    }

    fn on_backtrack(&mut self, _at: Index, _value: B::Value, backtracks: usize) {
        self.backtracks = backtracks;
    }

    fn on_solution(&mut self, snapshot: &B) {
        self.solutions.push(snapshot.clone());
        self.outcome = RunOutcome::Solved;
    }

    fn on_exhausted(&mut self) {
        self.outcome = RunOutcome::Exhausted;
    }

    fn on_cancelled(&mut self) {
        self.outcome = RunOutcome::Cancelled;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constraint::ConflictChecker;
    use crate::core::test_util::OneDim;
    use crate::core::Error;
    use crate::engine::find_all;

    #[derive(Debug)]
    struct Distinct;
    impl<const N: usize, const K: u8> ConflictChecker<OneDim<N, K>> for Distinct {
        fn conflicts(&self, board: &OneDim<N, K>, index: Index, value: u8) -> Vec<Index> {
            (0..N)
                .filter(|i| *i != index[1] && board.get([0, *i]) == Some(value))
                .map(|i| [0, i])
                .collect()
        }
    }

    #[test]
    fn test_stats_track_a_full_enumeration() -> Result<(), Error> {
        let mut board = OneDim::<3, 3>::new();
        let mut stats = SearchStats::new();
        let (steps, solutions) = find_all(&mut board, &Distinct, &mut stats)?;
        assert_eq!(stats.steps(), steps);
        assert_eq!(stats.solution_count(), solutions);
        assert_eq!(stats.outcome(), RunOutcome::Exhausted);
        assert!(stats.backtracks() > 0);
        // Snapshots survive the unwinding of the live board.
        assert_eq!(stats.solutions()[0].to_string(), "123");
        Ok(())
    }

    #[test]
    fn test_reset_is_explicit() -> Result<(), Error> {
        let mut stats = SearchStats::new();
        {
            let mut board = OneDim::<3, 3>::new();
            find_all(&mut board, &Distinct, &mut stats)?;
        }
        assert!(stats.steps() > 0);
        stats.reset();
        assert_eq!(stats.steps(), 0);
        assert_eq!(stats.backtracks(), 0);
        assert_eq!(stats.solution_count(), 0);
        assert_eq!(stats.outcome(), RunOutcome::Running);
        Ok(())
    }
}
