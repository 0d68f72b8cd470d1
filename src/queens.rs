use std::collections::HashMap;
use std::fmt::{Debug, Display};
use crate::constraint::ConflictChecker;
use crate::core::{Board, Branch, Error, Index};

/// The single value a queens cell can hold. Branching for this domain runs
/// over the candidate cells of a row, not over values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queen;

impl Display for Queen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q")
    }
}

lazy_static::lazy_static! {
    /// Total distinct N-Queens solutions for small boards.
    pub static ref KNOWN_SOLUTION_COUNTS: HashMap<usize, usize> = {
        let mut m = HashMap::new();
        m.insert(1, 1);
        m.insert(2, 0);
        m.insert(3, 0);
        m.insert(4, 2);
        m.insert(5, 10);
        m.insert(6, 4);
        m.insert(7, 40);
        m.insert(8, 92);
        m
    };
}

/// N x N queens board. Rows are filled strictly top-down, one queen per row,
/// so the state is just the chosen column (if any) per row.
#[derive(Clone, PartialEq)]
pub struct QueensBoard {
    n: usize,
    queens: Vec<Option<usize>>,
}

impl QueensBoard {
    pub fn new(n: usize) -> Self {
        QueensBoard {
            n,
            queens: vec![None; n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn queen_col(&self, row: usize) -> Option<usize> {
        self.queens.get(row).copied().flatten()
    }

    /// Column per row for a fully placed board, top row first.
    pub fn placement(&self) -> Option<Vec<usize>> {
        self.queens.iter().copied().collect()
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for r in 0..self.n {
            for c in 0..self.n {
                out.push(if self.queens[r] == Some(c) { 'Q' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl Debug for QueensBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl Board for QueensBoard {
    type Value = Queen;

    fn rows(&self) -> usize {
        self.n
    }

    fn cols(&self) -> usize {
        self.n
    }

    fn get(&self, index: Index) -> Option<Queen> {
        if index[0] >= self.n || index[1] >= self.n {
            return None;
        }
        if self.queens[index[0]] == Some(index[1]) {
            Some(Queen)
        } else {
            None
        }
    }

    fn apply(&mut self, index: Index, _value: Queen) -> Result<(), Error> {
        if index[0] >= self.n || index[1] >= self.n {
            return Err(Error::new_const("Index out of bounds"));
        } else if self.queens[index[0]].is_some() {
            return Err(Error::new_const("Row already holds a queen"));
        }
        self.queens[index[0]] = Some(index[1]);
        Ok(())
    }

    fn undo(&mut self, index: Index, _value: Queen) -> Result<(), Error> {
        if index[0] >= self.n || index[1] >= self.n {
            return Err(Error::new_const("Index out of bounds"));
        } else if self.queens[index[0]] != Some(index[1]) {
            return Err(Error::new_const("No queen at that cell to undo"));
        }
        self.queens[index[0]] = None;
        Ok(())
    }

    fn reset(&mut self) {
        self.queens = vec![None; self.n];
    }

    fn next_branch(&self) -> Branch<Queen> {
        for r in 0..self.n {
            if self.queens[r].is_none() {
                return Branch::Value(Queen, (0..self.n).map(|c| [r, c]).collect());
            }
        }
        Branch::Complete
    }

    fn validate(&self) -> Result<(), Error> {
        if self.n == 0 {
            return Err(Error::new_const("Board must have at least one row"));
        }
        Ok(())
    }

    fn filled(&self) -> usize {
        self.queens.iter().filter(|q| q.is_some()).count()
    }
}

/// Attack-line checker for a candidate queen at (row, col), with rows above
/// it already placed: reports any queen in the same column, then on the
/// upper-left diagonal, then on the upper-right diagonal.
#[derive(Debug)]
pub struct QueenAttackChecker;

impl ConflictChecker<QueensBoard> for QueenAttackChecker {
    fn conflicts(&self, board: &QueensBoard, index: Index, _value: Queen) -> Vec<Index> {
        let [row, col] = index;
        let mut hits = Vec::new();
        for r in (0..row).rev() {
            if board.queen_col(r) == Some(col) {
                hits.push([r, col]);
            }
        }
        for d in 1..=row {
            if col >= d && board.queen_col(row - d) == Some(col - d) {
                hits.push([row - d, col - d]);
            }
        }
        for d in 1..=row {
            let c = col + d;
            if c < board.size() && board.queen_col(row - d) == Some(c) {
                hits.push([row - d, c]);
            }
        }
        hits
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{find_all, find_first};
    use crate::stats::{RunOutcome, SearchStats};

    fn assert_valid_placement(cols: &[usize]) {
        for i in 0..cols.len() {
            for j in i + 1..cols.len() {
                assert_ne!(cols[i], cols[j], "shared column in {:?}", cols);
                assert_ne!(
                    cols[i].abs_diff(cols[j]),
                    j - i,
                    "shared diagonal in {:?}",
                    cols
                );
            }
        }
    }

    #[test]
    fn test_attack_checker() {
        let mut board = QueensBoard::new(4);
        board.apply([0, 1], Queen).unwrap();
        board.apply([1, 3], Queen).unwrap();
        // Column and upper-left diagonal attacks on row 2.
        assert_eq!(
            QueenAttackChecker.conflicts(&board, [2, 1], Queen),
            vec![[0, 1]]
        );
        assert_eq!(
            QueenAttackChecker.conflicts(&board, [2, 2], Queen),
            vec![[1, 3]]
        );
        // Two attackers at once, column first.
        assert_eq!(
            QueenAttackChecker.conflicts(&board, [2, 3], Queen),
            vec![[1, 3], [0, 1]]
        );
        assert_eq!(
            QueenAttackChecker.conflicts(&board, [2, 0], Queen),
            Vec::<Index>::new()
        );
    }

    #[test]
    fn test_four_queens_enumeration() {
        let mut board = QueensBoard::new(4);
        let mut stats = SearchStats::new();
        let (_, solutions) = find_all(&mut board, &QueenAttackChecker, &mut stats).unwrap();
        assert_eq!(solutions, 2);
        assert_eq!(stats.outcome(), RunOutcome::Exhausted);
        let placements: Vec<Vec<usize>> = stats
            .solutions()
            .iter()
            .map(|b| b.placement().unwrap())
            .collect();
        // Ascending column order fixes which solution comes first.
        assert_eq!(placements, vec![vec![1, 3, 0, 2], vec![2, 0, 3, 1]]);
    }

    #[test]
    fn test_known_solution_counts() {
        for n in 1..=6 {
            let mut board = QueensBoard::new(n);
            let mut stats = SearchStats::new();
            let (_, solutions) = find_all(&mut board, &QueenAttackChecker, &mut stats).unwrap();
            assert_eq!(
                solutions, KNOWN_SOLUTION_COUNTS[&n],
                "wrong count for n={}",
                n
            );
        }
    }

    #[test]
    fn test_eight_queens_enumeration() {
        let mut board = QueensBoard::new(8);
        let mut stats = SearchStats::new();
        let (_, solutions) = find_all(&mut board, &QueenAttackChecker, &mut stats).unwrap();
        assert_eq!(solutions, 92);
        for b in stats.solutions() {
            assert_valid_placement(&b.placement().unwrap());
        }
    }

    #[test]
    fn test_unsolvable_sizes_exhaust() {
        for n in [2, 3] {
            let mut board = QueensBoard::new(n);
            let mut stats = SearchStats::new();
            let (_, solutions) = find_all(&mut board, &QueenAttackChecker, &mut stats).unwrap();
            assert_eq!(solutions, 0);
            assert_eq!(stats.outcome(), RunOutcome::Exhausted);
        }
    }

    #[test]
    fn test_first_solution_deterministic() {
        let mut counts = None;
        for _ in 0..2 {
            let mut board = QueensBoard::new(6);
            let mut stats = SearchStats::new();
            let solution = find_first(&mut board, &QueenAttackChecker, &mut stats).unwrap();
            let cols = solution.unwrap().placement().unwrap();
            assert_valid_placement(&cols);
            let run = (stats.steps(), stats.backtracks(), cols);
            match &counts {
                None => counts = Some(run),
                Some(c) => assert_eq!(c, &run),
            }
        }
    }

    #[test]
    fn test_board_misuse() {
        let mut board = QueensBoard::new(4);
        assert!(board.apply([4, 0], Queen).is_err());
        board.apply([0, 2], Queen).unwrap();
        assert!(board.apply([0, 3], Queen).is_err(), "one queen per row");
        assert!(board.undo([0, 1], Queen).is_err(), "undo must match");
        board.undo([0, 2], Queen).unwrap();
        assert!(QueensBoard::new(0).validate().is_err());
    }

    #[test]
    fn test_serialize() {
        let mut board = QueensBoard::new(3);
        board.apply([1, 2], Queen).unwrap();
        assert_eq!(board.serialize(), "...\n..Q\n...\n");
    }
}
