/// Number of runs kept.
pub const MAX_RUNS: usize = 10;

/// Finished runs this process has seen, fewest moves first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Leaderboard {
    runs: Vec<u32>,
}

impl Leaderboard {
    /// Records a finished run and returns its rank, if it made the board.
    pub fn record(&mut self, moves: u32) -> Option<usize> {
        let rank = self.runs.partition_point(|m| *m <= moves);
        if rank >= MAX_RUNS {
            return None;
        }
        self.runs.insert(rank, moves);
        self.runs.truncate(MAX_RUNS);
        Some(rank)
    }

    pub fn runs(&self) -> &[u32] {
        &self.runs
    }

    pub fn best(&self) -> Option<u32> {
        self.runs.first().copied()
    }
}
