/// Per-run tally of scan files taken in and dropped by the accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulationStats {
    processed: usize,
    skipped: usize,
}

impl AccumulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// `(processed, skipped)`
    pub fn snapshot(&self) -> (usize, usize) {
        (self.processed, self.skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_independently() {
        let mut stats = AccumulationStats::new();
        stats.record_processed();
        stats.record_processed();
        stats.record_skipped();
        assert_eq!(stats.snapshot(), (2, 1));
    }
}
