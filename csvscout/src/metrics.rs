use serde::Serialize;
use tracing::{debug, info};

use crate::results::{PartitionOutcome, SearchOutput};

/// Scan statistics, derived from a search's outcomes after collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub partitions: usize,
    pub failed_partitions: usize,
    pub rows_scanned: usize,
    pub rows_matched: usize,
}

impl ScanStats {
    /// Statistics for a concurrent search
    pub fn from_outcomes(outcomes: &[PartitionOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut stats, outcome| {
            stats.partitions += 1;
            stats.rows_scanned += outcome.rows_scanned;
            stats.rows_matched += outcome.match_count();
            if !outcome.is_ok() {
                stats.failed_partitions += 1;
            }
            stats
        })
    }

    /// Statistics for any search output; `rows_scanned` is supplied by the caller
    /// for sequential scans, which do not report per-partition counts
    pub fn from_output(output: &SearchOutput, rows_scanned: usize) -> Self {
        match output {
            SearchOutput::Partitions(outcomes) => Self::from_outcomes(outcomes),
            SearchOutput::Rows(rows) => Self {
                partitions: 1,
                failed_partitions: 0,
                rows_scanned,
                rows_matched: rows.len(),
            },
        }
    }

    /// Logs the statistics
    pub fn log_stats(&self) {
        info!(
            "Scanned {} rows in {} partitions, {} matches, {} failed partitions",
            self.rows_scanned, self.partitions, self.rows_matched, self.failed_partitions
        );
        if self.failed_partitions > 0 {
            debug!(
                "{} of {} partitions reported errors",
                self.failed_partitions, self.partitions
            );
        }
    }
}
