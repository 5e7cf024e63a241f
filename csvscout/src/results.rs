/// Result types produced by a search.
///
/// A concurrent search never merges rows across partitions while collecting;
/// each chunk or file group reports its own [`PartitionOutcome`] and the caller
/// decides whether to flatten them.
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{ErrorKind, SearchError};
use crate::metrics::ScanStats;
use crate::table::Row;

/// In-band description of a partition that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SearchError> for PartitionError {
    fn from(err: &SearchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// What one partition (a row chunk or a file group) produced
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome {
    /// Position of the partition in submission order
    pub index: usize,
    /// Data rows examined before the partition finished or failed
    pub rows_scanned: usize,
    pub result: Result<Vec<Row>, PartitionError>,
}

impl PartitionOutcome {
    pub fn success(index: usize, rows_scanned: usize, rows: Vec<Row>) -> Self {
        Self {
            index,
            rows_scanned,
            result: Ok(rows),
        }
    }

    pub fn failure(index: usize, rows_scanned: usize, err: &SearchError) -> Self {
        Self {
            index,
            rows_scanned,
            result: Err(err.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Matching rows, or `None` if the partition failed
    pub fn rows(&self) -> Option<&[Row]> {
        self.result.as_deref().ok()
    }

    pub fn error(&self) -> Option<&PartitionError> {
        self.result.as_ref().err()
    }

    pub fn match_count(&self) -> usize {
        self.rows().map_or(0, <[Row]>::len)
    }
}

impl Serialize for PartitionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.result {
            Ok(rows) => rows.serialize(serializer),
            Err(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", &err.message)?;
                map.serialize_entry("kind", &err.kind)?;
                map.end()
            }
        }
    }
}

/// Matches from one whole file
#[derive(Debug, Clone, PartialEq)]
pub struct FileMatches {
    pub path: PathBuf,
    pub rows: Vec<Row>,
    pub rows_scanned: usize,
}

/// The aggregate a search produced, shaped by the algorithm used
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutput {
    /// Sequential scan: every match, in file and row order
    Rows(Vec<Row>),
    /// Concurrent scan: one outcome per chunk or file group
    Partitions(Vec<PartitionOutcome>),
}

impl SearchOutput {
    /// Total matching rows across successful partitions
    pub fn match_count(&self) -> usize {
        match self {
            SearchOutput::Rows(rows) => rows.len(),
            SearchOutput::Partitions(outcomes) => {
                outcomes.iter().map(PartitionOutcome::match_count).sum()
            }
        }
    }

    /// Flattens successful partitions into one row list, dropping failures
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            SearchOutput::Rows(rows) => rows,
            SearchOutput::Partitions(outcomes) => outcomes
                .into_iter()
                .filter_map(|o| o.result.ok())
                .flatten()
                .collect(),
        }
    }
}

/// A finished search with its statistics and wall-clock time
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub output: SearchOutput,
    pub stats: ScanStats,
    pub elapsed: Duration,
}
