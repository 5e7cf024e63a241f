use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use super::matcher::RowMatcher;
use crate::errors::SearchResult;
use crate::results::{FileMatches, PartitionOutcome};
use crate::table::{self, LoadOptions, Table};

/// Applies one row matcher to files, chunks and file groups
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: RowMatcher,
    options: LoadOptions,
}

impl FileProcessor {
    pub fn new(matcher: RowMatcher, options: LoadOptions) -> Self {
        Self { matcher, options }
    }

    pub fn matcher(&self) -> &RowMatcher {
        &self.matcher
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Loads a whole file and keeps its matching rows
    pub fn process_file(&self, path: &Path) -> SearchResult<FileMatches> {
        trace!("Processing file: {}", path.display());
        let table = table::load(path, &self.options)?;
        let rows_scanned = table.len();
        let rows = self.matcher.filter_owned(table)?;
        debug!(
            "{}: {} of {} rows matched",
            path.display(),
            rows.len(),
            rows_scanned
        );
        Ok(FileMatches {
            path: path.to_path_buf(),
            rows,
            rows_scanned,
        })
    }

    /// Filters one chunk of a larger file
    pub fn process_chunk(&self, index: usize, chunk: SearchResult<Table>) -> PartitionOutcome {
        let table = match chunk {
            Ok(table) => table,
            Err(e) => {
                warn!("Chunk {} failed to load: {}", index, e);
                return PartitionOutcome::failure(index, 0, &e);
            }
        };
        let rows_scanned = table.len();
        match self.matcher.filter_owned(table) {
            Ok(rows) => {
                trace!("Chunk {}: {} matches", index, rows.len());
                PartitionOutcome::success(index, rows_scanned, rows)
            }
            Err(e) => PartitionOutcome::failure(index, rows_scanned, &e),
        }
    }

    /// Searches a group of files in order, concatenating their matches.
    ///
    /// The first file that fails fails the whole group.
    pub fn process_group(&self, index: usize, files: &[PathBuf]) -> PartitionOutcome {
        let mut rows = Vec::new();
        let mut rows_scanned = 0;
        for path in files {
            match self.process_file(path) {
                Ok(matches) => {
                    rows_scanned += matches.rows_scanned;
                    rows.extend(matches.rows);
                }
                Err(e) => {
                    warn!("Group {} failed on {}: {}", index, path.display(), e);
                    return PartitionOutcome::failure(index, rows_scanned, &e);
                }
            }
        }
        trace!(
            "Group {}: {} files, {} matches",
            index,
            files.len(),
            rows.len()
        );
        PartitionOutcome::success(index, rows_scanned, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, SearchError};
    use std::fs;
    use tempfile::tempdir;

    fn processor(column: &str, term: &str) -> FileProcessor {
        FileProcessor::new(RowMatcher::new(column, term), LoadOptions::default())
    }

    #[test]
    fn test_process_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.csv");
        fs::write(&path, "name,age\nAlpha,1\nbravo,2\nCharlie,3\n").unwrap();

        let matches = processor("name", "a").process_file(&path).unwrap();
        assert_eq!(matches.rows_scanned, 3);
        assert_eq!(matches.rows.len(), 3);

        let matches = processor("name", "ALP").process_file(&path).unwrap();
        assert_eq!(matches.rows.len(), 1);
        assert_eq!(matches.path, path);
    }

    #[test]
    fn test_process_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.csv");
        fs::write(&path, "name\nAlpha\n").unwrap();

        let err = processor("age", "1").process_file(&path).unwrap_err();
        assert!(matches!(err, SearchError::InvalidColumn(_)));

        let err = processor("name", "a")
            .process_file(&dir.path().join("missing.csv"))
            .unwrap_err();
        assert!(matches!(err, SearchError::NotFound(_)));
    }

    #[test]
    fn test_process_chunk() {
        let table = Table::from_records(&["city"], &[vec!["Paris"], vec!["Lyon"]]);
        let outcome = processor("city", "par").process_chunk(7, Ok(table));
        assert_eq!(outcome.index, 7);
        assert_eq!(outcome.rows_scanned, 2);
        assert_eq!(outcome.match_count(), 1);

        let outcome = processor("city", "par")
            .process_chunk(8, Err(SearchError::load_error("Error tokenizing data")));
        assert_eq!(outcome.index, 8);
        assert_eq!(outcome.error().unwrap().kind, ErrorKind::LoadError);
    }

    #[test]
    fn test_process_group_stops_at_failure() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("a.csv");
        let bad = dir.path().join("b.csv");
        fs::write(&good, "name\nAlpha\n").unwrap();
        fs::write(&bad, "other\nAlpha\n").unwrap();

        let p = processor("name", "alpha");
        let outcome = p.process_group(0, &[good.clone(), good.clone()]);
        assert_eq!(outcome.match_count(), 2);
        assert_eq!(outcome.rows_scanned, 2);

        let outcome = p.process_group(1, &[good, bad]);
        assert_eq!(outcome.error().unwrap().kind, ErrorKind::InvalidColumn);
        assert_eq!(outcome.rows_scanned, 1);
    }
}
