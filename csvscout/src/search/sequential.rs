use std::path::Path;
use tracing::debug;

use super::processor::FileProcessor;
use crate::errors::SearchResult;
use crate::results::FileMatches;
use crate::walker::list_csv_files;

/// Searches one file on the calling thread
pub fn search_file(processor: &FileProcessor, path: &Path) -> SearchResult<FileMatches> {
    processor.process_file(path)
}

/// Searches every CSV file under `root` on the calling thread.
///
/// Matches are concatenated in file-listing order. The first failing file aborts
/// the whole search.
pub fn search_directory(
    processor: &FileProcessor,
    root: &Path,
    ignore_patterns: &[String],
) -> SearchResult<FileMatches> {
    let files = list_csv_files(root, ignore_patterns)?;
    let mut rows = Vec::new();
    let mut rows_scanned = 0;
    for path in &files {
        let matches = processor.process_file(path)?;
        rows_scanned += matches.rows_scanned;
        rows.extend(matches.rows);
    }
    debug!(
        "Sequential scan of {} files under {} found {} matches",
        files.len(),
        root.display(),
        rows.len()
    );
    Ok(FileMatches {
        path: root.to_path_buf(),
        rows,
        rows_scanned,
    })
}
