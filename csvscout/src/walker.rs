use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::errors::{SearchError, SearchResult};
use crate::filters::should_include_file;

/// Rewrites `\` separators as `/` so paths compare the same on every platform
pub fn normalize_path(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('\\', "/"))
}

/// Recursively lists every CSV file under `root`.
///
/// Files come back in directory traversal order, which is stable for a given
/// filesystem snapshot but not sorted. Hidden entries and ignore files are not
/// treated specially: every `.csv` file is returned unless it matches one of the
/// glob `ignore_patterns`. Unreadable entries are logged and skipped.
pub fn list_csv_files(root: &Path, ignore_patterns: &[String]) -> SearchResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(SearchError::not_found(root));
    }

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).follow_links(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = normalize_path(entry.path());
        if should_include_file(&path, ignore_patterns) {
            trace!("Adding CSV file: {}", path.display());
            files.push(path);
        }
    }

    debug!("Found {} CSV files under {}", files.len(), root.display());
    Ok(files)
}
