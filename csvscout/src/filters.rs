/// Path filters applied while enumerating a dataset directory.
use glob::Pattern;
use std::path::Path;

const CSV_SUFFIX: &str = ".csv";

/// Checks if the file name ends with the CSV extension (case-sensitive)
pub fn has_csv_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(CSV_SUFFIX))
}

/// Checks if a path matches any of the glob ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    if ignore_patterns.is_empty() {
        return false;
    }
    let normalized_path = path.to_string_lossy().replace('\\', "/");
    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&normalized_path),
        Err(_) => false,
    })
}

/// Determines if a file takes part in a directory search
pub fn should_include_file(path: &Path, ignore_patterns: &[String]) -> bool {
    has_csv_extension(path) && !should_ignore(path, ignore_patterns)
}
