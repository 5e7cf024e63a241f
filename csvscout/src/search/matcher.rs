use crate::errors::{SearchError, SearchResult};
use crate::table::{Cell, Row, Table};

/// Strategy for the case-insensitive containment test
#[derive(Debug, Clone, PartialEq, Eq)]
enum MatchStrategy {
    /// Term matches every non-null cell
    Any,
    /// ASCII term: compared byte-wise against ASCII cells without allocating
    Ascii(String),
    /// Anything else: both sides are lowercased before comparing
    Unicode(String),
}

/// Case-insensitive substring predicate over one column.
///
/// Built once per request and shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMatcher {
    column: String,
    term: String,
    strategy: MatchStrategy,
}

impl RowMatcher {
    /// Creates a matcher for rows whose `column` contains `term`
    pub fn new(column: impl Into<String>, term: impl Into<String>) -> Self {
        let term = term.into();
        let strategy = if term.is_empty() {
            MatchStrategy::Any
        } else if term.is_ascii() {
            MatchStrategy::Ascii(term.to_ascii_lowercase())
        } else {
            MatchStrategy::Unicode(term.to_lowercase())
        };
        Self {
            column: column.into(),
            term,
            strategy,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Tests a single cell; null cells never match
    pub fn is_match(&self, cell: &Cell) -> bool {
        let Some(text) = cell.as_text() else {
            return false;
        };
        match &self.strategy {
            MatchStrategy::Any => true,
            MatchStrategy::Ascii(needle) if text.is_ascii() => {
                contains_ignore_ascii_case(text.as_bytes(), needle.as_bytes())
            }
            MatchStrategy::Ascii(needle) | MatchStrategy::Unicode(needle) => {
                text.to_lowercase().contains(needle.as_str())
            }
        }
    }

    fn column_index(&self, table: &Table) -> SearchResult<usize> {
        table
            .column_index(&self.column)
            .ok_or_else(|| SearchError::invalid_column(&self.column))
    }

    /// Returns the matching rows of `table`, in table order
    pub fn filter(&self, table: &Table) -> SearchResult<Vec<Row>> {
        let index = self.column_index(table)?;
        Ok(table
            .rows()
            .iter()
            .filter(|row| self.is_match(&row.cells()[index]))
            .cloned()
            .collect())
    }

    /// Like [`RowMatcher::filter`] but consumes the table instead of cloning rows
    pub fn filter_owned(&self, table: Table) -> SearchResult<Vec<Row>> {
        let index = self.column_index(&table)?;
        Ok(table
            .into_rows()
            .into_iter()
            .filter(|row| self.is_match(&row.cells()[index]))
            .collect())
    }
}

/// Rows of `table` whose `column` case-insensitively contains `term`
pub fn filter(table: &Table, column: &str, term: &str) -> SearchResult<Vec<Row>> {
    RowMatcher::new(column, term).filter(table)
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}
