//! In-memory tables and the CSV loader.
//!
//! A file is read either whole ([`load`]) or as a lazy sequence of fixed-size row
//! chunks ([`load_chunks`]). Both paths share the same header handling:
//!
//! * `header_offset` physical lines are skipped first, blank lines included;
//! * without a schema, the next record names the columns;
//! * with a schema, the schema's column list is applied to every remaining
//!   record, which must have exactly that many fields.
//!
//! Cell types are inferred per column over the whole file, so a chunk types its
//! cells the same way a whole-file load does.

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::errors::{SearchError, SearchResult};

/// Column names applied to the air quality files, which carry no usable header
pub const AIR_QUALITY_COLUMNS: [&str; 13] = [
    "lat",
    "lon",
    "time",
    "measurement_ozone",
    "measurement_PM2.5",
    "measurement_PM10",
    "measurement_CO",
    "measurement_NO2",
    "measurement_SO2",
    "location1",
    "location2",
    "data1",
    "data2",
];

// Spellings read as a missing value.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS.contains(&raw)
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// String form used by the search predicate; `None` for missing values
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Null => None,
            Cell::Int(v) => Some(Cow::Owned(v.to_string())),
            Cell::Float(v) => Some(Cow::Owned(format_float(*v))),
            Cell::Text(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Int(v) => serializer.serialize_i64(*v),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Formats a float the way the dataset tooling prints it: integral values keep a
/// trailing `.0`, very large or very small magnitudes use `1e+20` exponent form,
/// everything else uses the shortest round-trip form.
///
/// Only finite values are stored as [`Cell::Float`]; the non-finite arms exist
/// for completeness.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        let text = if v > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }
    let magnitude = v.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        format_exponent(v)
    } else if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn format_exponent(v: f64) -> String {
    let formatted = format!("{:e}", v);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Running type evidence for one column
#[derive(Debug, Clone, Copy)]
struct KindTracker {
    all_int: bool,
    all_float: bool,
    any_null: bool,
}

impl Default for KindTracker {
    fn default() -> Self {
        Self {
            all_int: true,
            all_float: true,
            any_null: false,
        }
    }
}

impl KindTracker {
    fn observe(&mut self, value: Option<&str>) {
        let raw = match value {
            Some(raw) if !is_null_marker(raw) => raw.trim(),
            _ => {
                self.any_null = true;
                return;
            }
        };
        if self.all_int && raw.parse::<i64>().is_err() {
            self.all_int = false;
        }
        // `inf` and friends stay text: JSON has no spelling for them.
        if self.all_float && !raw.parse::<f64>().is_ok_and(f64::is_finite) {
            self.all_float = false;
        }
    }

    fn kind(&self) -> ColumnKind {
        // Integer columns with holes are widened to floats.
        if self.all_int && !self.any_null {
            ColumnKind::Int
        } else if self.all_float {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }
}

/// Column kinds accumulated over every record of a file.
///
/// Chunked reads share one inference so a cell gets the same type whichever
/// chunk it lands in.
#[derive(Debug, Clone)]
struct KindInference {
    trackers: Vec<KindTracker>,
}

impl KindInference {
    fn new(width: usize) -> Self {
        Self {
            trackers: vec![KindTracker::default(); width],
        }
    }

    fn observe(&mut self, record: &StringRecord) {
        for (i, tracker) in self.trackers.iter_mut().enumerate() {
            tracker.observe(record.get(i));
        }
    }

    fn finish(&self) -> Arc<[ColumnKind]> {
        self.trackers.iter().map(KindTracker::kind).collect()
    }

    fn over(width: usize, records: &[StringRecord]) -> Arc<[ColumnKind]> {
        let mut inference = Self::new(width);
        for record in records {
            inference.observe(record);
        }
        inference.finish()
    }
}

fn parse_cell(raw: Option<&str>, kind: ColumnKind) -> Cell {
    let raw = match raw {
        Some(raw) if !is_null_marker(raw) => raw,
        _ => return Cell::Null,
    };
    match kind {
        ColumnKind::Int => raw
            .trim()
            .parse()
            .map(Cell::Int)
            .unwrap_or_else(|_| Cell::Text(raw.to_string())),
        ColumnKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Cell::Float)
            .unwrap_or_else(|| Cell::Text(raw.to_string())),
        ColumnKind::Text => Cell::Text(raw.to_string()),
    }
}

/// One row of a table: cells paired with the table's shared column list
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    cells: Vec<Cell>,
}

impl Row {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Looks up a cell by column name
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.cells[i])
    }

    /// Iterates `(column, cell)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, cell) in self.iter() {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// An ordered set of rows sharing one column list
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table from raw string records, inferring column types.
    ///
    /// Records shorter than the column list are padded with nulls; extra fields
    /// are ignored.
    pub fn from_records<S: AsRef<str>>(columns: &[S], records: &[Vec<S>]) -> Self {
        let columns: Arc<[String]> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let records: Vec<StringRecord> = records
            .iter()
            .map(|r| r.iter().map(|field| field.as_ref()).collect::<StringRecord>())
            .collect();
        let kinds = KindInference::over(columns.len(), &records);
        Self::build(columns, &kinds, &records)
    }

    fn build(columns: Arc<[String]>, kinds: &[ColumnKind], records: &[StringRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| Row {
                columns: Arc::clone(&columns),
                cells: kinds
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| parse_cell(record.get(i), *kind))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How a file's columns are determined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// 0-based line index of the header, or the number of lines to skip when
    /// `schema` is set. Every physical line counts, blank ones included.
    pub header_offset: usize,
    /// Fixed column list applied instead of the file's own header
    pub schema: Option<Arc<[String]>>,
}

impl LoadOptions {
    pub fn with_header(header_offset: usize) -> Self {
        Self {
            header_offset,
            schema: None,
        }
    }

    pub fn with_schema<S: AsRef<str>>(header_offset: usize, schema: &[S]) -> Self {
        Self {
            header_offset,
            schema: Some(schema.iter().map(|c| c.as_ref().to_string()).collect()),
        }
    }

    /// Options for the headerless air quality files
    pub fn air_quality() -> Self {
        Self::with_schema(0, &AIR_QUALITY_COLUMNS)
    }
}

/// Makes header names unique: blanks become `Unnamed: <i>`, repeats get `.<n>`.
fn unique_columns(header: &StringRecord) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(header.len());
    let mut repeats: HashMap<String, usize> = HashMap::new();

    for (i, name) in header.iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let count = repeats.entry(base.clone()).or_insert(0);
        while columns.contains(&candidate) {
            *count += 1;
            candidate = format!("{}.{}", base, count);
        }
        columns.push(candidate);
    }
    columns
}

/// Layout shared by every record of one opened file
#[derive(Debug, Clone)]
struct Layout {
    path: PathBuf,
    columns: Arc<[String]>,
    fixed_schema: bool,
    // Physical lines consumed before the csv reader took over.
    skipped_lines: u64,
}

impl Layout {
    fn line_of(&self, record: &StringRecord) -> u64 {
        self.skipped_lines + record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn check_width(&self, record: &StringRecord) -> SearchResult<()> {
        let expected = self.columns.len();
        let found = record.len();
        if self.fixed_schema && found != expected {
            return Err(SearchError::schema_mismatch(
                &self.path,
                self.line_of(record),
                expected,
                found,
            ));
        }
        if found > expected {
            return Err(SearchError::load_error(format!(
                "Error tokenizing data. Expected {} fields in line {}, saw {}",
                expected,
                self.line_of(record),
                found
            )));
        }
        Ok(())
    }
}

type Records = StringRecordsIntoIter<BufReader<File>>;

/// Opens `path`, skips `header_offset` physical lines and resolves the columns.
/// The returned reader is positioned on the first data record.
fn open(path: &Path, options: &LoadOptions) -> SearchResult<(Layout, Records)> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SearchError::not_found(path),
        _ => SearchError::load_error(format!("{}: {}", path.display(), e)),
    })?;
    let mut reader = BufReader::new(file);

    let mut skipped_lines = 0;
    let mut line = Vec::new();
    for _ in 0..options.header_offset {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SearchError::load_error(format!("{}: {}", path.display(), e)))?;
        if read == 0 {
            break;
        }
        skipped_lines += 1;
    }

    let mut records = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_records();

    let (columns, fixed_schema) = match &options.schema {
        Some(schema) => (Arc::clone(schema), true),
        None => match records.next() {
            Some(header) => {
                let columns: Arc<[String]> = unique_columns(&header?).into();
                (columns, false)
            }
            None => return Err(SearchError::load_error("No columns to parse from file")),
        },
    };

    trace!(
        "Opened {} with {} columns after {} lines (fixed schema: {})",
        path.display(),
        columns.len(),
        skipped_lines,
        fixed_schema
    );

    let layout = Layout {
        path: path.to_path_buf(),
        columns,
        fixed_schema,
        skipped_lines,
    };
    Ok((layout, records))
}

/// Loads a whole file into one table
pub fn load(path: &Path, options: &LoadOptions) -> SearchResult<Table> {
    let (layout, records) = open(path, options)?;
    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        layout.check_width(&record)?;
        rows.push(record);
    }
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    let kinds = KindInference::over(layout.columns.len(), &rows);
    Ok(Table::build(layout.columns, &kinds, &rows))
}

/// Reads the file once to settle column kinds for a chunked read. Records that
/// will fail their chunk are left out, as they would fail a whole-file load too.
fn infer_file_kinds(path: &Path, options: &LoadOptions) -> SearchResult<Arc<[ColumnKind]>> {
    let (layout, records) = open(path, options)?;
    let mut inference = KindInference::new(layout.columns.len());
    for record in records {
        match record {
            Ok(record) => {
                if layout.check_width(&record).is_ok() {
                    inference.observe(&record);
                }
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(_) => {}
        }
    }
    Ok(inference.finish())
}

/// Opens a file for chunked reading; each item holds up to `chunk_rows` rows.
///
/// Column kinds are inferred over the whole file first, so every chunk types its
/// cells exactly as [`load`] would.
pub fn load_chunks(
    path: &Path,
    options: &LoadOptions,
    chunk_rows: usize,
) -> SearchResult<TableChunks> {
    if chunk_rows == 0 {
        return Err(SearchError::invalid_argument("chunk size must be at least 1"));
    }
    let kinds = infer_file_kinds(path, options)?;
    let (layout, records) = open(path, options)?;
    Ok(TableChunks {
        layout,
        kinds,
        records,
        chunk_rows,
        finished: false,
    })
}

/// Lazy, forward-only sequence of row chunks from one file.
///
/// A malformed record fails only the chunk it belongs to; the rest of that chunk
/// is still consumed so later chunks start on the expected row.
pub struct TableChunks {
    layout: Layout,
    kinds: Arc<[ColumnKind]>,
    records: Records,
    chunk_rows: usize,
    finished: bool,
}

impl TableChunks {
    /// Columns every chunk will carry
    pub fn columns(&self) -> &[String] {
        &self.layout.columns
    }

    pub fn path(&self) -> &Path {
        &self.layout.path
    }
}

impl Iterator for TableChunks {
    type Item = SearchResult<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut records = Vec::with_capacity(self.chunk_rows);
        let mut failure: Option<SearchError> = None;
        let mut taken = 0;

        while taken < self.chunk_rows {
            match self.records.next() {
                None => {
                    self.finished = true;
                    break;
                }
                Some(Ok(record)) => {
                    if failure.is_none() {
                        match self.layout.check_width(&record) {
                            Ok(()) => records.push(record),
                            Err(e) => failure = Some(e),
                        }
                    }
                }
                Some(Err(e)) => {
                    // The reader cannot make progress after an I/O failure.
                    if e.is_io_error() {
                        self.finished = true;
                    }
                    if failure.is_none() {
                        failure = Some(e.into());
                    }
                    if self.finished {
                        taken += 1;
                        break;
                    }
                }
            }
            taken += 1;
        }

        if taken == 0 {
            return None;
        }
        Some(match failure {
            Some(e) => Err(e),
            None => Ok(Table::build(
                Arc::clone(&self.layout.columns),
                &self.kinds,
                &records,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_header_at_offset() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "pop.csv",
            "\"Data Source\",\"World Development Indicators\"\n\
             \n\
             \"Last Updated Date\",\"2023-05-10\"\n\
             \n\
             Country Name,Country Code,1960\n\
             Aruba,ABW,54608\n\
             Africa Eastern,AFE,130692579\n",
        );

        let table = load(&path, &LoadOptions::with_header(4)).unwrap();
        assert_eq!(table.columns(), ["Country Name", "Country Code", "1960"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0].get("Country Name"),
            Some(&Cell::Text("Aruba".to_string()))
        );
        assert_eq!(table.rows()[1].get("1960"), Some(&Cell::Int(130692579)));
    }

    #[test]
    fn test_custom_schema_skips_offset() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "air.csv", "junk,line\n1,2,3\n4,5,6\n");

        let table = load(&path, &LoadOptions::with_schema(1, &["a", "b", "c"])).unwrap();
        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("c"), Some(&Cell::Int(6)));
    }

    #[test]
    fn test_blank_lines_count_towards_offset() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "air.csv", "junk,line\n\n1,2,3\n4,5,6\n");

        let table = load(&path, &LoadOptions::with_schema(2, &["a", "b", "c"])).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get("a"), Some(&Cell::Int(1)));

        let chunks: Vec<_> = load_chunks(&path, &LoadOptions::with_header(2), 1)
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(chunks[0].columns(), ["1", "2", "3"]);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_mismatch_line_counts_skipped_lines() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "air.csv", "junk\n\n1,2,3\n4,5\n");

        let err = load(&path, &LoadOptions::with_schema(2, &["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, SearchError::SchemaMismatch { line: 4, .. }));
    }

    #[test]
    fn test_custom_schema_width_mismatch() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "air.csv", "1,2,3\n4,5\n");

        let err = load(&path, &LoadOptions::with_schema(0, &["a", "b", "c"])).unwrap_err();
        match err {
            SearchError::SchemaMismatch {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_fail() {
        let dir = tempdir().unwrap();
        let short = write_csv(dir.path(), "short.csv", "a,b,c\n1,2\n");
        let table = load(&short, &LoadOptions::default()).unwrap();
        assert_eq!(table.rows()[0].get("c"), Some(&Cell::Null));

        let long = write_csv(dir.path(), "long.csv", "a,b\n1,2,3\n");
        let err = load(&long, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::LoadError(_)));
        assert!(err.to_string().contains("Expected 2 fields"));
    }

    #[test]
    fn test_missing_file_and_empty_file() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("nope.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::NotFound(_)));

        let empty = write_csv(dir.path(), "empty.csv", "");
        let err = load(&empty, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "No columns to parse from file");
    }

    #[test]
    fn test_unique_column_names() {
        let header = StringRecord::from(vec!["name", "", "name", "name.1", ""]);
        assert_eq!(
            unique_columns(&header),
            ["name", "Unnamed: 1", "name.1", "name.1.1", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_type_inference() {
        let table = Table::from_records(
            &["year", "value", "label", "blank"],
            &[
                vec!["1960", "1.5", "x", ""],
                vec!["1961", "", "12", "NA"],
                vec!["1962", "3", "y", ""],
            ],
        );
        let rows = table.rows();
        assert_eq!(rows[0].get("year"), Some(&Cell::Int(1960)));
        assert_eq!(rows[1].get("value"), Some(&Cell::Null));
        assert_eq!(rows[2].get("value"), Some(&Cell::Float(3.0)));
        assert_eq!(rows[1].get("label"), Some(&Cell::Text("12".to_string())));
        assert!(rows[0].get("blank").unwrap().is_null());
        assert_eq!(rows[2].get("value").unwrap().as_text().unwrap(), "3.0");
    }

    #[test]
    fn test_int_column_with_nulls_widens_to_float() {
        let table = Table::from_records(&["n"], &[vec!["1"], vec![""]]);
        assert_eq!(table.rows()[0].get("n"), Some(&Cell::Float(1.0)));
        assert_eq!(table.rows()[0].get("n").unwrap().as_text().unwrap(), "1.0");
    }

    #[test]
    fn test_non_finite_values_stay_text() {
        let table = Table::from_records(&["v"], &[vec!["1.5"], vec!["inf"], vec!["-Infinity"]]);
        assert_eq!(table.rows()[1].get("v"), Some(&Cell::Text("inf".to_string())));
        assert_eq!(table.rows()[0].get("v"), Some(&Cell::Text("1.5".to_string())));
        let json = serde_json::to_string(&table.rows()[2]).unwrap();
        assert_eq!(json, r#"{"v":"-Infinity"}"#);
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(-2.5e17), "-2.5e+17");
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(123456789012345.0), "123456789012345.0");
    }

    #[test]
    fn test_chunks_type_cells_like_whole_file() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "zips.csv",
            "id,zip,score\n1,01234,1\n2,02345,2\n3,ABC12,\n4,,4\n",
        );

        let whole = load(&path, &LoadOptions::default()).unwrap();
        let chunked: Vec<Row> = load_chunks(&path, &LoadOptions::default(), 2)
            .unwrap()
            .flat_map(|c| c.unwrap().into_rows())
            .collect();
        assert_eq!(chunked, whole.rows());
        assert_eq!(chunked[0].get("zip"), Some(&Cell::Text("01234".to_string())));
        assert_eq!(chunked[0].get("score"), Some(&Cell::Float(1.0)));
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let table = Table::from_records(&["z", "a"], &[vec!["first", "2"]]);
        let json = serde_json::to_string(&table.rows()[0]).unwrap();
        assert_eq!(json, r#"{"z":"first","a":2}"#);
    }

    #[test]
    fn test_chunks_cover_all_rows() {
        let dir = tempdir().unwrap();
        let mut content = String::from("id,name\n");
        for i in 0..25 {
            content.push_str(&format!("{},row{}\n", i, i));
        }
        let path = write_csv(dir.path(), "rows.csv", &content);

        let chunks = load_chunks(&path, &LoadOptions::default(), 10).unwrap();
        assert_eq!(chunks.columns(), ["id", "name"]);
        let sizes: Vec<usize> = chunks.map(|c| c.unwrap().len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_bad_record_fails_only_its_chunk() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "air.csv", "1,2\n3,4\n5\n6,7\n8,9\n10,11\n");

        let chunks: Vec<_> = load_chunks(&path, &LoadOptions::with_schema(0, &["a", "b"]), 2)
            .unwrap()
            .collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].is_ok());
        assert!(matches!(chunks[1], Err(SearchError::SchemaMismatch { .. })));
        assert_eq!(chunks[2].as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "rows.csv", "a\n1\n");
        assert!(matches!(
            load_chunks(&path, &LoadOptions::default(), 0),
            Err(SearchError::InvalidArgument(_))
        ));
    }
}
