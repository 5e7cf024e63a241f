use crossbeam_channel::{bounded, unbounded};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::matcher::RowMatcher;
use super::processor::FileProcessor;
use super::sequential;
use crate::config::EngineConfig;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;
use crate::partition::partition;
use crate::results::{PartitionOutcome, SearchOutput, SearchReport};
use crate::table::{self, LoadOptions, Table};
use crate::walker::list_csv_files;

/// How a search is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Whole-file scan on the calling thread
    #[default]
    Serial,
    /// Chunked or grouped scan on a worker pool
    Parallel,
}

impl FromStr for Algorithm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Algorithm::Serial),
            "parallel" => Ok(Algorithm::Parallel),
            other => Err(SearchError::invalid_algorithm(other)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Serial => write!(f, "serial"),
            Algorithm::Parallel => write!(f, "parallel"),
        }
    }
}

/// Everything needed to run one search
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// A CSV file or a directory of CSV files
    pub source: PathBuf,
    pub load: LoadOptions,
    pub ignore_patterns: Vec<String>,
    pub column: String,
    pub term: String,
    pub algorithm: Algorithm,
}

impl SearchRequest {
    pub fn new(
        source: impl Into<PathBuf>,
        column: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            load: LoadOptions::default(),
            ignore_patterns: Vec::new(),
            column: column.into(),
            term: term.into(),
            algorithm: Algorithm::Serial,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Runs a search, choosing file or directory mode from the source path
pub fn search(request: &SearchRequest, engine: &EngineConfig) -> SearchResult<SearchReport> {
    info!(
        "Starting {} search of {} for '{}' in column '{}'",
        request.algorithm,
        request.source.display(),
        request.term,
        request.column
    );
    let start = Instant::now();

    if !request.source.exists() {
        return Err(SearchError::not_found(&request.source));
    }

    let processor = FileProcessor::new(
        RowMatcher::new(request.column.as_str(), request.term.as_str()),
        request.load.clone(),
    );
    let source = request.source.as_path();

    let (output, stats) = match request.algorithm {
        Algorithm::Serial => {
            let matches = if source.is_dir() {
                sequential::search_directory(&processor, source, &request.ignore_patterns)?
            } else {
                sequential::search_file(&processor, source)?
            };
            let output = SearchOutput::Rows(matches.rows);
            let stats = ScanStats::from_output(&output, matches.rows_scanned);
            (output, stats)
        }
        Algorithm::Parallel => {
            let outcomes = if source.is_dir() {
                search_directory_concurrent(&processor, source, &request.ignore_patterns, engine)?
            } else {
                search_file_concurrent(&processor, source, engine)?
            };
            let stats = ScanStats::from_outcomes(&outcomes);
            (SearchOutput::Partitions(outcomes), stats)
        }
    };

    stats.log_stats();
    let elapsed = start.elapsed();
    info!("Search complete in {:.3}s", elapsed.as_secs_f64());

    Ok(SearchReport {
        output,
        stats,
        elapsed,
    })
}

/// Builds the pool for one search call; it is dropped when the call returns
pub fn build_pool(workers: NonZeroUsize) -> SearchResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers.get())
        .thread_name(|i| format!("csvscout-worker-{}", i))
        .build()
        .map_err(|e| SearchError::worker_error(format!("failed to build worker pool: {}", e)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Runs one unit of work, turning a panic into a failed outcome
fn run_isolated<F>(index: usize, work: F) -> PartitionOutcome
where
    F: FnOnce() -> PartitionOutcome,
{
    catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let err = SearchError::worker_error(panic_message(payload));
        PartitionOutcome::failure(index, 0, &err)
    })
}

/// Searches one large file by streaming row chunks to a worker pool.
///
/// The calling thread reads chunks into a bounded job queue while `workers`
/// worker loops filter them. Outcomes are returned in completion order; sort by
/// [`PartitionOutcome::index`] to recover file order.
pub fn search_file_concurrent(
    processor: &FileProcessor,
    path: &Path,
    engine: &EngineConfig,
) -> SearchResult<Vec<PartitionOutcome>> {
    if !path.exists() {
        return Err(SearchError::not_found(path));
    }

    let chunks = table::load_chunks(path, processor.options(), engine.chunk_rows.get())?;
    let column = processor.matcher().column();
    if !chunks.columns().iter().any(|c| c == column) {
        return Err(SearchError::invalid_column(column));
    }

    let workers = engine.workers.get();
    let pool = build_pool(engine.workers)?;
    let (job_tx, job_rx) = bounded::<(usize, SearchResult<Table>)>(workers * 2);
    let (out_tx, out_rx) = unbounded::<PartitionOutcome>();
    let mut outcomes = Vec::new();

    debug!(
        "Scanning {} in chunks of {} rows with {} workers",
        path.display(),
        engine.chunk_rows,
        workers
    );

    pool.in_place_scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let out_tx = out_tx.clone();
            scope.spawn(move |_| {
                for (index, chunk) in job_rx.iter() {
                    let outcome = run_isolated(index, || processor.process_chunk(index, chunk));
                    if out_tx.send(outcome).is_err() {
                        break;
                    }
                }
                trace!("Worker {} finished", worker);
            });
        }
        drop(job_rx);
        drop(out_tx);

        for (index, chunk) in chunks.enumerate() {
            if job_tx.send((index, chunk)).is_err() {
                break;
            }
            outcomes.extend(out_rx.try_iter());
        }
        drop(job_tx);
        outcomes.extend(out_rx.iter());
    });

    debug!("{} chunks processed from {}", outcomes.len(), path.display());
    Ok(outcomes)
}

/// Searches a directory by handing groups of whole files to a worker pool.
///
/// Outcome `i` always belongs to group `i`. A failing file fails only its group.
pub fn search_directory_concurrent(
    processor: &FileProcessor,
    root: &Path,
    ignore_patterns: &[String],
    engine: &EngineConfig,
) -> SearchResult<Vec<PartitionOutcome>> {
    let files = list_csv_files(root, ignore_patterns)?;
    let groups = partition(&files, engine.files_per_group.get())?;
    debug!(
        "Scanning {} files under {} in {} groups",
        files.len(),
        root.display(),
        groups.len()
    );

    let pool = build_pool(engine.workers)?;
    let outcomes = pool.install(|| {
        groups
            .par_iter()
            .enumerate()
            .map(|(index, group)| run_isolated(index, || processor.process_group(index, group)))
            .collect()
    });
    Ok(outcomes)
}
