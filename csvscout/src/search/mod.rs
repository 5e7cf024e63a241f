//! Column search over CSV files and directories.
//!
//! Two execution strategies share one [`FileProcessor`]:
//!
//! - **Serial** ([`sequential`]): whole files are loaded and filtered on the
//!   calling thread. The first failing file aborts the search.
//! - **Parallel** ([`engine`]): a worker pool is built for the call. A single
//!   file is streamed in row chunks through a bounded job queue and outcomes
//!   come back in completion order. A directory is split into groups of files
//!   mapped over the pool, so outcome `i` is group `i`.
//!
//! In parallel mode every chunk or group reports its own
//! [`PartitionOutcome`](crate::results::PartitionOutcome), so one bad partition
//! never discards the work of the others:
//!
//! ```rust,ignore
//! let request = SearchRequest::new("data/air", "location1", "fresno")
//!     .with_algorithm(Algorithm::Parallel);
//! let report = search(&request, &EngineConfig::default())?;
//! println!("{} matches", report.output.match_count());
//! ```
pub mod engine;
pub mod matcher;
pub mod processor;
pub mod sequential;

pub use engine::{search, Algorithm, SearchRequest};
pub use matcher::RowMatcher;
pub use processor::FileProcessor;
