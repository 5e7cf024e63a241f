use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};
use crate::table::{LoadOptions, AIR_QUALITY_COLUMNS};

/// Application configuration: engine tuning, server binding and the dataset
/// registry.
///
/// # Configuration Locations
///
/// Sources are merged in this order, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/csvscout/config.yaml`
/// 2. Local `.csvscout.yaml` in the current directory
/// 3. Custom config file given with `--config` (must exist)
///
/// # Configuration Format
///
/// ```yaml
/// log_level: "info"
///
/// engine:
///   workers: 4            # worker pool width per request
///   chunk_rows: 1000      # rows per chunk when scanning one large file
///   files_per_group: 2    # files per worker task when scanning a directory
///
/// server:
///   host: "127.0.0.1"
///   port: 5000
///
/// datasets:
///   data1:
///     path: "data/population.csv"
///     header_offset: 4    # 0-based line index of the header, blank lines count
///     native:
///       serial: "bin/Data1Serial"
///       parallel: "bin/Data1Parallel"
///   data2:
///     path: "data/air"    # directories are searched file by file
///     schema: air_quality # or an explicit list of column names
///     ignore_patterns: ["**/backup/*.csv"]
///     drop_empty_partitions: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Datasets keyed by the identifier used in request paths
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            engine: EngineConfig::default(),
            server: ServerConfig::default(),
            datasets: BTreeMap::new(),
        }
    }
}

/// Tuning for the concurrent engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker pool width; one pool is built per search call
    #[serde(default = "default_workers")]
    pub workers: NonZeroUsize,

    /// Data rows per chunk in single-file mode
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: NonZeroUsize,

    /// Files handed to one worker task in directory mode
    #[serde(default = "default_files_per_group")]
    pub files_per_group: NonZeroUsize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            chunk_rows: default_chunk_rows(),
            files_per_group: default_files_per_group(),
        }
    }
}

/// Optional engine settings given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOverrides {
    pub workers: Option<NonZeroUsize>,
    pub chunk_rows: Option<NonZeroUsize>,
    pub files_per_group: Option<NonZeroUsize>,
}

impl EngineConfig {
    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: EngineOverrides) -> Self {
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(chunk_rows) = cli.chunk_rows {
            self.chunk_rows = chunk_rows;
        }
        if let Some(files_per_group) = cli.files_per_group {
            self.files_per_group = files_per_group;
        }
        self
    }
}

/// Address the HTTP server binds to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A fixed column list: either a built-in name or explicit columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaSpec {
    Named(String),
    Columns(Vec<String>),
}

impl SchemaSpec {
    /// Column list applied to every record
    pub fn resolve(&self) -> SearchResult<Arc<[String]>> {
        match self {
            SchemaSpec::Named(name) if name == "air_quality" => Ok(AIR_QUALITY_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect()),
            SchemaSpec::Named(name) => Err(SearchError::config_error(format!(
                "Unknown schema '{}'",
                name
            ))),
            SchemaSpec::Columns(columns) if columns.is_empty() => {
                Err(SearchError::config_error("Schema must list at least one column"))
            }
            SchemaSpec::Columns(columns) => Ok(columns.iter().cloned().collect()),
        }
    }
}

/// External programs backing the native endpoints of a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCommands {
    #[serde(default)]
    pub serial: Option<PathBuf>,
    #[serde(default)]
    pub parallel: Option<PathBuf>,
}

/// One entry of the dataset registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// A single CSV file or a directory of CSV files
    pub path: PathBuf,

    /// 0-based header line index, or lines to skip when `schema` is set
    #[serde(default)]
    pub header_offset: usize,

    /// Fixed column list for files without a usable header
    #[serde(default)]
    pub schema: Option<SchemaSpec>,

    /// Glob patterns excluded when `path` is a directory
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Leave successful partitions without matches out of parallel results
    #[serde(default)]
    pub drop_empty_partitions: bool,

    #[serde(default)]
    pub native: NativeCommands,
}

impl DatasetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header_offset: 0,
            schema: None,
            ignore_patterns: Vec::new(),
            drop_empty_partitions: false,
            native: NativeCommands::default(),
        }
    }

    /// Loader options derived from this entry
    pub fn load_options(&self) -> SearchResult<LoadOptions> {
        Ok(LoadOptions {
            header_offset: self.header_offset,
            schema: self.schema.as_ref().map(SchemaSpec::resolve).transpose()?,
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN)
}

fn default_chunk_rows() -> NonZeroUsize {
    NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN)
}

fn default_files_per_group() -> NonZeroUsize {
    NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN)
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl AppConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("csvscout/config.yaml")),
            Some(PathBuf::from(".csvscout.yaml")),
        ];
        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Looks up a dataset by identifier
    pub fn dataset(&self, id: &str) -> Option<&DatasetConfig> {
        self.datasets.get(id)
    }
}
