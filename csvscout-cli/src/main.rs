use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use csvscout::{
    config::{AppConfig, EngineOverrides, SchemaSpec},
    metrics::ScanStats,
    results::SearchOutput,
    search, start_server, Algorithm, Gateway, LoadOptions, SearchRequest, Server,
};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML), applied on top of the global and local files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// CSV file or directory of CSV files
    path: PathBuf,

    /// Column to search
    #[arg(short = 'c', long)]
    column: String,

    /// Text to look for (case-insensitive substring)
    #[arg(short = 't', long, default_value = "")]
    term: String,

    /// Use the worker pool instead of a serial scan
    #[arg(short, long)]
    parallel: bool,

    /// 0-based line index of the header (blank lines count)
    #[arg(long, default_value = "0")]
    header_offset: usize,

    /// Fixed schema: `air_quality` or a comma separated column list
    #[arg(long)]
    schema: Option<String>,

    /// Patterns to ignore when searching a directory (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Number of worker threads
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Rows per chunk when scanning a single file in parallel
    #[arg(long)]
    chunk_rows: Option<NonZeroUsize>,

    /// Files per worker task when scanning a directory in parallel
    #[arg(long)]
    files_per_group: Option<NonZeroUsize>,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one column of a CSV file or directory
    Search(Box<CliSearchConfig>),

    /// Run one request through the HTTP gateway without starting a server
    Query {
        /// Request target, e.g. "/search/data1?algorithm=serial&search_header=Country Name"
        route: String,
    },

    /// Serve the HTTP gateway until Ctrl-C
    Serve {
        /// Address to bind (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str, verbose: u8) {
    let level = match verbose {
        0 => log_level,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_schema(value: &str) -> SchemaSpec {
    if value.contains(',') {
        SchemaSpec::Columns(value.split(',').map(|s| s.trim().to_string()).collect())
    } else {
        SchemaSpec::Named(value.to_string())
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.log_level, cli.verbose);
    debug!(
        "Loaded configuration with {} datasets, engine {:?}",
        config.datasets.len(),
        config.engine
    );

    match cli.command {
        Commands::Search(args) => {
            let engine = config.engine.merge_with_cli(EngineOverrides {
                workers: args.workers,
                chunk_rows: args.chunk_rows,
                files_per_group: args.files_per_group,
            });
            let load = LoadOptions {
                header_offset: args.header_offset,
                schema: args
                    .schema
                    .as_deref()
                    .map(|s| parse_schema(s).resolve())
                    .transpose()?,
            };
            let algorithm = if args.parallel {
                Algorithm::Parallel
            } else {
                Algorithm::Serial
            };

            let request = SearchRequest::new(args.path, args.column, args.term)
                .with_algorithm(algorithm)
                .with_load_options(load)
                .with_ignore_patterns(args.ignore);
            let report = search(&request, &engine)?;

            if !args.stats {
                print_output(&report.output)?;
            }
            print_stats(&report.stats, report.elapsed.as_secs_f64());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Query { route } => {
            let response = Gateway::new(&config).handle("GET", &route);
            let status = response.status.to_string();
            if response.is_success() {
                eprintln!("{}", status.green());
            } else {
                eprintln!("{}", status.red());
            }
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            let server = Server::new(Gateway::new(&config), server_config);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(start_server(server))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_output(output: &SearchOutput) -> Result<()> {
    let json = match output {
        SearchOutput::Rows(rows) => serde_json::to_string_pretty(rows)?,
        SearchOutput::Partitions(outcomes) => {
            for outcome in outcomes {
                if let Some(err) = outcome.error() {
                    eprintln!(
                        "{} partition {}: {}",
                        "failed".red(),
                        outcome.index,
                        err.message
                    );
                }
            }
            serde_json::to_string_pretty(outcomes)?
        }
    };
    println!("{}", json);
    Ok(())
}

fn print_stats(stats: &ScanStats, seconds: f64) {
    let failed = if stats.failed_partitions > 0 {
        format!(", {} failed", stats.failed_partitions).red().to_string()
    } else {
        String::new()
    };
    eprintln!(
        "Found {} matches in {} rows ({} partitions{}) in {:.3}s",
        stats.rows_matched.to_string().green(),
        stats.rows_scanned,
        stats.partitions,
        failed,
        seconds
    );
}
