use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, DatasetConfig, EngineConfig};
use crate::errors::{SearchError, SearchResult};
use crate::native::{NativeRunner, ProcessRunner};
use crate::results::SearchOutput;
use crate::search::{search, Algorithm, SearchRequest};

/// Status code and JSON body produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

impl GatewayResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

impl From<&SearchError> for GatewayResponse {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::NotFound(_) => Self::error(404, err.to_string()),
            SearchError::InvalidColumn(_) => Self::error(400, "Invalid search header"),
            SearchError::InvalidAlgorithm(_) => Self::error(400, err.to_string()),
            _ => Self::error(500, err.to_string()),
        }
    }
}

/// Query string parameters; the first occurrence of a key wins
struct QueryParams(HashMap<String, String>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        let mut params = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()).into_owned() {
            params.entry(key).or_insert(value);
        }
        Self(params)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

/// Routes requests to searches over the configured datasets.
///
/// Routes:
/// - `GET /search/<dataset>?algorithm=serial|parallel&search_header=..&search_term=..`
/// - `GET /native/<dataset>?algorithm=..&search_header=..&search_term=..`
#[derive(Clone)]
pub struct Gateway {
    datasets: BTreeMap<String, DatasetConfig>,
    engine: EngineConfig,
    runner: Arc<dyn NativeRunner>,
}

impl Gateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            datasets: config.datasets.clone(),
            engine: config.engine,
            runner: Arc::new(ProcessRunner),
        }
    }

    /// Replaces the runner used by the native routes
    pub fn with_runner(mut self, runner: Arc<dyn NativeRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Handles one request given its method and request target (path plus query)
    pub fn handle(&self, method: &str, target: &str) -> GatewayResponse {
        info!("{} {}", method, target);
        if method != "GET" {
            return GatewayResponse::error(405, format!("Method {} not allowed", method));
        }

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let params = QueryParams::parse(query);
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        let (route, id) = match segments[..] {
            ["", route @ ("search" | "native"), id] if !id.is_empty() => (route, id),
            _ => return GatewayResponse::error(404, format!("No route for {}", path)),
        };
        let Some(dataset) = self.datasets.get(id) else {
            return GatewayResponse::error(404, format!("Unknown dataset '{}'", id));
        };

        let result = if route == "search" {
            self.search(dataset, &params)
        } else {
            self.native(id, dataset, &params)
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed: {}", target, e);
                GatewayResponse::from(&e)
            }
        }
    }

    fn search(&self, dataset: &DatasetConfig, params: &QueryParams) -> SearchResult<GatewayResponse> {
        let algorithm: Algorithm = params.get_or("algorithm", "").parse()?;
        let request = SearchRequest::new(
            &dataset.path,
            params.get_or("search_header", ""),
            params.get_or("search_term", ""),
        )
        .with_algorithm(algorithm)
        .with_load_options(dataset.load_options()?)
        .with_ignore_patterns(dataset.ignore_patterns.clone());

        let report = search(&request, &self.engine)?;
        let result = match report.output {
            SearchOutput::Rows(rows) => json!([rows]),
            SearchOutput::Partitions(mut outcomes) => {
                if dataset.drop_empty_partitions {
                    outcomes.retain(|o| !o.is_ok() || o.match_count() > 0);
                }
                serde_json::to_value(outcomes)?
            }
        };
        debug!(
            "Returning {} matches from {}",
            report.stats.rows_matched,
            dataset.path.display()
        );

        Ok(GatewayResponse::ok(json!({
            "result": result,
            "Time taken is": report.elapsed.as_secs_f64(),
        })))
    }

    /// Anything other than `serial` selects the parallel program
    fn native(
        &self,
        id: &str,
        dataset: &DatasetConfig,
        params: &QueryParams,
    ) -> SearchResult<GatewayResponse> {
        let algorithm = params.get_or("algorithm", "serial");
        let program = if algorithm == "serial" {
            dataset.native.serial.as_ref()
        } else {
            dataset.native.parallel.as_ref()
        };
        let Some(program) = program else {
            return Ok(GatewayResponse::error(
                404,
                format!("No native {} program configured for dataset '{}'", algorithm, id),
            ));
        };

        let args = [
            params.get_or("search_header", ""),
            params.get_or("search_term", ""),
        ];
        let stdout = self.runner.run(program, &args)?;
        Ok(GatewayResponse::ok(json!({ "message": stdout })))
    }
}
