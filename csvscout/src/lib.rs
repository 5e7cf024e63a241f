pub mod config;
pub mod errors;
pub mod filters;
pub mod gateway;
pub mod metrics;
pub mod native;
pub mod partition;
pub mod results;
pub mod search;
pub mod server;
pub mod table;
pub mod walker;

pub use config::{AppConfig, DatasetConfig, EngineConfig, ServerConfig};
pub use errors::{ErrorKind, SearchError, SearchResult};
pub use gateway::{Gateway, GatewayResponse};
pub use native::{NativeRunner, ProcessRunner};
pub use results::{PartitionOutcome, SearchOutput, SearchReport};
pub use search::{search, Algorithm, SearchRequest};
pub use server::{start_server, Server};
pub use table::{LoadOptions, Row, Table};
