use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::errors::{SearchError, SearchResult};

/// Runs an external search program and returns what it printed.
pub trait NativeRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[&str]) -> SearchResult<String>;
}

/// Spawns the program as a child process and waits for it
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl NativeRunner for ProcessRunner {
    fn run(&self, program: &Path, args: &[&str]) -> SearchResult<String> {
        debug!("Running {} with {:?}", program.display(), args);
        let output = Command::new(program).args(args).output().map_err(|e| {
            SearchError::native_error(format!("failed to run {}: {}", program.display(), e))
        })?;

        if !output.status.success() {
            warn!("{} exited with {}", program.display(), output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
