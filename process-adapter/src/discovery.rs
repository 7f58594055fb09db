//! Locates wrapped commands on the system.

use crate::error::AdapterError;
use crate::exec::{run_command, ExecOptions};
use crate::provider::VERSION_FLAG;
use std::path::{Path, PathBuf};
use which::which;

/// Resolves `command` to an executable path.
///
/// Resolution order:
/// 1. A command containing a path separator is used as-is if it exists.
/// 2. Otherwise it is looked up on `$PATH`.
///
/// # Errors
///
/// Returns `AdapterError::NotFound` when neither step yields a path.
pub fn discover_command(command: &str) -> Result<PathBuf, AdapterError> {
    let path = Path::new(command);
    if path.is_absolute() || path.components().count() > 1 {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(AdapterError::NotFound(format!(
            "Explicit path does not exist: {}",
            path.display()
        )));
    }

    which(command).map_err(|e| AdapterError::NotFound(format!("{command}: {e}")))
}

/// Runs `<command> --version` and returns the first line of stdout.
///
/// Returns `None` if the command cannot be spawned, exits non-zero or prints
/// nothing.
pub async fn probe_version(command: &str) -> Option<String> {
    let result = run_command(command, &[VERSION_FLAG], &ExecOptions::default()).await;
    if !result.success {
        return None;
    }
    result
        .stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
}
