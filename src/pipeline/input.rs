//! Input resolution: the list of AsciiDoc sources a run converts.
//!
//! Explicit inputs are checked for existence up front, so a typo fails the
//! run before anything is scheduled. Without explicit inputs the source
//! directory is globbed (`*.asciidoc` by default); matches are sorted so
//! submission order does not depend on directory iteration order. A glob
//! that matches nothing is not an error: the run simply has no tasks.

use crate::config::BatchConfig;
use crate::error::BatchError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolve the sources for `config`.
pub fn resolve_inputs(config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    if config.inputs.is_empty() {
        discover_inputs(&config.source_dir, &config.pattern)
    } else {
        resolve_explicit(&config.inputs)
    }
}

/// Validate explicit sources, keeping their order.
pub fn resolve_explicit(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    for path in inputs {
        if !path.is_file() {
            return Err(BatchError::SourceNotFound { path: path.clone() });
        }
    }
    debug!("Using {} explicit source(s)", inputs.len());
    Ok(inputs.to_vec())
}

/// Glob `pattern` inside `dir`, returning matching files in sorted order.
pub fn discover_inputs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BatchError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&escaped).join(pattern);
    let full = full.to_string_lossy();

    let entries = glob::glob(&full).map_err(|e| BatchError::InvalidPattern {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BatchError::InvalidPattern {
            pattern: pattern.to_string(),
            detail: e.to_string(),
        })?;
        if path.is_file() {
            found.push(strip_dot(path));
        }
    }
    found.sort();

    if found.is_empty() {
        warn!("No source files match '{}' in '{}'", pattern, dir.display());
        return Ok(found);
    }

    info!("Discovered {} source(s) matching '{}'", found.len(), pattern);
    Ok(found)
}

// `./book.asciidoc` -> `book.asciidoc`, so log lines read like the user typed them.
fn strip_dot(path: PathBuf) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => path,
    }
}
