//! CLI command implementations for rrdsense.
//!
//! This module provides implementations for all CLI subcommands:
//! - `collect` / `collect-all`: sensor collection and RRD updates
//! - `init` / `init-all`: RRD database creation
//! - `check`: config validation

pub mod check;
pub mod collect;
pub mod init;

// Re-export command functions
pub use check::command_check;
pub use collect::{command_collect, command_collect_all};
pub use init::{command_init, command_init_all};

use std::fs;
use std::path::{Path, PathBuf};

/// Config files in a directory, sorted by name so every run visits them in
/// the same order.
pub(crate) fn config_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("json") | Some("yaml") | Some("yml") | Some("toml")
            )
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(format!("no config files found in {}", dir.display()).into());
    }
    Ok(paths)
}

/// Display name for a config file in log lines.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
