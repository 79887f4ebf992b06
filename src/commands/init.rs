//! Init command implementation.
//!
//! Creates RRD databases from config. The data-source order written here is
//! the order collection submits values in forever after; both come from the
//! same sensor list.

use crate::config::{load_config, ConfigError};
use crate::sink::RrdtoolSink;
use std::path::Path;
use tracing::info;

use super::{config_files, file_label};

/// Creates the RRD for a single config file, if it does not exist yet.
pub fn command_init(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = file_label(config_path);
    let cfg = load_config(config_path)?;

    if !cfg.enabled {
        info!("{} is disabled, skipping", file);
        return Ok(());
    }

    cfg.validate(&file)?;
    cfg.rrd_settings(&file)?;

    let rrd_path = cfg
        .rrd_path
        .clone()
        .ok_or_else(|| ConfigError::MissingRrdPath(file.clone()))?;
    let sink = RrdtoolSink::new(&rrd_path);
    sink.create_database(&cfg, &file)?;
    Ok(())
}

/// Creates RRDs for every enabled config in the config directory.
///
/// Unlike collect-all, the first failure aborts: starting collection
/// against half-initialized databases helps nobody.
pub fn command_init_all(config_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let paths = config_files(config_dir)?;

    for path in &paths {
        info!("Processing {}", path.display());
        command_init(path)?;
    }

    info!("init complete ({} configs)", paths.len());
    Ok(())
}
