//! Collect command implementation.
//!
//! One invocation per scheduling tick: read every configured sensor in
//! declared order and submit a single positional update to the RRD.

use crate::collect::CollectionRun;
use crate::config::{load_config, ConfigError};
use crate::disks::DiskRecordStore;
use crate::reader::SensorReader;
use crate::resolver::ChipResolver;
use crate::sink::RrdtoolSink;
use chrono::Local;
use std::path::Path;
use tracing::{error, info};

use super::{config_files, file_label};

/// Runs collection for a single config file and updates its RRD.
pub fn command_collect(
    config_path: &Path,
    sys_mount: &Path,
    disks_ini: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = file_label(config_path);
    let cfg = load_config(config_path)?;

    if !cfg.enabled {
        info!("{} is disabled, skipping", file);
        return Ok(());
    }

    cfg.validate(&file)?;
    let rrd_path = cfg
        .rrd_path
        .clone()
        .ok_or_else(|| ConfigError::MissingRrdPath(file.clone()))?;

    let reader = SensorReader::new(
        ChipResolver::new(sys_mount),
        DiskRecordStore::new(disks_ini),
    );
    let sink = RrdtoolSink::new(&rrd_path);
    let run = CollectionRun::new(&reader, &sink);

    let result = run.run(&cfg.sensors, cfg.collection.source_type);
    run.submit(&cfg.sensors, &result)?;

    info!(
        "{} - RRD updated OK: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        file
    );
    Ok(())
}

/// Runs collection for every enabled config in the config directory.
///
/// A failing config is logged and the loop continues; the next scheduling
/// tick is the retry.
pub fn command_collect_all(
    config_dir: &Path,
    sys_mount: &Path,
    disks_ini: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = config_files(config_dir)?;

    for path in &paths {
        info!("Processing {}", path.display());
        if let Err(e) = command_collect(path, sys_mount, disks_ini) {
            error!("collection failed for {}: {}", path.display(), e);
        }
    }

    info!("collection complete ({} configs)", paths.len());
    Ok(())
}
