//! Time-series sink seam and the rrdtool implementation.
//!
//! Collection hands the sink one positionally ordered datapoint string per
//! run. The trait exists so tests can record submissions instead of
//! shelling out; production uses `rrdtool` subprocesses, same as database
//! creation at init time.

use crate::config::CollectorConfig;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to run rrdtool: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("rrdtool update failed for {path}: {stderr}")]
    UpdateFailed { path: PathBuf, stderr: String },

    #[error("rrdtool create failed for {path}: {stderr}")]
    CreateFailed { path: PathBuf, stderr: String },
}

/// Destination for one run's ordered values.
pub trait TimeSeriesSink {
    /// Submits a datapoint of the form `N:v1:v2:...` with `U` for missing
    /// readings. Order and cardinality must match the database's data
    /// sources; the interface carries no names.
    fn update(&self, datapoint: &str) -> Result<(), SinkError>;
}

/// Sink backed by `rrdtool update` subprocess calls.
pub struct RrdtoolSink {
    rrd_path: PathBuf,
}

impl RrdtoolSink {
    pub fn new(rrd_path: impl Into<PathBuf>) -> Self {
        Self {
            rrd_path: rrd_path.into(),
        }
    }

    pub fn rrd_path(&self) -> &Path {
        &self.rrd_path
    }

    /// Creates the RRD database described by the config, if it does not
    /// already exist. Returns whether a database was created.
    pub fn create_database(&self, config: &CollectorConfig, file: &str) -> Result<bool, SinkError> {
        if self.rrd_path.exists() {
            info!("RRD already exists: {}", self.rrd_path.display());
            return Ok(false);
        }

        let rrd = match config.rrd_settings(file) {
            Ok(settings) => settings,
            // Surfaced earlier by validation; map to stderr-style text so
            // callers see one error channel.
            Err(e) => {
                return Err(SinkError::CreateFailed {
                    path: self.rrd_path.clone(),
                    stderr: e.to_string(),
                })
            }
        };

        let mut cmd = Command::new("rrdtool");
        cmd.arg("create")
            .arg(&self.rrd_path)
            .arg("--step")
            .arg(rrd.step.to_string());

        // DS:<id>:<type>:<heartbeat>:<min>:<max>, one per sensor, in
        // declared order. Heartbeat is twice the step.
        for sensor in &config.sensors {
            cmd.arg(format!(
                "DS:{}:{}:{}:{}:{}",
                sensor.id,
                sensor.ds_type.as_rrd(),
                rrd.step * 2,
                format_bound(sensor.min.or(Some(0.0))),
                format_bound(sensor.max),
            ));
        }

        for archive in &rrd.archives {
            cmd.arg(format!(
                "RRA:{}:{}:{}:{}",
                archive.cf, archive.xff, archive.steps, archive.rows
            ));
        }

        info!("Creating RRD: {}", self.rrd_path.display());
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(SinkError::CreateFailed {
                path: self.rrd_path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("RRD database created: {}", self.rrd_path.display());
        Ok(true)
    }
}

impl TimeSeriesSink for RrdtoolSink {
    fn update(&self, datapoint: &str) -> Result<(), SinkError> {
        let output = Command::new("rrdtool")
            .arg("update")
            .arg(&self.rrd_path)
            .arg(datapoint)
            .output()?;

        if !output.status.success() {
            return Err(SinkError::UpdateFailed {
                path: self.rrd_path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Renders an optional DS bound; `U` means unbounded.
fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => v.to_string(),
        None => "U".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_render_as_rrdtool_expects() {
        assert_eq!(format_bound(None), "U");
        assert_eq!(format_bound(Some(0.0)), "0");
        assert_eq!(format_bound(Some(-5.0)), "-5");
        assert_eq!(format_bound(Some(1.5)), "1.5");
    }
}
