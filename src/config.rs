//! Configuration management for rrdsense.
//!
//! Each config file describes one RRD database: where it lives, its
//! step/archive layout, and the ordered sensor list feeding it. Files are
//! loaded by extension and may be YAML, JSON, or TOML.
//!
//! Sensor order is load-bearing: the RRD's data sources were created in the
//! same order, and updates are positional. Reordering sensors without
//! recreating the database corrupts the series silently.

use crate::cli::ConfigFormat;
use crate::transform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Directory scanned by the collect-all / init-all commands.
pub const DEFAULT_CONFIG_DIR: &str = "/config";

/// Telemetry source a config's sensors are read from.
///
/// A closed set: adding a source kind means adding a variant and satisfying
/// every exhaustive match, not comparing strings at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Hwmon files under the mounted host /sys.
    Sysfs,
    /// Fields from the Unraid disks.ini snapshot.
    UnraidDisk,
}

/// RRD data-source type declared per sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DsType {
    #[default]
    #[serde(rename = "GAUGE")]
    Gauge,
    #[serde(rename = "COUNTER")]
    Counter,
    #[serde(rename = "DERIVE")]
    Derive,
    #[serde(rename = "ABSOLUTE")]
    Absolute,
}

impl DsType {
    /// Accumulating types require integral values at update time.
    pub fn is_counter_like(self) -> bool {
        !matches!(self, DsType::Gauge)
    }

    pub fn as_rrd(self) -> &'static str {
        match self {
            DsType::Gauge => "GAUGE",
            DsType::Counter => "COUNTER",
            DsType::Derive => "DERIVE",
            DsType::Absolute => "ABSOLUTE",
        }
    }
}

/// One configured sensor. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSpec {
    /// RRD data-source name.
    pub id: String,

    /// Display name for log output; falls back to `id`.
    pub name: Option<String>,

    #[serde(default)]
    pub unit: String,

    /// Sysfs sensors: path template, may contain one `{chipname}`
    /// placeholder.
    pub path: Option<String>,

    /// Disk sensors: the disk's `idSb` serial.
    pub disk_id: Option<String>,

    /// Disk sensors: disks.ini field to read (default: `temp`).
    pub field: Option<String>,

    /// Optional arithmetic transform over the raw reading, e.g.
    /// `value / 1000`.
    pub transform: Option<String>,

    #[serde(default)]
    pub ds_type: DsType,

    /// Optional bounds for the RRD data source.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SensorSpec {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_source_kind")]
    pub source_type: SourceKind,
}

fn default_source_kind() -> SourceKind {
    SourceKind::Sysfs
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            source_type: default_source_kind(),
        }
    }
}

/// One RRA archive definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    /// Consolidation function: AVERAGE, MIN, MAX, LAST.
    pub cf: String,
    pub xff: f64,
    pub steps: u32,
    pub rows: u32,
}

/// Database layout, needed by the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrdSettings {
    /// Collection interval in seconds.
    pub step: u64,
    #[serde(default)]
    pub archives: Vec<Archive>,
}

/// Top-level per-file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Destination RRD file. Mandatory for collection and init.
    pub rrd_path: Option<String>,

    #[serde(default)]
    pub collection: CollectionSettings,

    pub rrd: Option<RrdSettings>,

    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
}

fn default_enabled() -> bool {
    true
}

/// Schema-level faults. These abort before any reads; per-sensor faults
/// never surface here.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rrd_path missing in {0}")]
    MissingRrdPath(String),

    #[error("no sensors configured in {0}")]
    NoSensors(String),

    #[error("duplicate sensor id '{id}' in {file}")]
    DuplicateSensorId { id: String, file: String },

    #[error("rrd settings (step/archives) missing in {0}, required for init")]
    MissingRrdSettings(String),

    #[error("invalid transform for sensor '{id}': {source}")]
    InvalidTransform {
        id: String,
        #[source]
        source: transform::TransformError,
    },
}

impl CollectorConfig {
    /// Validates the batch-level schema: a destination must exist and the
    /// sensor list must be well-formed. Transform and path problems are
    /// deliberately not checked here; those degrade per-sensor at read
    /// time instead of aborting the batch.
    pub fn validate(&self, file: &str) -> Result<(), ConfigError> {
        if self.rrd_path.as_deref().map_or(true, |p| p.is_empty()) {
            return Err(ConfigError::MissingRrdPath(file.to_string()));
        }
        if self.sensors.is_empty() {
            return Err(ConfigError::NoSensors(file.to_string()));
        }
        for (i, sensor) in self.sensors.iter().enumerate() {
            if self.sensors[..i].iter().any(|s| s.id == sensor.id) {
                return Err(ConfigError::DuplicateSensorId {
                    id: sensor.id.clone(),
                    file: file.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Everything `validate` checks, plus transform expressions are parsed
    /// so the check command catches typos before they cost a data point.
    pub fn validate_strict(&self, file: &str) -> Result<(), ConfigError> {
        self.validate(file)?;
        for sensor in &self.sensors {
            if let Some(expr) = sensor.transform.as_deref() {
                transform::parse(expr).map_err(|source| ConfigError::InvalidTransform {
                    id: sensor.id.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// The rrd section, required when creating the database.
    pub fn rrd_settings(&self, file: &str) -> Result<&RrdSettings, ConfigError> {
        self.rrd
            .as_ref()
            .filter(|r| !r.archives.is_empty())
            .ok_or_else(|| ConfigError::MissingRrdSettings(file.to_string()))
    }
}

/// Loads a config file, dispatching on extension: `.json` and `.toml` are
/// parsed as such, everything else defaults to YAML.
pub fn load_config(path: &Path) -> Result<CollectorConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: CollectorConfig = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: CollectorConfig = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            let config: CollectorConfig = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Prints a parsed configuration in the requested format.
pub fn show_config(
    config: &CollectorConfig,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    println!("{output}");
    Ok(())
}
