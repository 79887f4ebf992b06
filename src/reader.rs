//! Single-sensor reads with failure normalization.
//!
//! Every failure mode of an individual sensor — unresolvable chip,
//! unreadable file, non-numeric content, bad transform, missing disk
//! record — is caught here and converted into a missing reading plus a
//! logged diagnostic. Nothing a single sensor does can abort the batch or
//! shift later sensors out of position.

use crate::config::{SensorSpec, SourceKind};
use crate::disks::{DiskLookupError, DiskRecordStore};
use crate::resolver::ChipResolver;
use crate::transform::{self, TransformError};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// disks.ini values meaning "spun down" or "no data". A missing reading,
/// not a fault.
const SENTINELS: [&str; 2] = ["*", "-"];

/// Disks.ini field read when a disk sensor does not name one.
const DEFAULT_DISK_FIELD: &str = "temp";

/// Why one sensor produced no reading. Variants stay distinct so operators
/// can tell a stale config from a flaky file from a bad transform.
#[derive(Debug, Error)]
pub enum ReadFailure {
    #[error("no path configured")]
    MissingPath,

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("non-numeric content '{0}'")]
    Parse(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The transform produced inf or NaN (e.g. division by zero). The sink
    /// must never see these as data; a missing reading is distinct from a
    /// fabricated one.
    #[error("non-finite result {0} after transform")]
    NonFinite(f64),

    #[error("no disk_id configured")]
    MissingDiskId,

    #[error(transparent)]
    Lookup(#[from] DiskLookupError),
}

/// Reads one sensor at a time, dispatching on the source kind.
pub struct SensorReader {
    resolver: ChipResolver,
    disks: DiskRecordStore,
}

impl SensorReader {
    pub fn new(resolver: ChipResolver, disks: DiskRecordStore) -> Self {
        Self { resolver, disks }
    }

    /// Reads one sensor. `None` means no reading this cycle; the reason has
    /// already been logged. Never panics, never propagates.
    pub fn read(&self, spec: &SensorSpec, kind: SourceKind) -> Option<f64> {
        let outcome = match kind {
            SourceKind::Sysfs => self.read_sysfs(spec),
            SourceKind::UnraidDisk => self.read_disk(spec),
        };

        match outcome {
            Ok(Some(value)) => {
                info!("{}: {}{}", spec.label(), value, spec.unit);
                Some(value)
            }
            // Sentinel or absent field, logged at the site as a skip.
            Ok(None) => None,
            Err(e) => {
                warn!("error reading {}: {}", spec.label(), e);
                None
            }
        }
    }

    fn read_sysfs(&self, spec: &SensorSpec) -> Result<Option<f64>, ReadFailure> {
        let template = spec.path.as_deref().ok_or(ReadFailure::MissingPath)?;
        let path = self.resolver.to_container_path(template);

        let raw = fs::read_to_string(&path).map_err(|source| ReadFailure::Read {
            path: path.clone(),
            source,
        })?;

        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ReadFailure::Parse(raw.trim().to_string()))?;

        let value = transform::apply(value, spec.transform.as_deref())?;
        if !value.is_finite() {
            return Err(ReadFailure::NonFinite(value));
        }

        Ok(Some(value))
    }

    fn read_disk(&self, spec: &SensorSpec) -> Result<Option<f64>, ReadFailure> {
        let serial = spec.disk_id.as_deref().ok_or(ReadFailure::MissingDiskId)?;
        let field = spec.field.as_deref().unwrap_or(DEFAULT_DISK_FIELD);

        let record = self.disks.lookup(serial)?;

        let raw = match record.fields.get(field) {
            Some(raw) => raw,
            None => {
                info!("{}: no {} data", spec.label(), field);
                return Ok(None);
            }
        };

        if SENTINELS.contains(&raw.as_str()) {
            info!("{}: {}={} (skipping)", spec.label(), field, raw);
            return Ok(None);
        }

        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ReadFailure::Parse(raw.clone()))?;

        let mut value = transform::apply(value, spec.transform.as_deref())?;
        if !value.is_finite() {
            return Err(ReadFailure::NonFinite(value));
        }

        // COUNTER/DERIVE/ABSOLUTE series must carry integers.
        if spec.ds_type.is_counter_like() {
            value = value.trunc();
        }

        Ok(Some(value))
    }
}
