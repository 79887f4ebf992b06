//! rrdsense — host sensor collection pipeline feeding RRD databases.
//!
//! The pipeline turns unstable host telemetry sources into a stable,
//! positionally ordered value vector:
//!
//! - **resolver**: hwmon directory indices change across reboots, so chips
//!   are located by the name their driver declares, and configured paths
//!   carry a `{chipname}` placeholder instead of an index.
//! - **transform**: per-sensor arithmetic expressions from config are
//!   evaluated over a closed grammar; config never becomes code.
//! - **disks**: Unraid's disks.ini snapshot, parsed fresh on every lookup
//!   and keyed by the stable serial field.
//! - **reader**: per-sensor dispatch; every failure degrades to a missing
//!   reading with a logged diagnostic instead of aborting the batch.
//! - **collect** / **sink**: ordered run assembly and positional submission
//!   via `rrdtool update`.
//!
//! # Usage
//!
//! ```no_run
//! use rrdsense::collect::CollectionRun;
//! use rrdsense::config::SourceKind;
//! use rrdsense::disks::DiskRecordStore;
//! use rrdsense::reader::SensorReader;
//! use rrdsense::resolver::ChipResolver;
//! use rrdsense::sink::RrdtoolSink;
//!
//! let reader = SensorReader::new(
//!     ChipResolver::new("/hostsys"),
//!     DiskRecordStore::new("/var/local/emhttp/disks.ini"),
//! );
//! let sink = RrdtoolSink::new("/data/system.rrd");
//! let run = CollectionRun::new(&reader, &sink);
//!
//! let sensors = Vec::new(); // from config
//! let result = run.run(&sensors, SourceKind::Sysfs);
//! run.submit(&sensors, &result).ok();
//! ```

pub mod cli;
pub mod collect;
pub mod commands;
pub mod config;
pub mod disks;
pub mod reader;
pub mod resolver;
pub mod sink;
pub mod transform;

// Re-export main types for convenience
pub use collect::{CollectionResult, CollectionRun};
pub use config::{CollectorConfig, DsType, SensorSpec, SourceKind};
pub use disks::{DiskRecord, DiskRecordStore};
pub use reader::SensorReader;
pub use resolver::ChipResolver;
pub use sink::{RrdtoolSink, SinkError, TimeSeriesSink};
pub use transform::TransformError;
