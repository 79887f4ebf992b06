//! One collection run: ordered sensor reads and sink submission.
//!
//! The result vector's length and order exactly match the configured
//! sensor list. That positional alignment is the whole contract with the
//! RRD: updates carry no names, only positions.

use crate::config::{SensorSpec, SourceKind};
use crate::reader::SensorReader;
use crate::sink::{SinkError, TimeSeriesSink};
use tracing::debug;

/// Token the sink understands as "no reading this cycle".
pub const MISSING_TOKEN: &str = "U";

/// Ordered readings, one per configured sensor.
pub type CollectionResult = Vec<Option<f64>>;

/// Drives one synchronous pass over a sensor list.
pub struct CollectionRun<'a> {
    reader: &'a SensorReader,
    sink: &'a dyn TimeSeriesSink,
}

impl<'a> CollectionRun<'a> {
    pub fn new(reader: &'a SensorReader, sink: &'a dyn TimeSeriesSink) -> Self {
        Self { reader, sink }
    }

    /// Reads every sensor strictly in declared order. Individual failures
    /// land as `None`; the run never terminates early and the result always
    /// has exactly one entry per spec.
    pub fn run(&self, specs: &[SensorSpec], kind: SourceKind) -> CollectionResult {
        let mut readings = Vec::with_capacity(specs.len());
        for spec in specs {
            readings.push(self.reader.read(spec, kind));
        }
        debug_assert_eq!(readings.len(), specs.len());
        readings
    }

    /// Submits the collected vector. Sink failure is the run's failure, but
    /// the readings themselves stay valid with the caller.
    pub fn submit(&self, specs: &[SensorSpec], result: &CollectionResult) -> Result<(), SinkError> {
        let point = datapoint(specs, result);
        debug!("submitting datapoint: {}", point);
        self.sink.update(&point)
    }
}

/// Renders the rrdtool update string `N:v1:v2:...`.
///
/// `N` stamps the sink's current time. Counter-like sensors render without
/// a fractional part; missing readings render as the `U` token so later
/// columns keep their positions.
pub fn datapoint(specs: &[SensorSpec], result: &CollectionResult) -> String {
    let mut tokens = Vec::with_capacity(result.len() + 1);
    tokens.push("N".to_string());

    for (spec, reading) in specs.iter().zip(result) {
        tokens.push(match reading {
            Some(value) if spec.ds_type.is_counter_like() => format!("{}", *value as i64),
            Some(value) => value.to_string(),
            None => MISSING_TOKEN.to_string(),
        });
    }

    tokens.join(":")
}
