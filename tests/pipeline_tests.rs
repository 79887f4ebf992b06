//! End-to-end collection tests: fake hwmon tree and disks.ini in, ordered
//! datapoint out. The sink is a recorder, so these cover everything short
//! of the rrdtool subprocess.

use rrdsense::collect::{datapoint, CollectionRun};
use rrdsense::config::{DsType, SensorSpec, SourceKind};
use rrdsense::disks::DiskRecordStore;
use rrdsense::reader::SensorReader;
use rrdsense::resolver::ChipResolver;
use rrdsense::sink::{SinkError, TimeSeriesSink};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct RecordingSink {
    updates: RefCell<Vec<String>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            updates: RefCell::new(Vec::new()),
        }
    }
}

impl TimeSeriesSink for RecordingSink {
    fn update(&self, point: &str) -> Result<(), SinkError> {
        self.updates.borrow_mut().push(point.to_string());
        Ok(())
    }
}

struct FailingSink;

impl TimeSeriesSink for FailingSink {
    fn update(&self, _point: &str) -> Result<(), SinkError> {
        Err(SinkError::UpdateFailed {
            path: PathBuf::from("/data/test.rrd"),
            stderr: "simulated failure".to_string(),
        })
    }
}

fn sensor(id: &str) -> SensorSpec {
    SensorSpec {
        id: id.to_string(),
        name: None,
        unit: String::new(),
        path: None,
        disk_id: None,
        field: None,
        transform: None,
        ds_type: DsType::Gauge,
        min: None,
        max: None,
    }
}

/// Fake mounted host /sys with one k10temp chip reporting 50000
/// millidegrees.
fn fake_sys() -> TempDir {
    let tmp = TempDir::new().expect("create tempdir");
    let chip = tmp.path().join("class").join("hwmon").join("hwmon0");
    fs::create_dir_all(&chip).expect("create chip dir");
    fs::write(chip.join("name"), "k10temp\n").expect("write name");
    fs::write(chip.join("temp1_input"), "50000\n").expect("write reading");
    tmp
}

fn reader_for(sys: &TempDir, disks_ini: &str) -> SensorReader {
    let ini = sys.path().join("disks.ini");
    fs::write(&ini, disks_ini).expect("write disks.ini");
    SensorReader::new(ChipResolver::new(sys.path()), DiskRecordStore::new(&ini))
}

#[test]
fn sysfs_run_transforms_and_aligns_readings() {
    let sys = fake_sys();
    let reader = reader_for(&sys, "");

    let mut cpu = sensor("cpu_temp");
    cpu.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));
    cpu.transform = Some("value / 1000".to_string());
    cpu.unit = "°C".to_string();

    let mut missing = sensor("board_temp");
    missing.path = Some(format!("{}/{{k10temp}}/temp9_input", sys.path().display()));

    let mut raw = sensor("cpu_temp_raw");
    raw.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));

    let specs = vec![cpu, missing, raw];
    let sink = RecordingSink::new();
    let run = CollectionRun::new(&reader, &sink);

    let result = run.run(&specs, SourceKind::Sysfs);
    assert_eq!(result.len(), specs.len());
    assert_eq!(result[0], Some(50.0));
    assert_eq!(result[1], None);
    assert_eq!(result[2], Some(50000.0));

    run.submit(&specs, &result).expect("recording sink accepts");
    let updates = sink.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0], "N:50:U:50000");
}

#[test]
fn every_sensor_failing_still_yields_a_full_vector() {
    let sys = fake_sys();
    let reader = reader_for(&sys, "");

    let specs: Vec<SensorSpec> = (0..5)
        .map(|i| {
            let mut s = sensor(&format!("s{}", i));
            s.path = Some(format!("{}/nope/file{}", sys.path().display(), i));
            s
        })
        .collect();

    let sink = RecordingSink::new();
    let run = CollectionRun::new(&reader, &sink);
    let result = run.run(&specs, SourceKind::Sysfs);

    assert_eq!(result.len(), 5);
    assert!(result.iter().all(Option::is_none));
    assert_eq!(datapoint(&specs, &result), "N:U:U:U:U:U");
}

#[test]
fn disk_run_handles_sentinels_and_counter_coercion() {
    let sys = fake_sys();
    let reader = reader_for(
        &sys,
        "[disk1]\nidSb=ABC123\ntemp=*\nnumReads=123456\n[disk2]\nidSb=DEF456\ntemp=39\n",
    );

    let mut spun_down = sensor("disk1_temp");
    spun_down.disk_id = Some("ABC123".to_string());

    let mut reads = sensor("disk1_reads");
    reads.disk_id = Some("ABC123".to_string());
    reads.field = Some("numReads".to_string());
    reads.ds_type = DsType::Counter;
    reads.transform = Some("value / 2".to_string());

    let mut active = sensor("disk2_temp");
    active.disk_id = Some("DEF456".to_string());

    let mut unconfigured = sensor("disk3_temp"); // no disk_id
    unconfigured.field = Some("temp".to_string());

    let specs = vec![spun_down, reads, active, unconfigured];
    let sink = RecordingSink::new();
    let run = CollectionRun::new(&reader, &sink);

    let result = run.run(&specs, SourceKind::UnraidDisk);
    assert_eq!(result.len(), 4);
    // Spun down: missing, not an error.
    assert_eq!(result[0], None);
    // 123456 / 2, truncated for the counter series.
    assert_eq!(result[1], Some(61728.0));
    assert_eq!(result[2], Some(39.0));
    // Missing disk_id degrades like any other per-sensor fault.
    assert_eq!(result[3], None);

    run.submit(&specs, &result).expect("recording sink accepts");
    let updates = sink.updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0], "N:U:61728:39:U");
}

#[test]
fn sink_failure_does_not_invalidate_collected_values() {
    let sys = fake_sys();
    let reader = reader_for(&sys, "");

    let mut cpu = sensor("cpu_temp");
    cpu.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));

    let specs = vec![cpu];
    let run = CollectionRun::new(&reader, &FailingSink);

    let result = run.run(&specs, SourceKind::Sysfs);
    assert_eq!(result[0], Some(50000.0));

    let err = run.submit(&specs, &result).expect_err("sink fails");
    assert!(matches!(err, SinkError::UpdateFailed { .. }));

    // The vector is untouched and can be resubmitted elsewhere.
    assert_eq!(result[0], Some(50000.0));
}

#[test]
fn non_finite_transform_results_degrade_to_missing() {
    let sys = fake_sys();
    let reader = reader_for(&sys, "[disk1]\nidSb=ABC123\nnumReads=123456\n");

    // Gauge whose transform divides by zero: inf under IEEE semantics.
    let mut gauge_inf = sensor("gauge_inf");
    gauge_inf.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));
    gauge_inf.transform = Some("value / 0".to_string());

    // Counter-like sensors are the dangerous case: a raw cast would turn
    // NaN into 0 and inf into a huge integer, fabricating counter data.
    let mut counter_nan = sensor("counter_nan");
    counter_nan.disk_id = Some("ABC123".to_string());
    counter_nan.field = Some("numReads".to_string());
    counter_nan.ds_type = DsType::Counter;
    counter_nan.transform = Some("value % 0".to_string());

    let mut counter_inf = sensor("counter_inf");
    counter_inf.disk_id = Some("ABC123".to_string());
    counter_inf.field = Some("numReads".to_string());
    counter_inf.ds_type = DsType::Counter;
    counter_inf.transform = Some("value / 0".to_string());

    let mut intact = sensor("intact");
    intact.disk_id = Some("ABC123".to_string());
    intact.field = Some("numReads".to_string());
    intact.ds_type = DsType::Counter;

    let sink = RecordingSink::new();
    let run = CollectionRun::new(&reader, &sink);

    let gauge_result = run.run(&[gauge_inf.clone()], SourceKind::Sysfs);
    assert_eq!(gauge_result, vec![None]);

    let specs = vec![counter_nan, counter_inf, intact];
    let result = run.run(&specs, SourceKind::UnraidDisk);
    assert_eq!(result, vec![None, None, Some(123456.0)]);

    run.submit(&specs, &result).expect("recording sink accepts");
    let updates = sink.updates.borrow();
    assert_eq!(updates[0], "N:U:U:123456");
}

#[test]
fn bad_transform_degrades_only_the_affected_sensor() {
    let sys = fake_sys();
    let reader = reader_for(&sys, "");

    let mut good = sensor("good");
    good.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));
    good.transform = Some("value // 1000".to_string());

    let mut bad = sensor("bad");
    bad.path = Some(format!("{}/{{k10temp}}/temp1_input", sys.path().display()));
    bad.transform = Some("exec(value)".to_string());

    let specs = vec![good, bad];
    let sink = RecordingSink::new();
    let run = CollectionRun::new(&reader, &sink);

    let result = run.run(&specs, SourceKind::Sysfs);
    assert_eq!(result[0], Some(50.0));
    assert_eq!(result[1], None);
}
