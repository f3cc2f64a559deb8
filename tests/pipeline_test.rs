//! Integration tests for the batch feature pipeline

use polygraph_features::batch::{BatchError, BatchRunner};
use polygraph_features::core::{SessionOutcome, SkipReason};
use polygraph_features::report::{render_csv, FileSink, OutputFormat};
use polygraph_features::runlog::create_shared_log;
use polygraph_features::source::{JsonSessionSource, SessionFile};
use std::path::{Path, PathBuf};

const SUFFIX: &str = "_processed.json";

fn test_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("polygraph-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

/// 2 channels, 10 seconds at 100 Hz.
fn write_session(dir: &Path, session_id: &str) {
    let resp: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.02).sin() * 3.0).collect();
    let gsr: Vec<f64> = (0..1000).map(|i| 5.0 + i as f64 * 0.001).collect();
    let file = SessionFile {
        signals: vec![resp, gsr],
        labels: vec!["Resp".to_string(), "GSR".to_string()],
        sampling_rate: 100.0,
    };
    std::fs::write(
        dir.join(format!("{session_id}{SUFFIX}")),
        serde_json::to_string(&file).expect("Failed to serialize session"),
    )
    .expect("Failed to write session");
}

fn write_log(dir: &Path, session_id: &str, content: &str) {
    std::fs::write(dir.join(format!("{session_id}.txt")), content).expect("Failed to write log");
}

#[test]
fn test_single_interval_round_trip() {
    let dir = test_dir();
    write_session(&dir, "subject01");
    write_log(&dir, "subject01", "\u{feff}2.0\tx\t5\tcontrol question\n4.0\tx\t6\n");

    let source = JsonSessionSource::new(&dir, SUFFIX);
    let ids = source.discover().expect("Failed to discover sessions");
    assert_eq!(ids, vec!["subject01"]);

    let report = BatchRunner::new(&source, &dir, "txt").run(&ids);
    let records = report.records();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.session, "subject01");
    assert_eq!(record.label.as_deref(), Some("control question"));
    assert_eq!(record.duration, 2.0);
    assert_eq!((record.range.start, record.range.end), (200, 400));
    assert!(record.channel("Resp").is_some());

    // The GSR ramp is linear, so its raw mean is the midpoint of the slice.
    let gsr = record.channel("GSR").expect("GSR features missing");
    let expected_mean = 5.0 + (200.0 + 399.0) / 2.0 * 0.001;
    assert!((gsr.mean - expected_mean).abs() < 1e-9);

    let output = dir.join("out").join("results.csv");
    let mut sink = FileSink::new(&output, OutputFormat::Csv);
    report.write_to(&mut sink).expect("Failed to write table");

    let csv = std::fs::read_to_string(&output).expect("Failed to read output");
    let header = csv.lines().next().expect("Missing header");
    assert_eq!(
        header,
        "session,label,start_time,end_time,duration,Resp_Line_Length,GSR_Line_Length,Resp_Mean,GSR_Mean"
    );
    assert_eq!(csv.lines().count(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_double_start_keeps_second_interval() {
    let dir = test_dir();
    write_session(&dir, "s");
    write_log(&dir, "s", "1.0 x 5 first\n3.0 x 5 second\n5.0 x 6\n");

    let source = JsonSessionSource::new(&dir, SUFFIX);
    let report = BatchRunner::new(&source, &dir, "txt").run(&["s".to_string()]);

    let records = report.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label.as_deref(), Some("second"));
    assert_eq!(records[0].start_time, 3.0);
    assert_eq!(report.sessions[0].log_warnings.len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_degenerate_interval_contributes_nothing() {
    let dir = test_dir();
    write_session(&dir, "s");
    write_log(&dir, "s", "5.0 x 5 instant\n5.0 x 6\n6.0 x 5 ok\n7.0 x 6\n");

    let source = JsonSessionSource::new(&dir, SUFFIX);
    let report = BatchRunner::new(&source, &dir, "txt").run(&["s".to_string()]);

    match &report.sessions[0].outcome {
        SessionOutcome::Processed { records, rejected } => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].label.as_deref(), Some("ok"));
            assert_eq!(rejected.len(), 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_empty_log_yields_no_output() {
    let dir = test_dir();
    write_session(&dir, "s");
    write_log(&dir, "s", "");

    let source = JsonSessionSource::new(&dir, SUFFIX);
    let run_log = create_shared_log();
    let report = BatchRunner::new(&source, &dir, "txt")
        .with_run_log(run_log.clone())
        .run(&["s".to_string()]);

    assert!(matches!(
        &report.sessions[0].outcome,
        SessionOutcome::Skipped {
            reason: SkipReason::NoIntervals
        }
    ));

    let output = dir.join("never.csv");
    let mut sink = FileSink::new(&output, OutputFormat::Csv);
    assert!(matches!(
        report.write_to(&mut sink),
        Err(BatchError::NoRecords { .. })
    ));
    assert!(!output.exists());
    assert_eq!(run_log.stats().sessions_skipped, 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_constant_channel_surfaces_nan() {
    let dir = test_dir();
    let file = SessionFile {
        signals: vec![vec![1.0; 200], (0..200).map(f64::from).collect()],
        labels: vec!["Flat".to_string(), "Ramp".to_string()],
        sampling_rate: 20.0,
    };
    std::fs::write(
        dir.join(format!("flat{SUFFIX}")),
        serde_json::to_string(&file).expect("Failed to serialize session"),
    )
    .expect("Failed to write session");
    write_log(&dir, "flat", "1.0 x 5\n2.0 x 6\n");

    let source = JsonSessionSource::new(&dir, SUFFIX);
    let report = BatchRunner::new(&source, &dir, "txt").run(&["flat".to_string()]);

    let records = report.records();
    assert_eq!(records.len(), 1);
    let ramp = records[0].channel("Ramp").expect("Ramp features missing");
    // 19 unit steps over 20 consecutive integers, population std sqrt(399 / 12)
    let expected = 19.0 / (399.0_f64 / 12.0).sqrt();
    assert!((ramp.line_length - expected).abs() < 1e-9);
    assert!((ramp.mean - 29.5).abs() < 1e-9);

    let csv = render_csv(&report.table());
    let row = csv.lines().nth(1).expect("Missing data row");
    assert!(row.starts_with("flat,,1,2,1,NaN,"));

    std::fs::remove_dir_all(&dir).ok();
}
