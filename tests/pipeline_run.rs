//! End-to-end pipeline runs over file-backed sources and sinks.

use std::io::Write;
use std::path::{Path, PathBuf};

use postdump::config::{
    DestinationConfig, PipelineConfig, RecordErrorPolicy, ResourceConfig, SourceConfig,
};
use postdump::engine::{run_pipeline, ExecutionOptions};
use postdump::record::PostRecord;
use postdump::schema::{CreateDisposition, TableSchema, WriteDisposition};
use postdump::sink::JsonlRecordSink;
use postdump::source::JsonlRowSource;

fn write_source_file(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("post.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

fn config(source: &Path, dest: &Path, policy: RecordErrorPolicy) -> PipelineConfig {
    PipelineConfig {
        version: "1.0".into(),
        pipeline: "post_daily_dump".into(),
        source: SourceConfig {
            path: source.to_path_buf(),
            page_size: 3,
        },
        destination: DestinationConfig {
            path: dest.to_path_buf(),
            write_disposition: WriteDisposition::Truncate,
            create_disposition: CreateDisposition::CreateIfNeeded,
        },
        on_record_error: policy,
        dlq_path: None,
        resources: ResourceConfig {
            parallelism: 2,
            batch_size: 2,
        },
    }
}

fn good_line(i: usize) -> String {
    format!(
        r#"{{"key":"post-{i}","cells":{{"post":{{"user":"user-{i}","message":"msg {i}"}},"location":{{"lat":"37.{i}","lon":"-122.{i}"}}}}}}"#
    )
}

const BAD_LAT_LINE: &str = r#"{"key":"post-bad","cells":{"post":{"user":"mallory","message":"oops"},"location":{"lat":"N/A","lon":"0.0"}}}"#;

fn read_records(path: &Path) -> Vec<PostRecord> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn full_refresh_replaces_table_contents() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..7).map(good_line).collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let source_path = write_source_file(dir.path(), &line_refs);
    let dest_path = dir.path().join("out").join("daily_dump.jsonl");

    let cfg = config(&source_path, &dest_path, RecordErrorPolicy::Fail);

    // First run creates the table.
    let summary = run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&source_path)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(summary.rows_read, 7);
    assert_eq!(summary.records_written, 7);
    assert!(summary.bytes_written > 0);

    let mut ids: Vec<String> = read_records(&dest_path)
        .into_iter()
        .map(|r| r.post_id)
        .collect();
    ids.sort();
    let mut expected: Vec<String> = (0..7).map(|i| format!("post-{i}")).collect();
    expected.sort();
    assert_eq!(ids, expected);

    // Schema sidecar declared alongside the table.
    let sidecar = dir.path().join("out").join("daily_dump.jsonl.schema.json");
    let schema: TableSchema =
        serde_json::from_str(&std::fs::read_to_string(sidecar).unwrap()).unwrap();
    assert_eq!(schema, TableSchema::post_dump());

    // Second run over a smaller source replaces, not appends.
    let small = write_source_file(dir.path(), &[&good_line(100)]);
    let cfg2 = config(&small, &dest_path, RecordErrorPolicy::Fail);
    run_pipeline(
        &cfg2,
        Box::new(JsonlRowSource::new(&small)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    let records = read_records(&dest_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].post_id, "post-100");
}

#[tokio::test]
async fn field_values_survive_the_full_path() {
    let dir = tempfile::tempdir().unwrap();
    let line = r#"{"key":"post-42","cells":{"post":{"user":"alice","message":"hello world"},"location":{"lat":"37.77","lon":"-122.41"}}}"#;
    let source_path = write_source_file(dir.path(), &[line]);
    let dest_path = dir.path().join("dump.jsonl");
    let cfg = config(&source_path, &dest_path, RecordErrorPolicy::Fail);

    run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&source_path)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    let records = read_records(&dest_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].post_id, "post-42");
    assert_eq!(records[0].user, "alice");
    assert_eq!(records[0].message, "hello world");
    assert_eq!(records[0].lat, 37.77);
    assert_eq!(records[0].lon, -122.41);
}

#[tokio::test]
async fn failed_run_leaves_previous_table_intact() {
    let dir = tempfile::tempdir().unwrap();
    let dest_path = dir.path().join("dump.jsonl");

    // Seed the table with a successful run.
    let seed = write_source_file(dir.path(), &[&good_line(1)]);
    let cfg = config(&seed, &dest_path, RecordErrorPolicy::Fail);
    run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&seed)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    // A run that hits a malformed lat under the fail policy must abort
    // without touching the committed table.
    let lines = [good_line(2), BAD_LAT_LINE.to_string(), good_line(3)];
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let bad_source = write_source_file(dir.path(), &line_refs);
    let cfg2 = config(&bad_source, &dest_path, RecordErrorPolicy::Fail);

    let err = run_pipeline(
        &cfg2,
        Box::new(JsonlRowSource::new(&bad_source)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(err.as_record_error().is_some(), "expected a record error: {err}");

    let records = read_records(&dest_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].post_id, "post-1");
    assert!(!dir.path().join("dump.jsonl.staging").exists());
}

#[tokio::test]
async fn skip_policy_completes_with_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let lines = [good_line(1), BAD_LAT_LINE.to_string(), good_line(2)];
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let source_path = write_source_file(dir.path(), &line_refs);
    let dest_path = dir.path().join("dump.jsonl");
    let cfg = config(&source_path, &dest_path, RecordErrorPolicy::Skip);

    let summary = run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&source_path)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.records_skipped, 1);
    assert!(read_records(&dest_path)
        .iter()
        .all(|r| r.post_id != "post-bad"));
}

#[tokio::test]
async fn dlq_policy_persists_dead_rows() {
    let dir = tempfile::tempdir().unwrap();
    let missing_message =
        r#"{"key":"post-nm","cells":{"post":{"user":"carol"},"location":{"lat":"1.0","lon":"2.0"}}}"#;
    let lines = [good_line(1), missing_message.to_string()];
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let source_path = write_source_file(dir.path(), &line_refs);
    let dest_path = dir.path().join("dump.jsonl");
    let dlq_path = dir.path().join("dlq.jsonl");

    let mut cfg = config(&source_path, &dest_path, RecordErrorPolicy::Dlq);
    cfg.dlq_path = Some(dlq_path.clone());

    let summary = run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&source_path)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.records_dlq, 1);

    let dlq_contents = std::fs::read_to_string(&dlq_path).unwrap();
    assert_eq!(dlq_contents.lines().count(), 1);
    assert!(dlq_contents.contains("post-nm"));
    assert!(dlq_contents.contains("missing cell post:message"));
}

#[tokio::test]
async fn dry_run_never_touches_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_source_file(dir.path(), &[&good_line(1)]);
    let dest_path = dir.path().join("dump.jsonl");
    let cfg = config(&source_path, &dest_path, RecordErrorPolicy::Fail);

    let summary = run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&source_path)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions {
            dry_run: true,
            limit: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.records_written, 1);
    assert!(!dest_path.exists());
}

#[tokio::test]
async fn malformed_source_line_aborts_before_commit() {
    let dir = tempfile::tempdir().unwrap();
    let dest_path = dir.path().join("dump.jsonl");

    let seed = write_source_file(dir.path(), &[&good_line(1)]);
    let cfg = config(&seed, &dest_path, RecordErrorPolicy::Fail);
    run_pipeline(
        &cfg,
        Box::new(JsonlRowSource::new(&seed)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap();

    let lines = [good_line(2), "not json at all".to_string()];
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let broken = write_source_file(dir.path(), &line_refs);
    let cfg2 = config(&broken, &dest_path, RecordErrorPolicy::Skip);

    let err = run_pipeline(
        &cfg2,
        Box::new(JsonlRowSource::new(&broken)),
        Box::new(JsonlRecordSink::new(&dest_path)),
        ExecutionOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(err.as_record_error().is_none(), "source I/O error is not a record error");

    // Committed table untouched.
    assert_eq!(read_records(&dest_path).len(), 1);
}

#[tokio::test]
async fn append_disposition_accumulates_runs() {
    let dir = tempfile::tempdir().unwrap();
    let dest_path = dir.path().join("dump.jsonl");

    for i in 0..2 {
        let line = good_line(i);
        let source_path = write_source_file(dir.path(), &[&line]);
        let mut cfg = config(&source_path, &dest_path, RecordErrorPolicy::Fail);
        cfg.destination.write_disposition = WriteDisposition::Append;
        run_pipeline(
            &cfg,
            Box::new(JsonlRowSource::new(&source_path)),
            Box::new(JsonlRecordSink::new(&dest_path)),
            ExecutionOptions::default(),
        )
        .await
        .unwrap();
    }

    assert_eq!(read_records(&dest_path).len(), 2);
}
