//! Bounded worker-pool runner.
//!
//! Three stages connected by bounded channels: a reader task pages rows out
//! of the [`RowSource`], `parallelism` workers map them through the row
//! transformer, and a writer task batches records into the [`RecordSink`] and
//! commits once at the end. Rows carry no ordering requirement, so workers
//! are free to interleave.
//!
//! Errors flow downstream: a source failure is forwarded through the worker
//! stage to the writer, which aborts without committing, so a failed run
//! never truncates the previous table contents.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{PipelineConfig, RecordErrorPolicy};
use crate::dlq::{DlqRecord, DlqWriter};
use crate::engine::result::{CheckResult, RunSummary};
use crate::error::PipelineError;
use crate::record::PostRecord;
use crate::row::SourceRow;
use crate::schema::TableSchema;
use crate::sink::RecordSink;
use crate::source::RowSource;
use crate::transform::transform_row;

/// Runtime execution options (not part of pipeline YAML config).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// Skip the sink, print records as JSON lines to stdout.
    pub dry_run: bool,
    /// Maximum rows to read from the source.
    pub limit: Option<u64>,
}

/// Per-run counters shared across stages.
#[derive(Debug, Default)]
struct RunStats {
    rows_read: u64,
    records_skipped: u64,
}

enum WorkerOutput {
    Record(PostRecord),
    Dead(DlqRecord),
}

fn lock_err(what: &str) -> PipelineError {
    PipelineError::Infrastructure(anyhow::anyhow!("{what} mutex poisoned"))
}

/// Validate source and sink connectivity without moving any data.
pub fn check_pipeline(source: &dyn RowSource, sink: &dyn RecordSink) -> CheckResult {
    CheckResult {
        source_validation: source.validate(),
        destination_validation: sink.validate(),
    }
}

/// Execute one pipeline run.
///
/// # Errors
///
/// Returns [`PipelineError::Record`] when a row fails to transform under the
/// `fail` policy, and [`PipelineError::Infrastructure`] for source, sink, or
/// host failures. On any error the sink is left uncommitted.
pub async fn run_pipeline(
    config: &PipelineConfig,
    source: Box<dyn RowSource>,
    sink: Box<dyn RecordSink>,
    options: ExecutionOptions,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    let stats = Arc::new(Mutex::new(RunStats::default()));

    let page_size = config.source.page_size;
    let batch_size = config.resources.batch_size;
    let parallelism = config.resources.parallelism.max(1);
    let policy = config.on_record_error;

    // A preview run must not mutate on-disk state, DLQ file included; dead
    // rows are still counted.
    let dlq_writer = match (policy, &config.dlq_path) {
        (RecordErrorPolicy::Dlq, Some(path)) if !options.dry_run => Some(DlqWriter::open(path)?),
        (RecordErrorPolicy::Dlq, None) => {
            return Err(PipelineError::Infrastructure(anyhow::anyhow!(
                "on_record_error 'dlq' requires a dlq_path"
            )))
        }
        _ => None,
    };

    let (row_tx, row_rx) = mpsc::channel::<Result<SourceRow, PipelineError>>(page_size.max(1) * 2);
    let (out_tx, out_rx) =
        mpsc::channel::<Result<WorkerOutput, PipelineError>>(batch_size.max(1) * 2);

    let reader = spawn_reader(source, row_tx, page_size, options.limit, Arc::clone(&stats));

    let row_rx = Arc::new(Mutex::new(row_rx));
    let mut workers = Vec::with_capacity(parallelism);
    for worker_id in 0..parallelism {
        workers.push(spawn_worker(
            worker_id,
            Arc::clone(&row_rx),
            out_tx.clone(),
            policy,
            Arc::clone(&stats),
        ));
    }
    // Only the workers may keep the channel ends alive; holding them here
    // would stall shutdown on an aborted run.
    drop(row_rx);
    drop(out_tx);

    let writer = spawn_writer(sink, out_rx, batch_size, options.dry_run, dlq_writer, config);

    let write_result = writer
        .await
        .map_err(|e| PipelineError::Infrastructure(anyhow::anyhow!("writer task panicked: {e}")))?;
    let reader_result = reader
        .await
        .map_err(|e| PipelineError::Infrastructure(anyhow::anyhow!("reader task panicked: {e}")))?;
    for worker in workers {
        worker.await.map_err(|e| {
            PipelineError::Infrastructure(anyhow::anyhow!("worker task panicked: {e}"))
        })??;
    }
    reader_result?;
    let (records_written, bytes_written, records_dlq) = write_result?;

    let stats = stats.lock().map_err(|_| lock_err("run stats"))?;
    let summary = RunSummary {
        rows_read: stats.rows_read,
        records_written,
        records_skipped: stats.records_skipped,
        records_dlq,
        bytes_written,
        duration_secs: start.elapsed().as_secs_f64(),
    };

    tracing::info!(
        pipeline = config.pipeline,
        rows_read = summary.rows_read,
        records_written = summary.records_written,
        records_skipped = summary.records_skipped,
        records_dlq = summary.records_dlq,
        duration_secs = format!("{:.2}", summary.duration_secs),
        "Pipeline run complete"
    );
    Ok(summary)
}

fn spawn_reader(
    mut source: Box<dyn RowSource>,
    row_tx: mpsc::Sender<Result<SourceRow, PipelineError>>,
    page_size: usize,
    limit: Option<u64>,
    stats: Arc<Mutex<RunStats>>,
) -> JoinHandle<Result<(), PipelineError>> {
    tokio::task::spawn_blocking(move || {
        let mut remaining = limit;
        loop {
            let page = match source.next_page(page_size) {
                Ok(page) => page,
                Err(e) => {
                    // Forward the failure downstream so the writer aborts
                    // before commit.
                    let _ = row_tx.blocking_send(Err(PipelineError::Infrastructure(e)));
                    return Ok(());
                }
            };
            if page.is_empty() {
                return Ok(());
            }
            for row in page {
                if let Some(0) = remaining {
                    return Ok(());
                }
                {
                    let mut s = stats.lock().map_err(|_| lock_err("run stats"))?;
                    s.rows_read += 1;
                }
                if let Some(n) = remaining.as_mut() {
                    *n -= 1;
                }
                if row_tx.blocking_send(Ok(row)).is_err() {
                    // Downstream shut down (abort or dry-run limit); stop
                    // scanning.
                    return Ok(());
                }
            }
        }
    })
}

fn spawn_worker(
    worker_id: usize,
    row_rx: Arc<Mutex<mpsc::Receiver<Result<SourceRow, PipelineError>>>>,
    out_tx: mpsc::Sender<Result<WorkerOutput, PipelineError>>,
    policy: RecordErrorPolicy,
    stats: Arc<Mutex<RunStats>>,
) -> JoinHandle<Result<(), PipelineError>> {
    tokio::task::spawn_blocking(move || {
        loop {
            let next = {
                let mut rx = row_rx.lock().map_err(|_| lock_err("row channel"))?;
                rx.blocking_recv()
            };
            let Some(next) = next else {
                return Ok(());
            };
            let row = match next {
                Ok(row) => row,
                Err(e) => {
                    let _ = out_tx.blocking_send(Err(e));
                    return Ok(());
                }
            };

            match transform_row(&row) {
                Ok(record) => {
                    if out_tx.blocking_send(Ok(WorkerOutput::Record(record))).is_err() {
                        return Ok(());
                    }
                }
                Err(err) => match policy {
                    RecordErrorPolicy::Fail => {
                        let _ = out_tx
                            .blocking_send(Err(PipelineError::record(row.key_lossy(), err)));
                        return Ok(());
                    }
                    RecordErrorPolicy::Skip => {
                        tracing::warn!(
                            worker = worker_id,
                            row_key = row.key_lossy(),
                            error = %err,
                            "Skipping row that failed to transform"
                        );
                        let mut s = stats.lock().map_err(|_| lock_err("run stats"))?;
                        s.records_skipped += 1;
                    }
                    RecordErrorPolicy::Dlq => {
                        let dead = DlqRecord::from_failure(&row, &err);
                        if out_tx.blocking_send(Ok(WorkerOutput::Dead(dead))).is_err() {
                            return Ok(());
                        }
                    }
                },
            }
        }
    })
}

fn spawn_writer(
    mut sink: Box<dyn RecordSink>,
    mut out_rx: mpsc::Receiver<Result<WorkerOutput, PipelineError>>,
    batch_size: usize,
    dry_run: bool,
    mut dlq_writer: Option<DlqWriter>,
    config: &PipelineConfig,
) -> JoinHandle<Result<(u64, u64, u64), PipelineError>> {
    let write_disposition = config.destination.write_disposition;
    let create_disposition = config.destination.create_disposition;

    tokio::task::spawn_blocking(move || {
        let schema = TableSchema::post_dump();
        if !dry_run {
            sink.begin(&schema, write_disposition, create_disposition)?;
        }

        let mut batch: Vec<PostRecord> = Vec::with_capacity(batch_size);
        let mut printed: u64 = 0;
        let mut dlq_count: u64 = 0;

        while let Some(next) = out_rx.blocking_recv() {
            match next? {
                WorkerOutput::Record(record) => {
                    if dry_run {
                        let line = serde_json::to_string(&record)
                            .context("Failed to serialize record")?;
                        println!("{line}");
                        printed += 1;
                    } else {
                        batch.push(record);
                        if batch.len() >= batch_size {
                            sink.write_batch(&batch)?;
                            batch.clear();
                        }
                    }
                }
                WorkerOutput::Dead(dead) => {
                    if let Some(writer) = dlq_writer.as_mut() {
                        writer.append(&dead)?;
                    } else if !dry_run {
                        tracing::warn!(
                            row_key = dead.row_key,
                            error = dead.error_message,
                            "Dead row dropped: no DLQ writer configured"
                        );
                    }
                    dlq_count += 1;
                }
            }
        }

        if dry_run {
            return Ok((printed, 0, dlq_count));
        }

        if !batch.is_empty() {
            sink.write_batch(&batch)?;
        }
        let summary = sink.commit()?;
        if let Some(writer) = dlq_writer {
            writer.finish()?;
        }
        Ok((summary.records_written, summary.bytes_written, dlq_count))
    })
}
