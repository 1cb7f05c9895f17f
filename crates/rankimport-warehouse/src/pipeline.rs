//! Import and balance-sheet pipelines.
//!
//! Both run strictly in sequence on the calling thread: parse, enrich, write
//! the parquet file, upsert, then append one `ingest_log` row.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rankimport_core::{
    collect_balance_sheets, enrich, enrich_balance_sheets, parse_report, parse_report_date,
    EnrichReport, ExemptExchanges, TickerCapture, ValidationError,
};
use serde::Serialize;
use thiserror::Error;
use time::Date;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::columnar::{write_parquet, ColumnarError, WriteReport};
use crate::{IngestLogEntry, IngestStatus, SaveReport, Warehouse, WarehouseError};

const SCREENER_DATASET: &str = "screener";
const BALANCE_SHEET_DATASET: &str = "balance_sheet";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no records parsed from {source_name}")]
    NoRecords { source_name: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Columnar(#[from] ColumnarError),
}

/// Inputs of one screener import.
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// File name or other label of the export, used in logs.
    pub source_name: String,
    /// `YYYY-MM-DD` date stamped on every record.
    pub report_date: String,
    /// Maximum rows kept; zero keeps every row.
    pub limit: usize,
    pub output_path: PathBuf,
    pub exempt: ExemptExchanges,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub request_id: String,
    pub source_name: String,
    pub report_date: String,
    pub parsed: usize,
    pub enrichment: EnrichReport,
    pub label_warnings: usize,
    pub parquet_path: PathBuf,
    pub parquet: WriteReport,
    pub saved: SaveReport,
    pub latency_ms: u64,
}

pub struct ImportPipeline<'a> {
    warehouse: &'a Warehouse,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(warehouse: &'a Warehouse) -> Self {
        Self { warehouse }
    }

    /// Parse `raw`, enrich, write the parquet file and upsert.
    ///
    /// Zero parsed records is [`PipelineError::NoRecords`]; the parquet file is
    /// not written in that case.
    pub fn run(&self, raw: &[u8], job: &ImportJob) -> Result<ImportReport, PipelineError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let event_date = parse_report_date(&job.report_date)?;

        let mut progress = Progress::default();
        let result = self.run_steps(raw, job, request_id, started, &mut progress);

        let entry = match &result {
            Ok(report) => IngestLogEntry {
                request_id,
                dataset: SCREENER_DATASET,
                source_name: job.source_name.clone(),
                event_date: Some(event_date),
                status: IngestStatus::Ok,
                parsed: report.parsed as u64,
                saved: report.saved.saved as u64,
                failed: report.saved.failed as u64,
                latency_ms: report.latency_ms,
            },
            Err(err) => IngestLogEntry {
                request_id,
                dataset: SCREENER_DATASET,
                source_name: job.source_name.clone(),
                event_date: Some(event_date),
                status: match err {
                    PipelineError::NoRecords { .. } => IngestStatus::Empty,
                    _ => IngestStatus::Failed,
                },
                parsed: progress.parsed as u64,
                saved: progress.saved.saved as u64,
                failed: progress.saved.failed as u64,
                latency_ms: elapsed_ms(started),
            },
        };
        record_ingest(self.warehouse, &entry);

        result
    }

    fn run_steps(
        &self,
        raw: &[u8],
        job: &ImportJob,
        request_id: Uuid,
        started: Instant,
        progress: &mut Progress,
    ) -> Result<ImportReport, PipelineError> {
        let ingest = parse_report(raw, &job.report_date, job.limit);
        let mut records = ingest.records;
        if records.is_empty() {
            return Err(PipelineError::NoRecords {
                source_name: job.source_name.clone(),
            });
        }
        progress.parsed = records.len();
        info!(source = %job.source_name, count = records.len(), "parsed screener export");

        let snapshot = self.warehouse.lookup_active_tickers()?;
        let enrichment = enrich(&mut records, &snapshot, &job.exempt);

        // A parquet failure must not keep the records out of DuckDB.
        let parquet = write_parquet(&records, &job.output_path);
        let saved = self.warehouse.save_screener_records(&records)?;
        progress.saved = saved;
        let parquet = parquet.inspect_err(|err| {
            error!(path = %job.output_path.display(), error = %err, "failed to write parquet file");
        })?;

        let report = ImportReport {
            request_id: request_id.to_string(),
            source_name: job.source_name.clone(),
            report_date: job.report_date.clone(),
            parsed: records.len(),
            enrichment,
            label_warnings: ingest.label_warnings.len(),
            parquet_path: job.output_path.clone(),
            parquet,
            saved,
            latency_ms: elapsed_ms(started),
        };

        info!(
            request_id = %report.request_id,
            parsed = report.parsed,
            resolved = report.enrichment.resolved,
            saved = report.saved.saved,
            "import finished"
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetReport {
    pub request_id: String,
    pub tickers: usize,
    pub records: usize,
    pub excluded: Vec<String>,
    pub enrichment: EnrichReport,
    pub saved: SaveReport,
    pub parquet_path: PathBuf,
    pub parquet: WriteReport,
    pub latency_ms: u64,
}

pub struct BalanceSheetPipeline<'a> {
    warehouse: &'a Warehouse,
}

impl<'a> BalanceSheetPipeline<'a> {
    pub fn new(warehouse: &'a Warehouse) -> Self {
        Self { warehouse }
    }

    /// Turn captured tables into records, record exclusions, enrich, save and
    /// write `output_path`.
    pub fn run(
        &self,
        captures: &[TickerCapture],
        download_date: Date,
        output_path: &Path,
    ) -> Result<BalanceSheetReport, PipelineError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        let mut progress = Progress::default();
        let result = self.run_steps(
            captures,
            download_date,
            output_path,
            request_id,
            started,
            &mut progress,
        );

        let entry = IngestLogEntry {
            request_id,
            dataset: BALANCE_SHEET_DATASET,
            source_name: output_path.display().to_string(),
            event_date: Some(download_date),
            status: if result.is_ok() {
                IngestStatus::Ok
            } else {
                IngestStatus::Failed
            },
            parsed: progress.parsed as u64,
            saved: progress.saved.saved as u64,
            failed: progress.saved.failed as u64,
            latency_ms: elapsed_ms(started),
        };
        record_ingest(self.warehouse, &entry);

        result
    }

    fn run_steps(
        &self,
        captures: &[TickerCapture],
        download_date: Date,
        output_path: &Path,
        request_id: Uuid,
        started: Instant,
        progress: &mut Progress,
    ) -> Result<BalanceSheetReport, PipelineError> {
        let collected = collect_balance_sheets(captures, download_date, self.warehouse);
        let mut records = collected.records;
        progress.parsed = records.len();

        let snapshot = self.warehouse.lookup_active_tickers()?;
        let enrichment = enrich_balance_sheets(&mut records, &snapshot);

        let saved = self.warehouse.save_balance_sheets(&records)?;
        progress.saved = saved;
        let parquet = write_parquet(&records, output_path)?;

        Ok(BalanceSheetReport {
            request_id: request_id.to_string(),
            tickers: captures.len(),
            records: records.len(),
            excluded: collected
                .excluded
                .into_iter()
                .map(String::from)
                .collect(),
            enrichment,
            saved,
            parquet_path: output_path.to_path_buf(),
            parquet,
            latency_ms: elapsed_ms(started),
        })
    }
}

/// Counts reached before a run stopped, for the ingest log.
#[derive(Debug, Default)]
struct Progress {
    parsed: usize,
    saved: SaveReport,
}

fn record_ingest(warehouse: &Warehouse, entry: &IngestLogEntry) {
    if let Err(err) = warehouse.log_ingest(entry) {
        warn!(request_id = %entry.request_id, error = %err, "could not write ingest log");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
