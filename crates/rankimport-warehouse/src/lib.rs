//! # rankimport warehouse
//!
//! DuckDB-backed relational sink, parquet writer and the two pipelines that
//! tie ingestion, enrichment and both sinks together.
//!
//! ## Tables
//!
//! | Table | Key | Written by |
//! |-------|-----|------------|
//! | `assets` | none (reference data) | another system; seeded in tests |
//! | `screener_facts` | `(ticker, composite_figi, event_date)` | [`Warehouse::save_screener_records`] |
//! | `fundamentals` | `(composite_figi, calendar_date, dim)` | [`Warehouse::save_balance_sheets`] |
//! | `balance_sheet_exclusions` | append-only | [`Warehouse::insert_exclusion`] |
//! | `ingest_log` | append-only | [`Warehouse::log_ingest`] |
//!
//! Every statement binds its values as parameters. Batches are not wrapped in
//! a transaction: each row commits on its own, and a failed row is logged and
//! counted without stopping the batch.
//!
//! ```rust,no_run
//! use rankimport_warehouse::{Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::new("rankimport.duckdb"))?;
//!     let snapshot = warehouse.lookup_active_tickers()?;
//!     println!("{} active tickers", snapshot.len());
//!     Ok(())
//! }
//! ```

pub mod columnar;
pub mod duckdb;
pub mod migrations;
pub mod pipeline;
mod sql;
pub mod views;

use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{params_from_iter, ToSql};
use rankimport_core::{
    BalanceSheetRecord, DatabaseConfig, PendingTarget, ReferenceSnapshot, ReferenceStore,
    ScreenerRecord, Tabular, Ticker, TickerReference, SCREENER_COLUMNS,
};
use serde::Serialize;
use thiserror::Error;
use time::{Date, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use columnar::{write_parquet, ColumnarError, WriteReport};
pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use pipeline::{
    BalanceSheetPipeline, BalanceSheetReport, ImportJob, ImportPipeline, ImportReport,
    PipelineError,
};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("duckdb connection pool lock poisoned")]
    PoolPoisoned,
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub db_path: PathBuf,
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            max_pool_size: 4,
        }
    }
}

impl From<&DatabaseConfig> for WarehouseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            db_path: config.path.clone(),
            max_pool_size: config.max_pool_size,
        }
    }
}

/// Row counts for one relational save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub attempted: usize,
    pub saved: usize,
    /// Records without a composite FIGI; never sent to the database.
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Ok,
    Empty,
    Failed,
}

impl IngestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}

/// One `ingest_log` row, written once per pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestLogEntry {
    pub request_id: Uuid,
    pub dataset: &'static str,
    pub source_name: String,
    pub event_date: Option<Date>,
    pub status: IngestStatus,
    pub parsed: u64,
    pub saved: u64,
    pub failed: u64,
    pub latency_ms: u64,
}

#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
    screener_upsert: String,
}

impl Warehouse {
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self {
            manager,
            screener_upsert: sql::insert_or_replace(migrations::SCREENER_TABLE, SCREENER_COLUMNS),
        };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Borrow a pooled connection for ad-hoc statements.
    pub fn acquire(&self) -> Result<PooledConnection, WarehouseError> {
        self.manager.acquire()
    }

    /// Every active asset with a composite FIGI, keyed by ticker.
    pub fn lookup_active_tickers(&self) -> Result<ReferenceSnapshot, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT ticker, COALESCE(name, ''), composite_figi FROM assets \
             WHERE active AND composite_figi IS NOT NULL AND composite_figi <> ''",
        )?;
        let references = statement
            .query_map([], |row| {
                Ok(TickerReference {
                    ticker: row.get(0)?,
                    company_name: row.get(1)?,
                    composite_figi: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = references.len(), "loaded active tickers");
        Ok(ReferenceSnapshot::from_rows(references))
    }

    pub fn lookup_composite_figi(&self, ticker: &str) -> Result<Option<String>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT composite_figi FROM assets \
             WHERE ticker = ? AND active AND composite_figi IS NOT NULL \
             ORDER BY composite_figi LIMIT 1",
        )?;
        let mut rows = statement.query([ticker])?;
        let figi = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(figi)
    }

    /// Append an exclusion row for `ticker`.
    ///
    /// The identifier lookup is best-effort: an inactive ticker or a failed
    /// lookup stores an empty identifier.
    pub fn insert_exclusion(&self, ticker: &Ticker) -> Result<(), WarehouseError> {
        let composite_figi = match self.lookup_composite_figi(ticker.as_str()) {
            Ok(Some(figi)) => figi,
            Ok(None) => String::new(),
            Err(err) => {
                warn!(ticker = %ticker, error = %err, "could not look up composite figi for exclusion");
                String::new()
            }
        };

        let connection = self.manager.acquire()?;
        let ticker_text = ticker.as_str();
        let params: [&dyn ToSql; 2] = [&ticker_text, &composite_figi];
        connection.execute(
            "INSERT INTO balance_sheet_exclusions (ticker, composite_figi, created_at) \
             VALUES (?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;

        info!(ticker = %ticker, composite_figi = %composite_figi, "recorded balance sheet exclusion");
        Ok(())
    }

    /// Upsert screener records keyed by `(ticker, composite_figi, event_date)`.
    ///
    /// Records without a composite FIGI are skipped. On conflict every column
    /// takes the incoming value.
    pub fn save_screener_records(
        &self,
        records: &[ScreenerRecord],
    ) -> Result<SaveReport, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut report = SaveReport::default();

        for record in records {
            report.attempted += 1;
            if record.composite_figi.is_empty() {
                report.skipped += 1;
                continue;
            }

            let values: Vec<_> = record.cells().into_iter().map(sql::bind_value).collect();
            match connection.execute(self.screener_upsert.as_str(), params_from_iter(values.iter()))
            {
                Ok(_) => report.saved += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(key = %record.row_key(), error = %err, "failed to save screener record");
                }
            }
        }

        info!(
            attempted = report.attempted,
            saved = report.saved,
            skipped = report.skipped,
            failed = report.failed,
            "saved screener records"
        );
        Ok(report)
    }

    /// Upsert current assets, current liabilities and working capital keyed by
    /// `(composite_figi, calendar_date, dim)`.
    ///
    /// `event_date` on an existing row is left alone.
    pub fn save_balance_sheets(
        &self,
        records: &[BalanceSheetRecord],
    ) -> Result<SaveReport, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut report = SaveReport::default();

        for record in records {
            report.attempted += 1;
            if record.composite_figi.is_empty() {
                report.skipped += 1;
                continue;
            }

            let dimension = record.dimension.as_str();
            let working_capital = record.working_capital();
            let download_date = record.download_date.map(|date| date.to_string());
            let params: [&dyn ToSql; 8] = [
                &record.ticker,
                &record.composite_figi,
                &record.calendar_date,
                &dimension,
                &record.total_current_assets,
                &record.total_current_liabilities,
                &working_capital,
                &download_date,
            ];
            let result = connection.execute(
                "INSERT INTO fundamentals \
                 (ticker, composite_figi, calendar_date, dim, curr_assets, curr_liabilities, \
                  working_capital, download_date, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, TRY_CAST(? AS DATE), CURRENT_TIMESTAMP) \
                 ON CONFLICT (composite_figi, calendar_date, dim) DO UPDATE SET \
                 ticker = excluded.ticker, \
                 curr_assets = excluded.curr_assets, \
                 curr_liabilities = excluded.curr_liabilities, \
                 working_capital = excluded.working_capital, \
                 download_date = excluded.download_date, \
                 updated_at = excluded.updated_at",
                params.as_slice(),
            );

            match result {
                Ok(_) => report.saved += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(key = %record.row_key(), error = %err, "failed to save balance sheet record");
                }
            }
        }

        info!(
            attempted = report.attempted,
            saved = report.saved,
            skipped = report.skipped,
            failed = report.failed,
            "saved balance sheet records"
        );
        Ok(report)
    }

    /// Tickers with recent quarterly fundamentals that lack working capital
    /// and have not been excluded, ordered by ticker.
    pub fn pending_balance_sheet_targets(
        &self,
        as_of: Date,
        lookback_days: u32,
    ) -> Result<Vec<PendingTarget>, WarehouseError> {
        let cutoff = as_of
            .checked_sub(Duration::days(i64::from(lookback_days)))
            .unwrap_or(Date::MIN)
            .to_string();

        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT DISTINCT ticker, composite_figi FROM vw_working_capital_gaps \
             WHERE event_date > TRY_CAST(? AS DATE) \
               AND composite_figi NOT IN (SELECT composite_figi FROM balance_sheet_exclusions) \
             ORDER BY ticker, composite_figi",
        )?;
        let targets = statement
            .query_map([cutoff.as_str()], |row| {
                Ok(PendingTarget {
                    ticker: row.get(0)?,
                    composite_figi: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = targets.len(), lookback_days, "found pending balance sheet targets");
        Ok(targets)
    }

    pub fn log_ingest(&self, entry: &IngestLogEntry) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let request_id = entry.request_id.to_string();
        let event_date = entry.event_date.map(|date| date.to_string());
        let status = entry.status.as_str();
        let params: [&dyn ToSql; 9] = [
            &request_id,
            &entry.dataset,
            &entry.source_name,
            &event_date,
            &status,
            &entry.parsed,
            &entry.saved,
            &entry.failed,
            &entry.latency_ms,
        ];
        connection.execute(
            "INSERT INTO ingest_log \
             (request_id, dataset, source_name, event_date, status, parsed, saved, failed, latency_ms, timestamp) \
             VALUES (?, ?, ?, TRY_CAST(? AS DATE), ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }
}

impl ReferenceStore for Warehouse {
    type Error = WarehouseError;

    fn lookup_active_tickers(&self) -> Result<ReferenceSnapshot, Self::Error> {
        Warehouse::lookup_active_tickers(self)
    }

    fn record_exclusion(&self, ticker: &Ticker) {
        if let Err(err) = self.insert_exclusion(ticker) {
            error!(ticker = %ticker, error = %err, "could not record balance sheet exclusion");
        }
    }
}
