//! Core contracts for rankimport.
//!
//! This crate contains:
//! - Ticker and date validation
//! - The screener and balance-sheet record schema shared by both sinks
//! - Screener CSV ingestion
//! - Composite FIGI enrichment and the reference-store seam
//! - Balance-sheet table parsing, exclusion decisions and target selection
//! - Layered configuration

pub mod balance_sheet;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod schema;

pub use balance_sheet::{
    collect_balance_sheets, parse_header, parse_row, scrape_ticker, select_targets,
    BalanceSheetTable, CollectedBalanceSheets, PendingTarget, RowLabel, TableCapture,
    TickerCapture, TickerScrape,
};
pub use config::{
    BalanceSheetConfig, DatabaseConfig, ImportConfig, LogConfig, RankImportConfig, StorageConfig,
};
pub use domain::{
    canonical_ticker, compact_date, days_since_unix_epoch, parse_report_date, web_symbol, Ticker,
};
pub use enrich::{
    enrich, enrich_balance_sheets, EnrichReport, ExemptExchanges, ReferenceSnapshot,
    ReferenceStore, TickerReference, DEFAULT_EXEMPT_EXCHANGES,
};
pub use error::{ConfigError, ValidationError};
pub use ingest::{parse, parse_report, IngestReport, LabelWarning};
pub use schema::{
    BalanceSheetRecord, Cell, Column, ColumnKind, Dimension, RowKey, ScreenerRecord, Tabular,
    BALANCE_SHEET_COLUMNS, SCREENER_COLUMNS,
};
