//! Screener CSV ingestion.

use std::collections::HashMap;

use tracing::{debug, error, warn};

use crate::domain::{canonical_ticker, parse_report_date};
use crate::schema::{normalize_header, CellError, ScreenerRecord, SCREENER_COLUMNS};

/// A period label that could not be parsed; the field was left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelWarning {
    pub ticker: String,
    pub column: String,
    pub value: String,
}

/// Parsed records plus the non-fatal label warnings that were logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub records: Vec<ScreenerRecord>,
    pub label_warnings: Vec<LabelWarning>,
}

/// Parse a screener export. See [`parse_report`].
pub fn parse(raw: &[u8], report_date: &str, limit: usize) -> Vec<ScreenerRecord> {
    parse_report(raw, report_date, limit).records
}

/// Parse a screener export into records stamped with `report_date`.
///
/// Every quoted `"NA"` cell is rewritten to `"0"` before parsing, so a missing
/// value and a true zero are indistinguishable afterwards. `limit` of zero
/// keeps every row. Any structural problem (bad quoting, ragged rows, a cell
/// that does not fit its column type) or an unparseable report date yields an
/// empty result; those are logged, not returned.
pub fn parse_report(raw: &[u8], report_date: &str, limit: usize) -> IngestReport {
    let event_date = match parse_report_date(report_date) {
        Ok(date) => date,
        Err(err) => {
            error!(error = %err, report_date, "cannot parse report date");
            return IngestReport::default();
        }
    };

    let text = String::from_utf8_lossy(raw).replace("\"NA\"", "\"0\"");

    let mut rows = match read_rows(&text) {
        Ok(rows) => rows,
        Err(err) => {
            error!(error = %err, "failed to unmarshal screener export");
            return IngestReport::default();
        }
    };

    if limit > 0 && rows.len() > limit {
        rows.truncate(limit);
    }

    let mut report = IngestReport {
        records: Vec::with_capacity(rows.len()),
        label_warnings: Vec::new(),
    };

    for (mut record, label_errors) in rows {
        record.ticker = canonical_ticker(&record.ticker);
        record.event_date = Some(event_date);

        for label_error in label_errors {
            warn!(
                ticker = %record.ticker,
                column = %label_error.column,
                input = %label_error.value,
                "could not parse period label"
            );
            report.label_warnings.push(LabelWarning {
                ticker: record.ticker.clone(),
                column: label_error.column,
                value: label_error.value,
            });
        }

        report.records.push(record);
    }

    report
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Cell {
        row: usize,
        #[source]
        source: CellError,
    },
}

type ParsedRow = (ScreenerRecord, Vec<CellError>);

fn read_rows(text: &str) -> Result<Vec<ParsedRow>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let by_header: HashMap<String, &'static str> = SCREENER_COLUMNS
        .iter()
        .filter_map(|column| {
            column
                .header
                .map(|header| (normalize_header(header), column.name))
        })
        .collect();

    let mapping: Vec<Option<&'static str>> = reader
        .headers()?
        .iter()
        .map(|header| {
            let target = by_header.get(&normalize_header(header)).copied();
            if target.is_none() {
                debug!(header, "ignoring unknown screener column");
            }
            target
        })
        .collect();

    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let mut record = ScreenerRecord::default();
        let mut label_errors = Vec::new();

        for (value, column) in row.iter().zip(&mapping) {
            let Some(column) = column else {
                continue;
            };
            match record.assign(column, value) {
                Ok(()) => {}
                Err(err) if err.is_period_label() => label_errors.push(err),
                Err(err) => {
                    return Err(ReadError::Cell {
                        row: index + 1,
                        source: err,
                    })
                }
            }
        }

        rows.push((record, label_errors));
    }

    Ok(rows)
}
