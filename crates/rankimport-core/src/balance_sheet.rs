//! Balance-sheet table text handling, exclusion decisions and target
//! selection.
//!
//! The table text comes from a browser session outside this crate; each table
//! arrives as the text of its header row group plus the text of the rows we
//! care about, one cell per line.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{error, info};

use crate::domain::{web_symbol, Ticker};
use crate::enrich::ReferenceStore;
use crate::schema::{BalanceSheetRecord, Dimension};

/// Source tables report figures in millions.
const UNITS_PER_REPORTED_VALUE: f64 = 1e6;

/// Rows read from a balance-sheet table, each bound to the attribute it sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowLabel {
    TotalCurrentAssets,
    TotalCurrentLiabilities,
}

impl RowLabel {
    pub const ALL: [RowLabel; 2] = [Self::TotalCurrentAssets, Self::TotalCurrentLiabilities];

    /// Row caption as printed in the table.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TotalCurrentAssets => "Total Current Assets",
            Self::TotalCurrentLiabilities => "Total Current Liabilities",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|row| row.label() == label.trim())
    }

    fn apply(self, record: &mut BalanceSheetRecord, value: f64) {
        match self {
            Self::TotalCurrentAssets => record.total_current_assets = value,
            Self::TotalCurrentLiabilities => record.total_current_liabilities = value,
        }
    }
}

/// Column labels of a header row group, in order.
pub fn parse_header(text: &str) -> Vec<String> {
    text.trim()
        .split('\n')
        .map(|heading| heading.trim_matches(|ch| ch == ' ' || ch == '\t').to_owned())
        .collect()
}

/// Values of one row keyed by column position.
///
/// The first two lines of the row text hold the caption and are dropped.
/// `NA`, empty and negative values become NaN; values that do not parse are
/// logged and left out.
pub fn parse_row(text: &str, label: RowLabel) -> Vec<(usize, f64)> {
    let caption = label.label();
    let mut values = Vec::new();

    for (position, field) in text
        .trim_matches(|ch| ch == ' ' || ch == '\t')
        .split('\n')
        .skip(2)
        .enumerate()
    {
        let value = field.trim().replace(',', "");
        if value == caption {
            continue;
        }

        if value.is_empty() || value == "NA" {
            values.push((position, f64::NAN));
            continue;
        }

        match value.parse::<f64>() {
            Ok(reported) => {
                let scaled = reported * UNITS_PER_REPORTED_VALUE;
                values.push((position, if scaled < 0.0 { f64::NAN } else { scaled }));
            }
            Err(err) => {
                error!(error = %err, input = %value, row = caption, "could not convert value to float");
            }
        }
    }

    values
}

/// Records for one table (one ticker, one dimension).
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSheetTable {
    records: Vec<BalanceSheetRecord>,
    /// Column position -> index into `records`.
    slots: Vec<usize>,
}

impl BalanceSheetTable {
    /// One record per distinct column label, both figures NaN.
    pub fn from_header(
        ticker: &Ticker,
        dimension: Dimension,
        header_text: &str,
        download_date: Date,
    ) -> Self {
        let mut records: Vec<BalanceSheetRecord> = Vec::new();
        let mut by_label: HashMap<String, usize> = HashMap::new();
        let mut slots = Vec::new();

        for label in parse_header(header_text) {
            let index = *by_label.entry(label.clone()).or_insert_with(|| {
                records.push(BalanceSheetRecord::new(
                    ticker.as_str(),
                    label,
                    dimension,
                    download_date,
                ));
                records.len() - 1
            });
            slots.push(index);
        }

        Self { records, slots }
    }

    /// Apply one row's values; returns how many columns were set.
    pub fn apply_row(&mut self, label: RowLabel, row_text: &str) -> usize {
        let mut applied = 0;
        for (position, value) in parse_row(row_text, label) {
            let Some(&index) = self.slots.get(position) else {
                continue;
            };
            label.apply(&mut self.records[index], value);
            applied += 1;
        }
        applied
    }

    pub fn records(&self) -> &[BalanceSheetRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BalanceSheetRecord> {
        self.records
    }
}

/// Captured text of one table. `header` is `None` when it could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapture {
    pub header: Option<String>,
    /// Row caption -> row text.
    #[serde(default)]
    pub rows: BTreeMap<String, String>,
}

/// Captured annual and quarterly tables for one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerCapture {
    pub ticker: Ticker,
    #[serde(default)]
    pub annual: Option<TableCapture>,
    #[serde(default)]
    pub quarterly: Option<TableCapture>,
}

/// Records read for one ticker and whether it should be excluded from future
/// runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerScrape {
    pub ticker: Ticker,
    pub records: Vec<BalanceSheetRecord>,
    pub exclude: bool,
}

/// Build the records for one ticker.
///
/// An unreadable annual header excludes the ticker outright. Otherwise the
/// ticker is excluded when no collected record has either figure.
pub fn scrape_ticker(capture: &TickerCapture, download_date: Date) -> TickerScrape {
    let Some(annual_header) = capture
        .annual
        .as_ref()
        .and_then(|table| table.header.as_deref())
    else {
        error!(ticker = %capture.ticker, "could not get row header");
        return TickerScrape {
            ticker: capture.ticker.clone(),
            records: Vec::new(),
            exclude: true,
        };
    };

    let mut records = read_table(
        &capture.ticker,
        Dimension::Annual,
        annual_header,
        capture.annual.as_ref(),
        download_date,
    );

    if let Some(quarterly) = capture.quarterly.as_ref() {
        match quarterly.header.as_deref() {
            Some(header) => records.extend(read_table(
                &capture.ticker,
                Dimension::Quarterly,
                header,
                Some(quarterly),
                download_date,
            )),
            None => error!(ticker = %capture.ticker, "could not get quarterly row header"),
        }
    }

    let exclude = records.iter().all(BalanceSheetRecord::is_unavailable);
    TickerScrape {
        ticker: capture.ticker.clone(),
        records,
        exclude,
    }
}

fn read_table(
    ticker: &Ticker,
    dimension: Dimension,
    header: &str,
    capture: Option<&TableCapture>,
    download_date: Date,
) -> Vec<BalanceSheetRecord> {
    let mut table = BalanceSheetTable::from_header(ticker, dimension, header, download_date);
    if table.records().is_empty() {
        return Vec::new();
    }

    for label in RowLabel::ALL {
        match capture.and_then(|capture| capture.rows.get(label.label())) {
            Some(text) => {
                table.apply_row(label, text);
            }
            None => error!(
                ticker = %ticker,
                dimension = %dimension,
                row = label.label(),
                "could not get row"
            ),
        }
    }

    table.into_records()
}

/// All records from a batch of captures plus the tickers that were excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedBalanceSheets {
    pub records: Vec<BalanceSheetRecord>,
    pub excluded: Vec<Ticker>,
}

/// Scrape every capture, recording exclusions through `store` as they are
/// decided.
pub fn collect_balance_sheets<S: ReferenceStore + ?Sized>(
    captures: &[TickerCapture],
    download_date: Date,
    store: &S,
) -> CollectedBalanceSheets {
    let mut collected = CollectedBalanceSheets::default();

    for capture in captures {
        let scrape = scrape_ticker(capture, download_date);
        if scrape.exclude {
            store.record_exclusion(&scrape.ticker);
            collected.excluded.push(scrape.ticker);
        }
        collected.records.extend(scrape.records);
    }

    info!(
        tickers = captures.len(),
        records = collected.records.len(),
        excluded = collected.excluded.len(),
        "collected balance sheets"
    );
    collected
}

/// A ticker whose recent quarterly working capital is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTarget {
    pub ticker: String,
    pub composite_figi: String,
}

impl PendingTarget {
    pub fn web_symbol(&self) -> String {
        web_symbol(&self.ticker)
    }
}

/// Shuffle candidates and keep at most `max_assets` (zero keeps all).
pub fn select_targets(
    mut candidates: Vec<PendingTarget>,
    max_assets: usize,
    rng: &mut fastrand::Rng,
) -> Vec<PendingTarget> {
    rng.shuffle(&mut candidates);
    if max_assets > 0 {
        candidates.truncate(max_assets);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::convert::Infallible;

    use pretty_assertions::assert_eq;
    use time::Month;

    use super::*;
    use crate::enrich::ReferenceSnapshot;

    const HEADER: &str = "\n  12/31/2023\n  12/31/2022\n  12/31/2021\n";

    fn today() -> Date {
        Date::from_calendar_date(2024, Month::May, 2).expect("date")
    }

    fn ticker(value: &str) -> Ticker {
        Ticker::parse(value).expect("ticker")
    }

    fn table(assets: &str, liabilities: &str) -> TableCapture {
        let mut rows = BTreeMap::new();
        rows.insert(String::from("Total Current Assets"), assets.to_owned());
        rows.insert(String::from("Total Current Liabilities"), liabilities.to_owned());
        TableCapture {
            header: Some(HEADER.to_owned()),
            rows,
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        excluded: RefCell<Vec<String>>,
    }

    impl ReferenceStore for RecordingStore {
        type Error = Infallible;

        fn lookup_active_tickers(&self) -> Result<ReferenceSnapshot, Self::Error> {
            Ok(ReferenceSnapshot::default())
        }

        fn record_exclusion(&self, ticker: &Ticker) {
            self.excluded.borrow_mut().push(ticker.to_string());
        }
    }

    #[test]
    fn header_labels_are_trimmed_in_order() {
        assert_eq!(
            parse_header(HEADER),
            vec!["12/31/2023", "12/31/2022", "12/31/2021"]
        );
    }

    #[test]
    fn row_values_are_scaled_and_cleaned() {
        let text = "Total Current Assets\n\n 143,566 \n 135,405\n NA\n -5\n";
        let values = parse_row(text, RowLabel::TotalCurrentAssets);

        assert_eq!(values.len(), 4);
        assert_eq!(values[0], (0, 143_566_000_000.0));
        assert_eq!(values[1], (1, 135_405_000_000.0));
        assert_eq!(values[2].0, 2);
        assert!(values[2].1.is_nan());
        assert!(values[3].1.is_nan());
    }

    #[test]
    fn unparseable_values_are_skipped_without_shifting_positions() {
        let text = "Total Current Assets\n\n n/m \n 10\n";
        let values = parse_row(text, RowLabel::TotalCurrentAssets);
        assert_eq!(values, vec![(1, 10_000_000.0)]);
    }

    #[test]
    fn caption_echo_is_ignored() {
        let text = "x\ny\nTotal Current Liabilities\n 5\n";
        let values = parse_row(text, RowLabel::TotalCurrentLiabilities);
        assert_eq!(values, vec![(1, 5_000_000.0)]);
    }

    #[test]
    fn row_labels_dispatch_to_their_attribute() {
        assert_eq!(
            RowLabel::from_label(" Total Current Liabilities "),
            Some(RowLabel::TotalCurrentLiabilities)
        );
        assert_eq!(RowLabel::from_label("Total Assets"), None);

        let mut table = BalanceSheetTable::from_header(
            &ticker("AAPL"),
            Dimension::Annual,
            HEADER,
            today(),
        );
        table.apply_row(RowLabel::TotalCurrentAssets, "a\nb\n 100\n 90\n 80");
        table.apply_row(RowLabel::TotalCurrentLiabilities, "a\nb\n 40\n 30\n 20\n 10");

        let records = table.into_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].calendar_date, "12/31/2023");
        assert_eq!(records[0].total_current_assets, 100_000_000.0);
        assert_eq!(records[0].total_current_liabilities, 40_000_000.0);
        assert_eq!(records[2].working_capital(), 60_000_000.0);
    }

    #[test]
    fn ticker_with_figures_is_kept() {
        let capture = TickerCapture {
            ticker: ticker("AAPL"),
            annual: Some(table("a\nb\n 100\n 90\n 80", "a\nb\n 40\n 30\n 20")),
            quarterly: Some(table("a\nb\n NA\n NA\n NA", "a\nb\n NA\n NA\n NA")),
        };

        let scrape = scrape_ticker(&capture, today());

        assert!(!scrape.exclude);
        assert_eq!(scrape.records.len(), 6);
        assert_eq!(
            scrape
                .records
                .iter()
                .filter(|r| r.dimension == Dimension::Quarterly)
                .count(),
            3
        );
    }

    #[test]
    fn all_missing_figures_exclude_the_ticker() {
        let capture = TickerCapture {
            ticker: ticker("SHELL"),
            annual: Some(table("a\nb\n NA\n NA\n NA", "a\nb\n\n\n")),
            quarterly: None,
        };

        let scrape = scrape_ticker(&capture, today());

        assert!(scrape.exclude);
        assert_eq!(scrape.records.len(), 3);
    }

    #[test]
    fn unreadable_header_excludes_without_records() {
        let capture = TickerCapture {
            ticker: ticker("GONE"),
            annual: Some(TableCapture::default()),
            quarterly: Some(table("a\nb\n 1", "a\nb\n 1")),
        };

        let scrape = scrape_ticker(&capture, today());

        assert!(scrape.exclude);
        assert!(scrape.records.is_empty());
    }

    #[test]
    fn collect_records_exclusions_through_the_store() {
        let store = RecordingStore::default();
        let captures = vec![
            TickerCapture {
                ticker: ticker("AAPL"),
                annual: Some(table("a\nb\n 100", "a\nb\n 40")),
                quarterly: None,
            },
            TickerCapture {
                ticker: ticker("GONE"),
                annual: None,
                quarterly: None,
            },
        ];

        let collected = collect_balance_sheets(&captures, today(), &store);

        assert_eq!(store.excluded.borrow().as_slice(), ["GONE"]);
        assert_eq!(collected.excluded, vec![ticker("GONE")]);
        assert_eq!(collected.records.len(), 3);
    }

    #[test]
    fn captures_deserialize_from_json() {
        let json = r#"[{
            "ticker": "brk.b",
            "annual": {"header": "12/31/2023", "rows": {"Total Current Assets": "a\nb\n 1"}},
            "quarterly": {"header": null}
        }]"#;

        let captures: Vec<TickerCapture> = serde_json::from_str(json).expect("json");

        assert_eq!(captures[0].ticker.as_str(), "BRK/B");
        assert_eq!(captures[0].quarterly.as_ref().and_then(|t| t.header.clone()), None);
    }

    #[test]
    fn select_targets_shuffles_and_truncates() {
        let candidates: Vec<_> = (0..10)
            .map(|i| PendingTarget {
                ticker: format!("T{i}"),
                composite_figi: format!("FIGI{i}"),
            })
            .collect();

        let mut rng = fastrand::Rng::with_seed(7);
        let picked = select_targets(candidates.clone(), 4, &mut rng);
        assert_eq!(picked.len(), 4);
        for target in &picked {
            assert!(candidates.contains(target));
        }

        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(select_targets(candidates.clone(), 0, &mut rng).len(), 10);
    }

    #[test]
    fn pending_targets_report_web_symbols() {
        let target = PendingTarget {
            ticker: String::from("BRK/B"),
            composite_figi: String::from("BBG000DWG505"),
        };
        assert_eq!(target.web_symbol(), "BRK.B");
    }
}
