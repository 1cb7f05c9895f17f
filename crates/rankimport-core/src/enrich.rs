//! Composite FIGI enrichment against a snapshot of the reference table.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Ticker;
use crate::schema::{BalanceSheetRecord, ScreenerRecord};

/// Exchange codes whose unresolved tickers are expected and not worth a warning.
pub const DEFAULT_EXEMPT_EXCHANGES: &[&str] = &[
    "OTC",
    "OTCBB",
    "OTCQX",
    "OTCQB",
    "OTC Markets",
    "Grey Market",
    "Pink No Info",
    "Pink Current Info",
];

/// One active security from the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerReference {
    pub ticker: String,
    pub company_name: String,
    pub composite_figi: String,
}

/// Read-only `ticker -> reference` mapping for one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    by_ticker: HashMap<String, TickerReference>,
}

impl ReferenceSnapshot {
    /// Later rows for the same ticker replace earlier ones.
    pub fn from_rows(rows: impl IntoIterator<Item = TickerReference>) -> Self {
        let by_ticker = rows
            .into_iter()
            .map(|row| (row.ticker.clone(), row))
            .collect();
        Self { by_ticker }
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerReference> {
        self.by_ticker.get(ticker)
    }

    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }
}

/// Exchanges exempt from "could not find composite figi" warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptExchanges(BTreeSet<String>);

impl ExemptExchanges {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codes.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, exchange: &str) -> bool {
        self.0.contains(exchange)
    }
}

impl Default for ExemptExchanges {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_EXCHANGES.iter().copied())
    }
}

/// Outcome counts of one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichReport {
    pub resolved: usize,
    pub unresolved: usize,
    /// Unresolved records on non-exempt exchanges; one warning each.
    pub warned: usize,
}

/// Set `composite_figi` on every record whose ticker is in the snapshot.
///
/// Matching is exact on the canonical ticker. Records that miss keep their
/// current identifier, so running the pass twice changes nothing.
pub fn enrich(
    records: &mut [ScreenerRecord],
    snapshot: &ReferenceSnapshot,
    exempt: &ExemptExchanges,
) -> EnrichReport {
    let mut report = EnrichReport::default();

    for record in records.iter_mut() {
        if let Some(reference) = snapshot.get(&record.ticker) {
            record.composite_figi.clone_from(&reference.composite_figi);
            report.resolved += 1;
            continue;
        }

        report.unresolved += 1;
        if !exempt.contains(&record.exchange) {
            warn!(
                ticker = %record.ticker,
                exchange = %record.exchange,
                "could not find composite figi for ticker"
            );
            report.warned += 1;
        }
    }

    report
}

/// Resolve identifiers for balance-sheet records; misses stay empty and are
/// skipped by the relational sink.
pub fn enrich_balance_sheets(
    records: &mut [BalanceSheetRecord],
    snapshot: &ReferenceSnapshot,
) -> EnrichReport {
    let mut report = EnrichReport::default();

    for record in records.iter_mut() {
        match snapshot.get(&record.ticker) {
            Some(reference) => {
                record.composite_figi.clone_from(&reference.composite_figi);
                report.resolved += 1;
            }
            None => report.unresolved += 1,
        }
    }

    report
}

/// Access to reference data shared by the import path and the balance-sheet
/// path.
pub trait ReferenceStore {
    type Error: std::error::Error;

    /// Every active security with a known composite FIGI.
    fn lookup_active_tickers(&self) -> Result<ReferenceSnapshot, Self::Error>;

    /// Remember that `ticker` has no usable balance-sheet figures.
    ///
    /// Best effort: failures are logged by the implementation.
    fn record_exclusion(&self, ticker: &Ticker);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::from_rows([
            TickerReference {
                ticker: String::from("AAPL"),
                company_name: String::from("Apple Inc"),
                composite_figi: String::from("BBG000B9XRY4"),
            },
            TickerReference {
                ticker: String::from("BRK/B"),
                company_name: String::from("Berkshire Hathaway"),
                composite_figi: String::from("BBG000DWG505"),
            },
        ])
    }

    fn record(ticker: &str, exchange: &str) -> ScreenerRecord {
        ScreenerRecord {
            ticker: ticker.to_owned(),
            exchange: exchange.to_owned(),
            ..ScreenerRecord::default()
        }
    }

    #[test]
    fn resolves_known_tickers() {
        let mut records = vec![record("AAPL", "NSDQ"), record("BRK/B", "NYSE")];

        let report = enrich(&mut records, &snapshot(), &ExemptExchanges::default());

        assert_eq!(records[0].composite_figi, "BBG000B9XRY4");
        assert_eq!(records[1].composite_figi, "BBG000DWG505");
        assert_eq!(report.resolved, 2);
        assert_eq!(report.warned, 0);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let mut records = vec![record("AAPL", "NSDQ"), record("ZZZZ", "NYSE")];
        let snapshot = snapshot();
        let exempt = ExemptExchanges::default();

        enrich(&mut records, &snapshot, &exempt);
        let once: Vec<_> = records.iter().map(|r| r.composite_figi.clone()).collect();
        enrich(&mut records, &snapshot, &exempt);
        let twice: Vec<_> = records.iter().map(|r| r.composite_figi.clone()).collect();

        assert_eq!(once, twice);
        assert_eq!(twice, vec![String::from("BBG000B9XRY4"), String::new()]);
    }

    #[test]
    fn exempt_exchange_miss_is_silent() {
        let mut records = vec![record("GRYMKT", "Grey Market")];
        let report = enrich(&mut records, &snapshot(), &ExemptExchanges::default());
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.warned, 0);
    }

    #[test]
    fn listed_exchange_miss_warns_exactly_once() {
        let mut records = vec![record("GRYMKT", "NYSE")];
        let report = enrich(&mut records, &snapshot(), &ExemptExchanges::default());
        assert_eq!(report.unresolved, 1);
        assert_eq!(report.warned, 1);
        assert!(records[0].composite_figi.is_empty());
    }

    #[test]
    fn matching_is_exact() {
        let mut records = vec![record("BRK.B", "NYSE"), record("aapl", "NSDQ")];
        let report = enrich(&mut records, &snapshot(), &ExemptExchanges::default());
        assert_eq!(report.resolved, 0);
        assert_eq!(report.warned, 2);
    }

    #[test]
    fn custom_exempt_set_replaces_default() {
        let exempt = ExemptExchanges::new(["NYSE"]);
        assert!(exempt.contains("NYSE"));
        assert!(!exempt.contains("OTC"));
    }
}
