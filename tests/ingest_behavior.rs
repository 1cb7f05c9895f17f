//! Behavior-driven tests for screener ingestion and enrichment
//!
//! These tests feed whole exports through `parse_report` and `enrich` and
//! check what a user of the parsed records would observe.

use pretty_assertions::assert_eq;
use rankimport_core::{
    enrich, parse, parse_report, ExemptExchanges, ReferenceSnapshot, TickerReference,
};
use rankimport_tests::export;
use time::{Date, Month};

fn snapshot(rows: &[(&str, &str)]) -> ReferenceSnapshot {
    ReferenceSnapshot::from_rows(rows.iter().map(|(ticker, figi)| TickerReference {
        ticker: (*ticker).to_string(),
        company_name: (*ticker).to_string(),
        composite_figi: (*figi).to_string(),
    }))
}

// =============================================================================
// Ingestion: Missing Values
// =============================================================================

#[test]
fn when_export_marks_a_value_na_it_reads_as_zero() {
    // Given: An export with NA in numeric columns
    let data = export(&["\"Apple Inc\",\"AAPL\",\"NSDQ\",\"NA\",\"202309\",\"20231102\",\"NA\""]);

    // When: The export is parsed
    let records = parse(data.as_bytes(), "2024-01-19", 0);

    // Then: The NA cells hold the zero value of their type, not a missing marker
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].zacks_rank, 0);
    assert_eq!(records[0].market_cap_mil, 0.0);
}

#[test]
fn when_export_has_empty_numeric_cells_they_read_as_zero() {
    // Given: Blank numeric cells
    let data = export(&["\"Apple Inc\",\"AAPL\",\"NSDQ\",\"\",\"\",\"\",\"\""]);

    // When: The export is parsed
    let records = parse(data.as_bytes(), "2024-01-19", 0);

    // Then: Numbers are zero and period labels are absent
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].zacks_rank, 0);
    assert_eq!(records[0].last_reported_fiscal_yr, None);
}

// =============================================================================
// Ingestion: Limits and Ordering
// =============================================================================

#[test]
fn when_user_sets_a_limit_only_the_first_rows_are_kept_in_order() {
    // Given: Five rows
    let rows: Vec<String> = (1..=5)
        .map(|i| format!("\"Co {i}\",\"T{i}\",\"NYSE\",\"{i}\",\"\",\"\",\"1.5\""))
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let data = export(&refs);

    // When: Parsing with limit 3 and with limit 0
    let limited = parse(data.as_bytes(), "2024-01-19", 3);
    let all = parse(data.as_bytes(), "2024-01-19", 0);

    // Then: Limit 3 keeps the first three in input order, limit 0 keeps all
    let tickers: Vec<&str> = limited.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["T1", "T2", "T3"]);
    assert_eq!(all.len(), 5);
}

#[test]
fn when_limit_exceeds_row_count_all_rows_are_returned() {
    let data = export(&["\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"\",\"\",\"1\""]);

    let records = parse(data.as_bytes(), "2024-01-19", 50);

    assert_eq!(records.len(), 1);
}

// =============================================================================
// Ingestion: Dates
// =============================================================================

#[test]
fn every_record_carries_the_supplied_report_date() {
    // Given: Rows whose own date columns say something else
    let data = export(&[
        "\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"202309\",\"20231102\",\"1\"",
        "\"Microsoft\",\"MSFT\",\"NSDQ\",\"2\",\"202306\",\"20230725\",\"1\"",
    ]);

    // When: Parsed with an external report date
    let records = parse(data.as_bytes(), "2024-01-19", 0);

    // Then: Every event date equals the report date
    let expected = Date::from_calendar_date(2024, Month::January, 19).expect("date");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.event_date == Some(expected)));
}

#[test]
fn when_fiscal_year_label_is_valid_it_formats_back_to_year_and_month() {
    let data = export(&["\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"202309\",\"20231102\",\"1\""]);

    let report = parse_report(data.as_bytes(), "2024-01-19", 0);

    let fiscal = report.records[0]
        .last_reported_fiscal_yr
        .expect("fiscal year label");
    assert!(fiscal.to_string().starts_with("2023-09"));
    let reported = report.records[0]
        .last_eps_report_date
        .expect("report date label");
    assert_eq!(reported.to_string(), "2023-11-02");
    assert!(report.label_warnings.is_empty());
}

#[test]
fn when_fiscal_year_label_is_garbage_exactly_one_warning_is_recorded() {
    // Given: One unparseable label and one empty label
    let data = export(&[
        "\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"2023Q3\",\"\",\"1\"",
        "\"Microsoft\",\"MSFT\",\"NSDQ\",\"2\",\"\",\"\",\"1\"",
    ]);

    // When: Parsed
    let report = parse_report(data.as_bytes(), "2024-01-19", 0);

    // Then: Both labels are absent but only the garbage one warned
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].last_reported_fiscal_yr, None);
    assert_eq!(report.records[1].last_reported_fiscal_yr, None);
    assert_eq!(report.label_warnings.len(), 1);
    assert_eq!(report.label_warnings[0].ticker, "AAPL");
    assert_eq!(report.label_warnings[0].value, "2023Q3");
}

#[test]
fn when_report_date_is_malformed_nothing_is_parsed() {
    let data = export(&["\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"\",\"\",\"1\""]);

    assert!(parse(data.as_bytes(), "01/19/2024", 0).is_empty());
}

#[test]
fn when_a_cell_does_not_fit_its_type_the_whole_file_is_rejected() {
    let data = export(&[
        "\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"\",\"\",\"1\"",
        "\"Microsoft\",\"MSFT\",\"NSDQ\",\"strong buy\",\"\",\"\",\"1\"",
    ]);

    assert!(parse(data.as_bytes(), "2024-01-19", 0).is_empty());
}

#[test]
fn dotted_share_classes_are_stored_with_a_slash() {
    let data = export(&["\"Berkshire\",\"BRK.B\",\"NYSE\",\"3\",\"\",\"\",\"1\""]);

    let records = parse(data.as_bytes(), "2024-01-19", 0);

    assert_eq!(records[0].ticker, "BRK/B");
}

// =============================================================================
// Enrichment
// =============================================================================

#[test]
fn when_enrichment_runs_twice_the_identifiers_do_not_change() {
    // Given: Parsed records and a reference snapshot
    let data = export(&[
        "\"Apple Inc\",\"AAPL\",\"NSDQ\",\"1\",\"\",\"\",\"1\"",
        "\"Unknown\",\"ZZZZ\",\"NYSE\",\"1\",\"\",\"\",\"1\"",
    ]);
    let reference = snapshot(&[("AAPL", "BBG000B9XRY4")]);
    let exempt = ExemptExchanges::default();
    let mut once = parse(data.as_bytes(), "2024-01-19", 0);
    let mut twice = once.clone();

    // When: Enriching once versus twice
    enrich(&mut once, &reference, &exempt);
    enrich(&mut twice, &reference, &exempt);
    enrich(&mut twice, &reference, &exempt);

    // Then: The identifiers match
    let figis = |records: &[rankimport_core::ScreenerRecord]| {
        records
            .iter()
            .map(|r| r.composite_figi.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(figis(&once), figis(&twice));
    assert_eq!(figis(&once), vec![String::from("BBG000B9XRY4"), String::new()]);
}

#[test]
fn when_unknown_ticker_trades_on_an_exempt_exchange_no_warning_is_raised() {
    // Given: The same unknown ticker on an exempt and a non-exempt exchange
    let exempt_row = export(&["\"Pink Co\",\"PINK\",\"Pink No Info\",\"1\",\"\",\"\",\"1\""]);
    let listed_row = export(&["\"Pink Co\",\"PINK\",\"NYSE\",\"1\",\"\",\"\",\"1\""]);
    let reference = snapshot(&[("AAPL", "BBG000B9XRY4")]);
    let exempt = ExemptExchanges::default();

    // When: Each is enriched
    let mut quiet = parse(exempt_row.as_bytes(), "2024-01-19", 0);
    let mut loud = parse(listed_row.as_bytes(), "2024-01-19", 0);
    let quiet_report = enrich(&mut quiet, &reference, &exempt);
    let loud_report = enrich(&mut loud, &reference, &exempt);

    // Then: Only the listed one warns, exactly once
    assert_eq!(quiet_report.unresolved, 1);
    assert_eq!(quiet_report.warned, 0);
    assert_eq!(loud_report.unresolved, 1);
    assert_eq!(loud_report.warned, 1);
}

#[test]
fn configured_exempt_exchanges_replace_the_defaults() {
    let data = export(&["\"Pink Co\",\"PINK\",\"NYSE\",\"1\",\"\",\"\",\"1\""]);
    let mut records = parse(data.as_bytes(), "2024-01-19", 0);

    let report = enrich(&mut records, &snapshot(&[]), &ExemptExchanges::new(["NYSE"]));

    assert_eq!(report.warned, 0);
}
