//! Database views for analytical queries.

use ::duckdb::Connection;

/// Create database views used by queries and operators.
///
/// Creates the following views:
/// - `vw_screener_latest`: Most recent screener row per composite FIGI
/// - `vw_working_capital_gaps`: Quarterly fundamentals rows without working capital
///
/// # Errors
/// Returns an error if the view creation SQL fails to execute.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW vw_screener_latest AS
SELECT *
FROM screener_facts
WHERE composite_figi <> ''
QUALIFY ROW_NUMBER() OVER (PARTITION BY composite_figi ORDER BY event_date DESC) = 1;

CREATE OR REPLACE VIEW vw_working_capital_gaps AS
SELECT
    ticker,
    composite_figi,
    calendar_date,
    event_date
FROM fundamentals
WHERE dim = 'As-Reported-Quarterly'
  AND (working_capital IS NULL OR isnan(working_capital));
",
    )?;

    Ok(())
}
