use time::format_description;
use time::parsing::Parsed;
use time::{Date, OffsetDateTime};

use crate::ValidationError;

const REPORT_DATE: &str = "[year]-[month]-[day]";
const YEAR_MONTH: &str = "[year][month]";
const COMPACT_DATE: &str = "[year][month][day]";

/// Parse the externally supplied report date (`YYYY-MM-DD`).
pub fn parse_report_date(input: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidReportDate {
        value: input.to_owned(),
    };

    let items = format_description::parse(REPORT_DATE).map_err(|_| invalid())?;
    Date::parse(input, &items[..]).map_err(|_| invalid())
}

/// Parse a `YYYYMM` period label into the first day of that month.
pub fn parse_year_month_label(input: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidPeriodLabel {
        value: input.to_owned(),
        expected: "YYYYMM",
    };

    let items = format_description::parse(YEAR_MONTH).map_err(|_| invalid())?;
    let mut parsed = Parsed::new();
    let remaining = parsed
        .parse_items(input.as_bytes(), &items[..])
        .map_err(|_| invalid())?;
    if !remaining.is_empty() {
        return Err(invalid());
    }

    let (Some(year), Some(month)) = (parsed.year(), parsed.month()) else {
        return Err(invalid());
    };
    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())
}

/// Parse a `YYYYMMDD` period label.
pub fn parse_compact_date_label(input: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidPeriodLabel {
        value: input.to_owned(),
        expected: "YYYYMMDD",
    };

    let items = format_description::parse(COMPACT_DATE).map_err(|_| invalid())?;
    Date::parse(input, &items[..]).map_err(|_| invalid())
}

/// `YYYYMMDD`, as used in output file names.
pub fn compact_date(date: Date) -> Result<String, ValidationError> {
    let unformattable = || ValidationError::UnformattableDate {
        value: date.to_string(),
        pattern: "YYYYMMDD",
    };

    let items = format_description::parse(COMPACT_DATE).map_err(|_| unformattable())?;
    date.format(&items[..]).map_err(|_| unformattable())
}

/// Days since 1970-01-01, the arrow `Date32` representation.
pub fn days_since_unix_epoch(date: Date) -> i32 {
    let days = (date - OffsetDateTime::UNIX_EPOCH.date()).whole_days();
    // `Date` spans +/-9999 years, well inside i32 days.
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}
