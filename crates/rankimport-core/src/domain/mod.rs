mod dates;
mod ticker;

pub use dates::{
    compact_date, days_since_unix_epoch, parse_compact_date_label, parse_report_date,
    parse_year_month_label,
};
pub use ticker::{canonical_ticker, web_symbol, Ticker};
