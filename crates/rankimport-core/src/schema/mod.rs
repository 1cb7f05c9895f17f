//! Canonical record schema shared by the CSV ingestor, the relational sink and
//! the columnar writer.
//!
//! Each record type declares its columns once. The declaration yields the
//! struct, an ordered [`Column`] table and the per-field conversions, so the
//! three serializers cannot drift apart.

use std::fmt::{Display, Formatter};

use thiserror::Error;
use time::Date;

use crate::domain::{parse_compact_date_label, parse_report_date, parse_year_month_label};
use crate::ValidationError;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Calendar date without time; absent dates are NULL.
    Date,
}

/// One column of a record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name in the relational and columnar sinks.
    pub name: &'static str,
    /// Header in the screener CSV export, if the column comes from it.
    pub header: Option<&'static str>,
    pub kind: ColumnKind,
}

/// Borrowed view of one field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Date(Option<Date>),
}

impl<'a> From<&'a String> for Cell<'a> {
    fn from(value: &'a String) -> Self {
        Cell::Text(value.as_str())
    }
}

impl From<&bool> for Cell<'_> {
    fn from(value: &bool) -> Self {
        Cell::Bool(*value)
    }
}

impl From<&i32> for Cell<'_> {
    fn from(value: &i32) -> Self {
        Cell::Int(*value)
    }
}

impl From<&i64> for Cell<'_> {
    fn from(value: &i64) -> Self {
        Cell::BigInt(*value)
    }
}

impl From<&f32> for Cell<'_> {
    fn from(value: &f32) -> Self {
        Cell::Float(*value)
    }
}

impl From<&f64> for Cell<'_> {
    fn from(value: &f64) -> Self {
        Cell::Double(*value)
    }
}

impl From<&Option<Date>> for Cell<'_> {
    fn from(value: &Option<Date>) -> Self {
        Cell::Date(*value)
    }
}

/// Identifying fields used when logging a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKey<'a> {
    pub ticker: &'a str,
    pub composite_figi: &'a str,
    pub period: String,
}

impl Display for RowKey<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ticker={} composite_figi={} period={}",
            self.ticker, self.composite_figi, self.period
        )
    }
}

/// A record type that both sinks can serialize column by column.
pub trait Tabular {
    /// Ordered column table.
    fn columns() -> &'static [Column];

    /// Field values in column order.
    fn cells(&self) -> Vec<Cell<'_>>;

    fn row_key(&self) -> RowKey<'_>;
}

/// Why a raw cell could not be converted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellFault {
    #[error("expected {expected}")]
    Invalid { expected: &'static str },
    #[error(transparent)]
    PeriodLabel(ValidationError),
    #[error("no such column")]
    UnknownColumn,
}

/// A raw cell that could not be assigned to its field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("column '{column}' value '{value}': {fault}")]
pub struct CellError {
    pub column: String,
    pub value: String,
    pub fault: CellFault,
}

impl CellError {
    /// Period-label failures leave the field empty and never fail the row.
    pub fn is_period_label(&self) -> bool {
        matches!(self.fault, CellFault::PeriodLabel(_))
    }
}

pub(crate) fn parse_text(raw: &str) -> Result<String, CellFault> {
    Ok(raw.to_owned())
}

pub(crate) fn parse_bool(raw: &str) -> Result<bool, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(false);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" => Ok(true),
        "0" | "f" | "false" | "n" | "no" => Ok(false),
        _ => Err(CellFault::Invalid {
            expected: "boolean",
        }),
    }
}

pub(crate) fn parse_int(raw: &str) -> Result<i32, CellFault> {
    let value = parse_big_int(raw).map_err(|_| CellFault::Invalid {
        expected: "32-bit integer",
    })?;
    i32::try_from(value).map_err(|_| CellFault::Invalid {
        expected: "32-bit integer",
    })
}

pub(crate) fn parse_big_int(raw: &str) -> Result<i64, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(0);
    }
    if let Ok(parsed) = value.parse::<i64>() {
        return Ok(parsed);
    }

    // Exports occasionally render counts as "12.0".
    match value.parse::<f64>() {
        Ok(parsed)
            if parsed.is_finite()
                && parsed.fract() == 0.0
                && parsed >= i64::MIN as f64
                && parsed <= i64::MAX as f64 =>
        {
            Ok(parsed as i64)
        }
        _ => Err(CellFault::Invalid {
            expected: "integer",
        }),
    }
}

pub(crate) fn parse_float(raw: &str) -> Result<f32, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f32>()
        .map_err(|_| CellFault::Invalid { expected: "number" })
}

pub(crate) fn parse_double(raw: &str) -> Result<f64, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .map_err(|_| CellFault::Invalid { expected: "number" })
}

pub(crate) fn parse_date(raw: &str) -> Result<Option<Date>, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_report_date(value)
        .map(Some)
        .map_err(|_| CellFault::Invalid {
            expected: "YYYY-MM-DD date",
        })
}

pub(crate) fn parse_month_label(raw: &str) -> Result<Option<Date>, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_year_month_label(value)
        .map(Some)
        .map_err(CellFault::PeriodLabel)
}

pub(crate) fn parse_day_label(raw: &str) -> Result<Option<Date>, CellFault> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_compact_date_label(value)
        .map(Some)
        .map_err(CellFault::PeriodLabel)
}

macro_rules! schema_field_type {
    (Text) => { String };
    (Bool) => { bool };
    (Int) => { i32 };
    (BigInt) => { i64 };
    (Float) => { f32 };
    (Double) => { f64 };
    (Date) => { Option<::time::Date> };
    (MonthLabel) => { Option<::time::Date> };
    (DayLabel) => { Option<::time::Date> };
}

macro_rules! schema_column_kind {
    (Text) => { $crate::schema::ColumnKind::Text };
    (Bool) => { $crate::schema::ColumnKind::Bool };
    (Int) => { $crate::schema::ColumnKind::Int };
    (BigInt) => { $crate::schema::ColumnKind::BigInt };
    (Float) => { $crate::schema::ColumnKind::Float };
    (Double) => { $crate::schema::ColumnKind::Double };
    (Date) => { $crate::schema::ColumnKind::Date };
    (MonthLabel) => { $crate::schema::ColumnKind::Date };
    (DayLabel) => { $crate::schema::ColumnKind::Date };
}

macro_rules! schema_parser {
    (Text) => { $crate::schema::parse_text };
    (Bool) => { $crate::schema::parse_bool };
    (Int) => { $crate::schema::parse_int };
    (BigInt) => { $crate::schema::parse_big_int };
    (Float) => { $crate::schema::parse_float };
    (Double) => { $crate::schema::parse_double };
    (Date) => { $crate::schema::parse_date };
    (MonthLabel) => { $crate::schema::parse_month_label };
    (DayLabel) => { $crate::schema::parse_day_label };
}

macro_rules! schema_header {
    () => {
        None
    };
    ($header:literal) => {
        Some($header)
    };
}

/// Declare a record struct together with its column table.
///
/// `field: Kind = "CSV header"`; fields without a header are filled in by
/// the pipeline rather than read from the export.
macro_rules! record_schema {
    (
        $(#[$meta:meta])*
        pub struct $name:ident in $columns:ident {
            $( $field:ident : $kind:ident $(= $header:literal)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $( pub $field: schema_field_type!($kind), )*
        }

        /// Column table, in declaration order.
        pub const $columns: &[$crate::schema::Column] = &[
            $(
                $crate::schema::Column {
                    name: stringify!($field),
                    header: schema_header!($($header)?),
                    kind: schema_column_kind!($kind),
                },
            )*
        ];

        impl $name {
            /// Convert one raw cell and store it in the named column.
            ///
            /// A failed conversion leaves the field untouched.
            pub fn assign(
                &mut self,
                column: &str,
                raw: &str,
            ) -> Result<(), $crate::schema::CellError> {
                let fault = |fault| $crate::schema::CellError {
                    column: column.to_owned(),
                    value: raw.to_owned(),
                    fault,
                };

                match column {
                    $(
                        stringify!($field) => {
                            self.$field = (schema_parser!($kind))(raw).map_err(fault)?;
                            Ok(())
                        }
                    )*
                    _ => Err(fault($crate::schema::CellFault::UnknownColumn)),
                }
            }

            fn schema_cells(&self) -> Vec<$crate::schema::Cell<'_>> {
                vec![ $( $crate::schema::Cell::from(&self.$field), )* ]
            }
        }
    };
}

mod balance_sheet;
mod screener;

pub use balance_sheet::{BalanceSheetRecord, Dimension, BALANCE_SHEET_COLUMNS};
pub use screener::{ScreenerRecord, SCREENER_COLUMNS};

/// Normalized form used to match export headers: trimmed, inner whitespace
/// collapsed to single spaces, byte-order mark removed.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
