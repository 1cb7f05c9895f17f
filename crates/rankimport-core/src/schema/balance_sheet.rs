use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

use super::{Cell, Column, ColumnKind, RowKey, Tabular};
use crate::ValidationError;

/// Reporting basis of a balance-sheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "As-Reported-Annual")]
    Annual,
    #[serde(rename = "As-Reported-Quarterly")]
    Quarterly,
}

impl Dimension {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "As-Reported-Annual",
            Self::Quarterly => "As-Reported-Quarterly",
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "As-Reported-Annual" => Ok(Self::Annual),
            "As-Reported-Quarterly" => Ok(Self::Quarterly),
            _ => Err(ValidationError::InvalidDimension {
                value: value.to_owned(),
            }),
        }
    }
}

/// Current assets and liabilities for one (ticker, period, dimension).
///
/// Both figures are NaN when the source did not report them or reported a
/// negative value.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSheetRecord {
    pub ticker: String,
    pub composite_figi: String,
    /// Column label from the source table, kept verbatim.
    pub calendar_date: String,
    pub dimension: Dimension,
    pub total_current_assets: f64,
    pub total_current_liabilities: f64,
    pub download_date: Option<Date>,
}

impl BalanceSheetRecord {
    pub fn new(
        ticker: impl Into<String>,
        calendar_date: impl Into<String>,
        dimension: Dimension,
        download_date: Date,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            composite_figi: String::new(),
            calendar_date: calendar_date.into(),
            dimension,
            total_current_assets: f64::NAN,
            total_current_liabilities: f64::NAN,
            download_date: Some(download_date),
        }
    }

    /// Current assets minus current liabilities; NaN if either is NaN.
    pub fn working_capital(&self) -> f64 {
        self.total_current_assets - self.total_current_liabilities
    }

    /// Neither figure is available.
    pub fn is_unavailable(&self) -> bool {
        self.total_current_assets.is_nan() && self.total_current_liabilities.is_nan()
    }
}

pub const BALANCE_SHEET_COLUMNS: &[Column] = &[
    Column {
        name: "ticker",
        header: None,
        kind: ColumnKind::Text,
    },
    Column {
        name: "composite_figi",
        header: None,
        kind: ColumnKind::Text,
    },
    Column {
        name: "calendar_date",
        header: None,
        kind: ColumnKind::Text,
    },
    Column {
        name: "dimension",
        header: None,
        kind: ColumnKind::Text,
    },
    Column {
        name: "curr_assets",
        header: None,
        kind: ColumnKind::Double,
    },
    Column {
        name: "curr_liabilities",
        header: None,
        kind: ColumnKind::Double,
    },
    Column {
        name: "working_capital",
        header: None,
        kind: ColumnKind::Double,
    },
    Column {
        name: "download_date",
        header: None,
        kind: ColumnKind::Date,
    },
];

impl Tabular for BalanceSheetRecord {
    fn columns() -> &'static [Column] {
        BALANCE_SHEET_COLUMNS
    }

    fn cells(&self) -> Vec<Cell<'_>> {
        vec![
            Cell::Text(&self.ticker),
            Cell::Text(&self.composite_figi),
            Cell::Text(&self.calendar_date),
            Cell::Text(self.dimension.as_str()),
            Cell::Double(self.total_current_assets),
            Cell::Double(self.total_current_liabilities),
            Cell::Double(self.working_capital()),
            Cell::Date(self.download_date),
        ]
    }

    fn row_key(&self) -> RowKey<'_> {
        RowKey {
            ticker: &self.ticker,
            composite_figi: &self.composite_figi,
            period: format!("{} {}", self.calendar_date, self.dimension),
        }
    }
}
