//! SQL text and bind values derived from the record column tables.

use ::duckdb::types::Value;
use rankimport_core::{Cell, Column, ColumnKind};

pub(crate) fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "TEXT",
        ColumnKind::Bool => "BOOLEAN",
        ColumnKind::Int => "INTEGER",
        ColumnKind::BigInt => "BIGINT",
        ColumnKind::Float => "REAL",
        ColumnKind::Double => "DOUBLE",
        ColumnKind::Date => "DATE",
    }
}

/// Dates are bound as ISO text and cast on the server side.
pub(crate) fn placeholder(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Date => "TRY_CAST(? AS DATE)",
        _ => "?",
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` for `columns`, keyed by `key`.
pub(crate) fn create_table(table: &str, columns: &[Column], key: &[&str]) -> String {
    let mut lines: Vec<String> = columns
        .iter()
        .map(|column| {
            let not_null = if key.contains(&column.name) {
                " NOT NULL"
            } else {
                ""
            };
            format!(
                "    {} {}{not_null}",
                quote_ident(column.name),
                sql_type(column.kind)
            )
        })
        .collect();
    lines.push(String::from(
        "    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP",
    ));
    lines.push(format!(
        "    PRIMARY KEY ({})",
        key.iter()
            .map(|name| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n{}\n);\n",
        lines.join(",\n")
    )
}

/// `INSERT OR REPLACE` for every column plus `updated_at`.
pub(crate) fn insert_or_replace(table: &str, columns: &[Column]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_ident(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let values = columns
        .iter()
        .map(|column| placeholder(column.kind))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT OR REPLACE INTO {table} ({names}, updated_at) VALUES ({values}, CURRENT_TIMESTAMP)"
    )
}

pub(crate) fn bind_value(cell: Cell<'_>) -> Value {
    match cell {
        Cell::Text(value) => Value::Text(value.to_owned()),
        Cell::Bool(value) => Value::Boolean(value),
        Cell::Int(value) => Value::Int(value),
        Cell::BigInt(value) => Value::BigInt(value),
        Cell::Float(value) => Value::Float(value),
        Cell::Double(value) => Value::Double(value),
        Cell::Date(Some(date)) => Value::Text(date.to_string()),
        Cell::Date(None) => Value::Null,
    }
}
