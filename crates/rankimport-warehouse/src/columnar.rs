//! Parquet writer for any [`Tabular`] record type.
//!
//! The file schema is derived from the record's column table, so the parquet
//! columns match the DuckDB columns name for name. Files are GZIP compressed
//! with 8 KiB data pages; row groups are flushed once the buffered data
//! reaches 128 MiB.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Date32Builder, Float32Builder, Float64Builder, Int32Builder,
    Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use rankimport_core::{days_since_unix_epoch, Cell, Column, ColumnKind, Tabular};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

pub const ROW_GROUP_TARGET_BYTES: usize = 128 * 1024 * 1024;
pub const DATA_PAGE_TARGET_BYTES: usize = 8 * 1024;
const BATCH_ROWS: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum ColumnarError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parquet(#[from] ParquetError),

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Rows written and rows rejected by one [`write_parquet`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    pub rejected: usize,
}

/// Arrow schema for a column table. Only date columns are nullable.
pub fn arrow_schema(columns: &[Column]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|column| {
            Field::new(
                column.name,
                data_type(column.kind),
                column.kind == ColumnKind::Date,
            )
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn data_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Text => DataType::Utf8,
        ColumnKind::Bool => DataType::Boolean,
        ColumnKind::Int => DataType::Int32,
        ColumnKind::BigInt => DataType::Int64,
        ColumnKind::Float => DataType::Float32,
        ColumnKind::Double => DataType::Float64,
        ColumnKind::Date => DataType::Date32,
    }
}

pub fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::GZIP(GzipLevel::default()))
        .set_data_page_size_limit(DATA_PAGE_TARGET_BYTES)
        .build()
}

/// Write `records` to a new parquet file at `path`.
///
/// A record that cannot be serialized (no ticker, or cells that do not line
/// up with the column table) is logged and skipped. Only failing to create
/// the file, encode a batch, or finalize the footer is an error; the file
/// handle is released on every path because the writer owns it.
pub fn write_parquet<T: Tabular>(records: &[T], path: &Path) -> Result<WriteReport, ColumnarError> {
    let columns = T::columns();
    let schema = arrow_schema(columns);

    let file = File::create(path).map_err(|source| ColumnarError::Create {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(writer_properties()))?;

    let mut report = WriteReport::default();
    let mut batch = BatchBuilder::new(columns);

    for record in records {
        let cells = record.cells();
        if let Err(reason) = check_row(record, columns, &cells) {
            report.rejected += 1;
            error!(key = %record.row_key(), reason, "failed to write record to parquet");
            continue;
        }

        batch.append(&cells);
        report.written += 1;

        if batch.len() >= BATCH_ROWS {
            flush_batch(&mut writer, &schema, &mut batch)?;
        }
    }

    if batch.len() > 0 {
        flush_batch(&mut writer, &schema, &mut batch)?;
    }
    writer.close()?;

    debug!(
        path = %path.display(),
        written = report.written,
        rejected = report.rejected,
        "wrote parquet file"
    );
    Ok(report)
}

fn check_row<T: Tabular>(
    record: &T,
    columns: &[Column],
    cells: &[Cell<'_>],
) -> Result<(), &'static str> {
    if record.row_key().ticker.trim().is_empty() {
        return Err("empty ticker");
    }
    if cells.len() != columns.len() {
        return Err("cell count does not match column count");
    }
    let aligned = cells
        .iter()
        .zip(columns)
        .all(|(cell, column)| cell_kind(cell) == column.kind);
    if !aligned {
        return Err("cell kind does not match column kind");
    }
    Ok(())
}

fn cell_kind(cell: &Cell<'_>) -> ColumnKind {
    match cell {
        Cell::Text(_) => ColumnKind::Text,
        Cell::Bool(_) => ColumnKind::Bool,
        Cell::Int(_) => ColumnKind::Int,
        Cell::BigInt(_) => ColumnKind::BigInt,
        Cell::Float(_) => ColumnKind::Float,
        Cell::Double(_) => ColumnKind::Double,
        Cell::Date(_) => ColumnKind::Date,
    }
}

fn flush_batch(
    writer: &mut ArrowWriter<File>,
    schema: &SchemaRef,
    batch: &mut BatchBuilder,
) -> Result<(), ColumnarError> {
    let arrays = batch.finish();
    let record_batch = RecordBatch::try_new(Arc::clone(schema), arrays)?;
    writer.write(&record_batch)?;

    if writer.in_progress_size() >= ROW_GROUP_TARGET_BYTES {
        writer.flush()?;
    }
    Ok(())
}

enum ColumnBuilder {
    Text(StringBuilder),
    Bool(BooleanBuilder),
    Int(Int32Builder),
    BigInt(Int64Builder),
    Float(Float32Builder),
    Double(Float64Builder),
    Date(Date32Builder),
}

impl ColumnBuilder {
    fn new(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Text => Self::Text(StringBuilder::new()),
            ColumnKind::Bool => Self::Bool(BooleanBuilder::new()),
            ColumnKind::Int => Self::Int(Int32Builder::new()),
            ColumnKind::BigInt => Self::BigInt(Int64Builder::new()),
            ColumnKind::Float => Self::Float(Float32Builder::new()),
            ColumnKind::Double => Self::Double(Float64Builder::new()),
            ColumnKind::Date => Self::Date(Date32Builder::new()),
        }
    }

    /// Cells have been checked against the column kinds before this is called.
    fn append(&mut self, cell: &Cell<'_>) {
        match (self, cell) {
            (Self::Text(builder), Cell::Text(value)) => builder.append_value(value),
            (Self::Bool(builder), Cell::Bool(value)) => builder.append_value(*value),
            (Self::Int(builder), Cell::Int(value)) => builder.append_value(*value),
            (Self::BigInt(builder), Cell::BigInt(value)) => builder.append_value(*value),
            (Self::Float(builder), Cell::Float(value)) => builder.append_value(*value),
            (Self::Double(builder), Cell::Double(value)) => builder.append_value(*value),
            (Self::Date(builder), Cell::Date(value)) => {
                builder.append_option(value.map(days_since_unix_epoch));
            }
            _ => {}
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Text(builder) => Arc::new(builder.finish()),
            Self::Bool(builder) => Arc::new(builder.finish()),
            Self::Int(builder) => Arc::new(builder.finish()),
            Self::BigInt(builder) => Arc::new(builder.finish()),
            Self::Float(builder) => Arc::new(builder.finish()),
            Self::Double(builder) => Arc::new(builder.finish()),
            Self::Date(builder) => Arc::new(builder.finish()),
        }
    }
}

struct BatchBuilder {
    builders: Vec<ColumnBuilder>,
    rows: usize,
}

impl BatchBuilder {
    fn new(columns: &[Column]) -> Self {
        Self {
            builders: columns
                .iter()
                .map(|column| ColumnBuilder::new(column.kind))
                .collect(),
            rows: 0,
        }
    }

    fn append(&mut self, cells: &[Cell<'_>]) {
        for (builder, cell) in self.builders.iter_mut().zip(cells) {
            builder.append(cell);
        }
        self.rows += 1;
    }

    fn len(&self) -> usize {
        self.rows
    }

    /// Drain the buffered rows into arrays, leaving the builders empty.
    fn finish(&mut self) -> Vec<ArrayRef> {
        self.rows = 0;
        self.builders.iter_mut().map(ColumnBuilder::finish).collect()
    }
}
