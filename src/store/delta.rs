//! Delta Lake / CSV backend over DataFusion
//!
//! Tables are registered into a DataFusion `SessionContext` by path: `.csv`
//! files through the CSV reader, anything else as a Delta table. Delta has
//! no foreign key metadata, so relations are declared up front.

use crate::catalog::{Catalog, CatalogReader, ColumnDescriptor, ForeignKeyDescriptor, TableFilter};
use crate::error::{GraphOrmError, Result};
use crate::store::{CellValue, Row, RowFetcher};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use datafusion::arrow::array::*;
use datafusion::arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::logical_expr::{Expr, TableType};
use datafusion::prelude::*;
use std::sync::Arc;

/// DataFusion-backed catalog reader and row fetcher
#[derive(Clone)]
pub struct DeltaStore {
    ctx: SessionContext,
    /// Registered table names, in registration order
    tables: Vec<String>,
    relations: Vec<ForeignKeyDescriptor>,
    filter: TableFilter,
}

impl DeltaStore {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
            tables: Vec::new(),
            relations: Vec::new(),
            filter: TableFilter::default(),
        }
    }

    /// Declare relations between registered tables
    pub fn with_relations(mut self, relations: Vec<ForeignKeyDescriptor>) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Names of the registered tables
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Register a table from a file path (CSV for testing, Delta otherwise)
    pub async fn register_table_from_path(&mut self, name: &str, path: &str) -> Result<()> {
        if path.ends_with(".csv") {
            self.ctx
                .register_csv(name, path, CsvReadOptions::default())
                .await
                .map_err(|e| {
                    GraphOrmError::Connectivity(format!("Failed to register CSV '{}': {}", path, e))
                })?;
        } else {
            let delta_table = deltalake::open_table(path).await.map_err(|e| {
                GraphOrmError::Connectivity(format!("Failed to open Delta table '{}': {}", path, e))
            })?;

            self.ctx.register_table(name, Arc::new(delta_table))?;
        }

        tracing::info!("Registered table {} from {}", name, path);
        self.tables.push(name.to_string());
        Ok(())
    }

    async fn registered(&self, table: &str) -> Result<DataFrame> {
        if !self.tables.iter().any(|t| t == table) {
            return Err(GraphOrmError::Query(format!("Unknown table '{}'", table)));
        }
        Ok(self.ctx.table(table).await?)
    }
}

impl Default for DeltaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogReader for DeltaStore {
    async fn read(&self) -> Result<Catalog> {
        let mut columns = Vec::new();

        for table in &self.tables {
            let provider = self.ctx.table_provider(table.as_str()).await?;
            if provider.table_type() != TableType::Base {
                tracing::debug!("Skipping non-base table {}", table);
                continue;
            }

            for field in provider.schema().fields() {
                columns.push(ColumnDescriptor::new(
                    table,
                    field.name(),
                    &field.data_type().to_string(),
                ));
            }
        }

        let catalog = Catalog::new(columns, self.relations.clone()).finalize(&self.filter);
        tracing::info!(
            "Read Delta catalog: {} tables, {} declared relations",
            self.tables.len(),
            catalog.foreign_keys.len()
        );
        Ok(catalog)
    }
}

#[async_trait]
impl RowFetcher for DeltaStore {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        tracing::debug!("Scanning table {}", table);
        let batches = self.registered(table).await?.collect().await?;
        record_batches_to_rows(&batches)
    }

    async fn fetch_where(&self, table: &str, column: &str, value: &CellValue) -> Result<Vec<Row>> {
        if value.is_null() {
            return Ok(Vec::new());
        }

        let df = self.registered(table).await?;
        if df.schema().field_with_unqualified_name(column).is_err() {
            return Err(GraphOrmError::Query(format!(
                "Unknown column '{}' on table '{}'",
                column, table
            )));
        }

        tracing::debug!("Scanning table {} where {} = {}", table, column, value);
        let batches = df
            .filter(ident(column).eq(literal(value)))?
            .collect()
            .await?;
        record_batches_to_rows(&batches)
    }
}

fn literal(value: &CellValue) -> Expr {
    match value {
        CellValue::Null => lit(datafusion::scalar::ScalarValue::Null),
        CellValue::Integer(i) => lit(*i),
        CellValue::Float(f) => lit(*f),
        CellValue::Text(s) => lit(s.clone()),
        CellValue::Boolean(b) => lit(*b),
    }
}

fn record_batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            rows.push(record_batch_row(batch, row_idx)?);
        }
    }
    Ok(rows)
}

fn downcast<'a, T: 'static>(column: &'a ArrayRef, name: &str) -> Result<&'a T> {
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        GraphOrmError::Query(format!(
            "Column '{}' does not match its declared type {}",
            name,
            column.data_type()
        ))
    })
}

/// Convert one row of a RecordBatch into a [`Row`]
///
/// Integers, floats, strings and booleans keep their shape. Timestamps
/// and dates become ISO 8601 strings. Unsupported types are read as null.
pub fn record_batch_row(batch: &RecordBatch, row_idx: usize) -> Result<Row> {
    let schema = batch.schema();
    let mut row = Row::with_capacity(schema.fields().len());

    for (col_idx, field) in schema.fields().iter().enumerate() {
        let column = batch.column(col_idx);
        let name = field.name().as_str();

        if column.is_null(row_idx) {
            row.insert(name.to_string(), CellValue::Null);
            continue;
        }

        let value = match column.data_type() {
            ArrowDataType::Int8 => CellValue::Integer(downcast::<Int8Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int16 => CellValue::Integer(downcast::<Int16Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int32 => CellValue::Integer(downcast::<Int32Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Int64 => CellValue::Integer(downcast::<Int64Array>(column, name)?.value(row_idx)),
            ArrowDataType::UInt8 => CellValue::Integer(downcast::<UInt8Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt16 => CellValue::Integer(downcast::<UInt16Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt32 => CellValue::Integer(downcast::<UInt32Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::UInt64 => {
                let val = downcast::<UInt64Array>(column, name)?.value(row_idx);
                // u64 beyond i64 range is kept as text
                match i64::try_from(val) {
                    Ok(i) => CellValue::Integer(i),
                    Err(_) => CellValue::Text(val.to_string()),
                }
            }
            ArrowDataType::Float32 => CellValue::Float(downcast::<Float32Array>(column, name)?.value(row_idx).into()),
            ArrowDataType::Float64 => CellValue::Float(downcast::<Float64Array>(column, name)?.value(row_idx)),
            ArrowDataType::Utf8 => CellValue::Text(downcast::<StringArray>(column, name)?.value(row_idx).to_string()),
            ArrowDataType::LargeUtf8 => {
                CellValue::Text(downcast::<LargeStringArray>(column, name)?.value(row_idx).to_string())
            }
            ArrowDataType::Boolean => CellValue::Boolean(downcast::<BooleanArray>(column, name)?.value(row_idx)),
            ArrowDataType::Timestamp(unit, _tz) => {
                let datetime: Option<DateTime<Utc>> = match unit {
                    TimeUnit::Second => {
                        DateTime::from_timestamp(downcast::<TimestampSecondArray>(column, name)?.value(row_idx), 0)
                    }
                    TimeUnit::Millisecond => DateTime::from_timestamp_millis(
                        downcast::<TimestampMillisecondArray>(column, name)?.value(row_idx),
                    ),
                    TimeUnit::Microsecond => DateTime::from_timestamp_micros(
                        downcast::<TimestampMicrosecondArray>(column, name)?.value(row_idx),
                    ),
                    TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(
                        downcast::<TimestampNanosecondArray>(column, name)?.value(row_idx),
                    )),
                };
                let datetime = datetime.ok_or_else(|| {
                    GraphOrmError::Query(format!("Invalid timestamp in column '{}'", name))
                })?;
                CellValue::Text(datetime.to_rfc3339())
            }
            ArrowDataType::Date32 => {
                let days = downcast::<Date32Array>(column, name)?.value(row_idx);
                let date = epoch()?
                    .checked_add_signed(chrono::Duration::days(days.into()))
                    .ok_or_else(|| GraphOrmError::Query(format!("Invalid date: {} days", days)))?;
                CellValue::Text(date.format("%Y-%m-%d").to_string())
            }
            ArrowDataType::Date64 => {
                let millis = downcast::<Date64Array>(column, name)?.value(row_idx);
                let date = epoch()?
                    .checked_add_signed(chrono::Duration::milliseconds(millis))
                    .ok_or_else(|| GraphOrmError::Query(format!("Invalid date: {} ms", millis)))?;
                CellValue::Text(date.format("%Y-%m-%d").to_string())
            }
            other => {
                tracing::warn!(
                    "Unsupported type {:?} for column '{}', returning null",
                    other,
                    name
                );
                CellValue::Null
            }
        };

        row.insert(name.to_string(), value);
    }

    Ok(row)
}

fn epoch() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| GraphOrmError::Query("Invalid base date".to_string()))
}
