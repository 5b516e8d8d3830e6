use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use clusterpilot_core::config::is_plain_identifier;
use clusterpilot_core::domain::row::SegmentRow;

use super::{ClusterSource, WarehouseError};
use crate::WarehousePool;

/// Reads every row of one warehouse table. Columns are matched to
/// `SegmentRow` fields by name; unknown columns are ignored.
#[derive(Clone)]
pub struct SqlClusterSource {
    pool: WarehousePool,
    table: String,
}

impl SqlClusterSource {
    pub fn new(pool: WarehousePool, table: impl Into<String>) -> Result<Self, WarehouseError> {
        let table = table.into();
        if !is_plain_identifier(&table) {
            return Err(WarehouseError::InvalidTable(table));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl ClusterSource for SqlClusterSource {
    async fn fetch_rows(&self) -> Result<Vec<SegmentRow>, WarehouseError> {
        let sql = format!("SELECT * FROM \"{}\" ORDER BY cluster_id", self.table);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    fn describe(&self) -> String {
        format!("sqlite table `{}`", self.table)
    }
}

fn decode_row(row: &SqliteRow) -> Result<SegmentRow, WarehouseError> {
    let mut object = Map::new();
    for column in row.columns() {
        let value = column_value(row, column.ordinal())?;
        object.insert(column.name().to_string(), value);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|error| WarehouseError::Decode(error.to_string()))
}

/// Decodes by storage class, since warehouse columns are often loosely declared.
fn column_value(row: &SqliteRow, index: usize) -> Result<Value, WarehouseError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();

    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" | "INT8" | "BIGINT" => {
            Value::from(row.try_get_unchecked::<i64, _>(index)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            let number = row.try_get_unchecked::<f64, _>(index)?;
            Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
        }
        "BLOB" => Value::Null,
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}
