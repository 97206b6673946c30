//! Untyped row decoding

use carfuse_core::{Column, ExportRow};
use serde_json::{Map, Number, Value as JsonValue};
use sqlx::any::AnyRow;
use sqlx::{Column as _, Row};

use crate::models::DbText;

/// Decode one cell, trying integer, float, text (or UTF-8 bytes), bool then raw bytes
pub fn decode_cell(row: &AnyRow, index: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(JsonValue::Null, JsonValue::from);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(Number::from_f64)
            .map_or(JsonValue::Null, JsonValue::Number);
    }
    if let Ok(v) = row.try_get::<Option<DbText>, _>(index) {
        return v.map_or(JsonValue::Null, |text| JsonValue::String(text.into_inner()));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(JsonValue::Null, JsonValue::Bool);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(JsonValue::Null, |bytes| {
            JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
        });
    }
    JsonValue::Null
}

/// Column name to value map for one row
pub fn row_to_json(row: &AnyRow) -> Map<String, JsonValue> {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), decode_cell(row, col.ordinal())))
        .collect()
}

/// Text form of a cell for CSV output; NULL becomes empty
pub fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Export cells in the plan's column order
pub fn export_cells(row: &AnyRow, columns: &[Column]) -> ExportRow {
    let cells = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let value = row
                .try_column(column.export_alias())
                .map(|c| decode_cell(row, c.ordinal()))
                .unwrap_or_else(|_| decode_cell(row, index));
            cell_text(&value)
        })
        .collect();
    ExportRow { cells }
}
