//! Query Executor - Runs SQL against the store and shapes the result envelope
//!
//! Every endpoint funnels through `execute`: one statement, run to
//! completion, wall-clocked, materialized fully in memory, and normalized
//! into the columns + rows + metadata envelope.

use crate::analytics::CannedQuery;
use crate::error::{DaasError, Result};
use crate::schema::ColumnType;
use crate::store::Store;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Column description in the result envelope. `nullable` is conservatively
/// always true: the engine's result description does not distinguish
/// nullability.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub type_label: String,
    pub nullable: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    /// Wall-clock duration of the engine call, milliseconds
    pub execution_time_ms: f64,

    /// Equals rows.len()
    pub row_count: usize,

    /// Reserved; always zero in this design
    pub data_scanned: u64,

    /// No caching layer exists; always false
    pub cached: bool,
}

/// The unit returned to every caller.
#[derive(Clone, Debug, Serialize)]
pub struct QueryEnvelope {
    pub rows: Vec<Map<String, Value>>,
    pub columns: Vec<ColumnMeta>,
    pub metadata: QueryMetadata,
}

pub struct QueryExecutor {
    store: Arc<Store>,
}

impl QueryExecutor {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Execute an arbitrary statement and normalize the result.
    pub fn execute(&self, sql: &str) -> Result<QueryEnvelope> {
        if sql.trim().is_empty() {
            return Err(DaasError::BadRequest("SQL query is required".to_string()));
        }

        info!("🔍 Executing query: {}", truncate(sql, 100));
        let start = Instant::now();
        let frame = self.store.run_sql(sql)?;
        let execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let envelope = build_envelope(&frame, execution_time_ms);
        info!(
            "✅ Query completed: {} rows in {}ms",
            envelope.metadata.row_count, envelope.metadata.execution_time_ms
        );
        Ok(envelope)
    }

    /// Convenience wrapper for the fixed canned analytical queries.
    pub fn execute_canned(&self, query: &CannedQuery) -> Result<QueryEnvelope> {
        info!("📊 Running canned query: {}", query.name);
        self.execute(&query.sql)
    }
}

/// Columns are described once from the result frame's own schema; row values
/// are then extracted by column index against that order, and only assembled
/// into name-keyed JSON maps at the serialization boundary.
fn build_envelope(frame: &polars::prelude::DataFrame, execution_time_ms: f64) -> QueryEnvelope {
    let series_list = frame.get_columns();

    let columns: Vec<ColumnMeta> = series_list
        .iter()
        .map(|series| ColumnMeta {
            name: series.name().to_string(),
            type_label: ColumnType::from_dtype(series.dtype()).as_sql().to_string(),
            nullable: true,
        })
        .collect();

    let mut rows = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let mut row = Map::new();
        for (series, meta) in series_list.iter().zip(&columns) {
            let value = series
                .get(idx)
                .map(any_value_to_json)
                .unwrap_or(Value::Null);
            row.insert(meta.name.clone(), value);
        }
        rows.push(row);
    }

    QueryEnvelope {
        metadata: QueryMetadata {
            execution_time_ms: (execution_time_ms * 100.0).round() / 100.0,
            row_count: rows.len(),
            data_scanned: 0,
            cached: false,
        },
        rows,
        columns,
    }
}

/// Opaque value passthrough: no coercion beyond what the engine returns.
fn any_value_to_json(val: polars::prelude::AnyValue) -> Value {
    use polars::prelude::AnyValue;
    match val {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(i) => Value::Number((i as i64).into()),
        AnyValue::Int16(i) => Value::Number((i as i64).into()),
        AnyValue::Int32(i) => Value::Number((i as i64).into()),
        AnyValue::Int64(i) => Value::Number(i.into()),
        AnyValue::UInt8(u) => Value::Number((u as u64).into()),
        AnyValue::UInt16(u) => Value::Number((u as u64).into()),
        AnyValue::UInt32(u) => Value::Number((u as u64).into()),
        AnyValue::UInt64(u) => Value::Number(u.into()),
        AnyValue::Float32(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => Value::String(format!("{}", other)),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}
