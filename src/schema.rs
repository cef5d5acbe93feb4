//! Schema Inference - Maps the CSV reader's column types to store column types
//!
//! The destination type follows whatever the upstream tabular reader reports;
//! values are never re-scanned here. The mapping is total: anything the table
//! below does not recognize lands on VARCHAR.

use crate::ingestion::source::SourceRecordSet;
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Destination column types supported by the store schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Varchar,
    Integer,
    Double,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// Map a reader-reported type to a destination type. Total function;
    /// unrecognized types fall back to VARCHAR.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => ColumnType::Varchar,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnType::Integer,
            DataType::Float32 | DataType::Float64 => ColumnType::Double,
            DataType::Boolean => ColumnType::Boolean,
            DataType::Date | DataType::Datetime(_, _) => ColumnType::Timestamp,
            _ => ColumnType::Varchar,
        }
    }

    /// SQL type label used in DDL and in result-envelope column descriptions.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Integer => "INTEGER",
            ColumnType::Double => "DOUBLE",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Lowercase the name and replace spaces/hyphens with underscores. No further
/// escaping; reserved words are the caller's responsibility.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// One column of the destination table schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Destination table schema: normalized column names in source order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Infer the destination schema from a source record set. Pure and total:
    /// always produces a schema, possibly with VARCHAR fallbacks.
    pub fn infer(table_name: &str, source: &SourceRecordSet) -> Self {
        let columns = source
            .columns()
            .iter()
            .map(|col| ColumnDef {
                name: normalize_column_name(&col.name),
                column_type: ColumnType::from_dtype(&col.dtype),
            })
            .collect();

        Self {
            table_name: table_name.to_string(),
            columns,
        }
    }

    /// Normalized names that more than one source column collapsed into.
    /// The ingestion pipeline fails loudly when this is non-empty.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for col in &self.columns {
            *seen.entry(col.name.as_str()).or_insert(0) += 1;
        }
        let mut dupes: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        dupes.sort();
        dupes
    }

    /// Render a CREATE TABLE statement for the generated setup script.
    pub fn create_table_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {} {}", c.name, c.column_type.as_sql()))
            .collect();
        format!(
            "CREATE TABLE {} (\n{}\n);",
            self.table_name,
            cols.join(",\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::source::SourceColumn;

    fn source_with(columns: Vec<SourceColumn>) -> SourceRecordSet {
        SourceRecordSet::from_columns_for_test(columns)
    }

    fn col(name: &str, dtype: DataType) -> SourceColumn {
        SourceColumn {
            name: name.to_string(),
            dtype,
            null_count: 0,
        }
    }

    #[test]
    fn type_mapping_is_total() {
        // Every type the inferencer may encounter, plus one it does not
        // recognize, maps to a non-empty destination type without failing.
        let cases = vec![
            (DataType::String, ColumnType::Varchar),
            (DataType::Int64, ColumnType::Integer),
            (DataType::Float64, ColumnType::Double),
            (DataType::Boolean, ColumnType::Boolean),
            (DataType::Date, ColumnType::Timestamp),
            (DataType::Time, ColumnType::Varchar),
            (DataType::Null, ColumnType::Varchar),
        ];

        for (dtype, expected) in cases {
            let mapped = ColumnType::from_dtype(&dtype);
            assert_eq!(mapped, expected, "mapping for {:?}", dtype);
            assert!(!mapped.as_sql().is_empty());
        }
    }

    #[test]
    fn normalization_lowercases_and_replaces_separators() {
        assert_eq!(normalize_column_name("IMDB Score"), "imdb_score");
        assert_eq!(normalize_column_name("age-certification"), "age_certification");
        assert_eq!(normalize_column_name("release_year"), "release_year");
    }

    #[test]
    fn infer_preserves_source_column_order() {
        let source = source_with(vec![
            col("Title", DataType::String),
            col("Release Year", DataType::Int64),
            col("IMDB Score", DataType::Float64),
        ]);
        let schema = TableSchema::infer("netflix_shows", &source);

        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["title", "release_year", "imdb_score"]);
        assert_eq!(schema.columns[1].column_type, ColumnType::Integer);
        assert_eq!(schema.columns[2].column_type, ColumnType::Double);
    }

    #[test]
    fn duplicate_names_reports_collisions() {
        let source = source_with(vec![
            col("imdb score", DataType::Float64),
            col("imdb-score", DataType::Float64),
            col("title", DataType::String),
        ]);
        let schema = TableSchema::infer("netflix_shows", &source);
        assert_eq!(schema.duplicate_names(), vec!["imdb_score".to_string()]);
    }

    #[test]
    fn create_table_sql_lists_columns_in_order() {
        let source = source_with(vec![
            col("title", DataType::String),
            col("runtime", DataType::Int64),
        ]);
        let schema = TableSchema::infer("netflix_shows", &source);
        let sql = schema.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE netflix_shows ("));
        assert!(sql.contains("title VARCHAR"));
        assert!(sql.contains("runtime INTEGER"));
    }
}
