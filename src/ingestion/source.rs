//! Source Record Set - Reads the delimited source file through the engine's
//! CSV reader and keeps the per-column type/null summary the reader reports.

use crate::error::Result;
use polars::prelude::*;
use std::path::Path;

/// Per-column summary as reported by the CSV reader.
#[derive(Clone, Debug)]
pub struct SourceColumn {
    pub name: String,
    pub dtype: DataType,
    pub null_count: usize,
}

/// The rows read from the source file plus their column summary. Produced
/// once, immutable, discarded after the store is populated.
pub struct SourceRecordSet {
    frame: DataFrame,
    columns: Vec<SourceColumn>,
}

impl SourceRecordSet {
    /// Read a headered CSV, letting the engine infer column types.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let frame = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .with_infer_schema_length(Some(1000))
            .finish()?
            .collect()?;

        Ok(Self::from_frame(frame))
    }

    pub fn from_frame(frame: DataFrame) -> Self {
        let columns = frame
            .get_columns()
            .iter()
            .map(|series| SourceColumn {
                name: series.name().to_string(),
                dtype: series.dtype().clone(),
                null_count: series.null_count(),
            })
            .collect();

        Self { frame, columns }
    }

    pub fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Null percentage for one column, for the operator report.
    pub fn null_percentage(&self, column: &SourceColumn) -> f64 {
        if self.frame.height() == 0 {
            return 0.0;
        }
        column.null_count as f64 * 100.0 / self.frame.height() as f64
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    #[cfg(test)]
    pub fn from_columns_for_test(columns: Vec<SourceColumn>) -> Self {
        Self {
            frame: DataFrame::empty(),
            columns,
        }
    }
}
