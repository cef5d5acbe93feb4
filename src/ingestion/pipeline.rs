//! Ingestion Pipeline - Populates the store from the source CSV
//!
//! Acquire → Replace → Create+Load → Verify → Report. Any step failure
//! aborts the run; re-running starts from scratch and yields the same end
//! state (drop-and-recreate, never accumulation). Write atomicity is the
//! engine's own; the pipeline adds no transactional wrapping.

use crate::analytics;
use crate::config::Config;
use crate::error::{DaasError, Result};
use crate::executor::{QueryEnvelope, QueryExecutor};
use crate::ingestion::source::SourceRecordSet;
use crate::schema::TableSchema;
use crate::store::Store;
use polars::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Per-column line of the operator report.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub declared_type: String,
    pub null_count: usize,
    pub null_percentage: f64,
}

/// A diagnostic sample aggregate run against the fresh store.
#[derive(Clone, Debug, Serialize)]
pub struct SampleReport {
    pub title: String,
    pub envelope: QueryEnvelope,
}

/// Outcome of one pipeline run, consumed by the CLI for the operator report.
#[derive(Clone, Debug, Serialize)]
pub struct IngestReport {
    pub run_id: String,
    pub rows_loaded: usize,
    pub verified_count: u64,
    pub schema: TableSchema,
    pub columns: Vec<ColumnReport>,
    pub samples: Vec<SampleReport>,
    pub duration_ms: u64,
    pub store_path: PathBuf,
    pub setup_sql_path: PathBuf,
    pub analytics_sql_path: PathBuf,
}

pub struct IngestPipeline {
    config: Config,
}

impl IngestPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion. Not resumable; a failed run leaves the
    /// store in whatever state the engine's own guarantees provide.
    pub fn run(&self) -> Result<IngestReport> {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let table = self.config.table_name.clone();

        // Acquire
        let csv_path = self.config.csv_path();
        if !csv_path.exists() {
            return Err(DaasError::SourceMissing(format!(
                "{} (run `ingest fetch` first)",
                csv_path.display()
            )));
        }
        info!("📄 Reading source file: {}", csv_path.display());
        let source = SourceRecordSet::read_csv(&csv_path)?;
        info!(
            "✅ Source acquired: {} rows, {} columns",
            source.row_count(),
            source.columns().len()
        );

        // Schema
        let schema = TableSchema::infer(&table, &source);
        let collisions = schema.duplicate_names();
        if !collisions.is_empty() {
            return Err(DaasError::SchemaCollision(format!(
                "normalization collapsed distinct source columns into: {}",
                collisions.join(", ")
            )));
        }

        let columns: Vec<ColumnReport> = schema
            .columns
            .iter()
            .zip(source.columns())
            .map(|(def, src)| ColumnReport {
                name: def.name.clone(),
                declared_type: def.column_type.as_sql().to_string(),
                null_count: src.null_count,
                null_percentage: source.null_percentage(src),
            })
            .collect();

        // Replace: drop any existing store of the same logical name
        let store_path = self.config.store_path();
        match std::fs::remove_file(&store_path) {
            Ok(()) => info!("🗑️  Dropped existing store file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // Create+Load: the engine's reader-inferred types drive the store
        // schema end to end
        let rows_loaded = source.row_count();
        let mut frame = source.into_frame();
        std::fs::create_dir_all(&self.config.data_dir)?;
        let mut file = std::fs::File::create(&store_path)?;
        ParquetWriter::new(&mut file).finish(&mut frame)?;
        info!("📊 Store written: {}", store_path.display());

        // Generated artifacts: schema-definition script and canned-query
        // library, plain text, not consumed by the server
        self.write_setup_script(&schema, &csv_path)?;
        self.write_analytics_script(&table)?;

        // Verify: count query against the fresh store; the count is not
        // cross-checked against the source line count
        let store = Arc::new(Store::open_at(&store_path, &table)?);
        let executor = QueryExecutor::new(store);
        let count_envelope = executor
            .execute_canned(&analytics::count_rows(&table))
            .map_err(|e| DaasError::VerificationFailed(e.to_string()))?;
        let verified_count = count_envelope
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        info!("✅ Verified {} records", verified_count);

        // Report: sample aggregates, diagnostic only
        let samples = self.run_samples(&executor, &table)?;

        Ok(IngestReport {
            run_id,
            rows_loaded,
            verified_count,
            schema,
            columns,
            samples,
            duration_ms: start.elapsed().as_millis() as u64,
            store_path,
            setup_sql_path: self.config.setup_sql_path(),
            analytics_sql_path: self.config.analytics_sql_path(),
        })
    }

    fn run_samples(&self, executor: &QueryExecutor, table: &str) -> Result<Vec<SampleReport>> {
        let queries = [
            analytics::content_types(table),
            analytics::top_rated(table, 5),
            analytics::release_years(table, self.config.release_year_floor),
        ];

        let mut samples = Vec::new();
        for query in queries {
            let envelope = executor.execute_canned(&query)?;
            samples.push(SampleReport {
                title: query.name.to_string(),
                envelope,
            });
        }
        Ok(samples)
    }

    fn write_setup_script(&self, schema: &TableSchema, csv_path: &std::path::Path) -> Result<()> {
        let script = format!(
            "-- Netflix dataset setup for the embedded store\n\
             -- Generated by the ingestion pipeline\n\n\
             DROP TABLE IF EXISTS {table};\n\n\
             {create}\n\n\
             -- Bulk load from the source CSV\n\
             COPY {table} FROM '{csv}' (HEADER);\n\n\
             -- Verify data loaded\n\
             SELECT COUNT(*) AS total_records FROM {table};\n",
            table = schema.table_name,
            create = schema.create_table_sql(),
            csv = csv_path.display(),
        );
        std::fs::write(self.config.setup_sql_path(), script)?;
        Ok(())
    }

    fn write_analytics_script(&self, table: &str) -> Result<()> {
        let mut script = String::from("-- Sample analytics queries for the Netflix dataset\n\n");
        for query in analytics::library(table, self.config.release_year_floor) {
            script.push_str(&format!("-- {}\n{};\n\n", query.name, query.sql));
        }
        std::fs::write(self.config.analytics_sql_path(), script)?;
        Ok(())
    }
}
