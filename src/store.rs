//! Store - Connection manager for the embedded analytical engine
//!
//! Owns the single handle to the on-disk store for the life of the serving
//! process. The handle is built once at startup and passed into the HTTP
//! layer, so tests can substitute an in-memory fixture store instead of
//! touching shared state. Serialized access through one mutex is acceptable
//! for a read-mostly demo workload.

use crate::config::Config;
use crate::error::{DaasError, Result};
use polars::prelude::*;
use polars::sql::SQLContext;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct Store {
    path: PathBuf,
    table_name: String,
    ctx: Mutex<SQLContext>,
}

impl Store {
    /// Open the on-disk store at the configured path. Fails if the store
    /// file does not exist; it is never auto-created at serve time.
    pub fn open(config: &Config) -> Result<Store> {
        Self::open_at(&config.store_path(), &config.table_name)
    }

    pub fn open_at(path: &Path, table_name: &str) -> Result<Store> {
        if !path.exists() {
            return Err(DaasError::StoreNotFound(format!(
                "{} (run `ingest load` first)",
                path.display()
            )));
        }

        let frame = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?;
        let mut ctx = SQLContext::new();
        ctx.register(table_name, frame);

        Ok(Store {
            path: path.to_path_buf(),
            table_name: table_name.to_string(),
            ctx: Mutex::new(ctx),
        })
    }

    /// Build a store over an in-memory frame. Used by fixture-driven tests.
    pub fn from_frame(frame: DataFrame, table_name: &str) -> Store {
        let mut ctx = SQLContext::new();
        ctx.register(table_name, frame.lazy());

        Store {
            path: PathBuf::new(),
            table_name: table_name.to_string(),
            ctx: Mutex::new(ctx),
        }
    }

    /// Run one statement to completion and materialize the result. Engine
    /// errors come back as `QueryFailed` with the engine message verbatim.
    pub fn run_sql(&self, sql: &str) -> Result<DataFrame> {
        let mut ctx = self.ctx.lock().unwrap();
        ctx.execute(sql)
            .and_then(|frame| frame.collect())
            .map_err(|e| DaasError::QueryFailed(e.to_string()))
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
