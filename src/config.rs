//! Runtime configuration resolved from environment variables
//!
//! Binaries call `dotenv::dotenv().ok()` before `Config::from_env()` so a
//! local .env file can override the defaults.

use std::path::PathBuf;

/// Fixed logical name of the stored table.
pub const TABLE_NAME: &str = "netflix_shows";

/// The single data-source identifier accepted by the generic query endpoint.
pub const DATA_SOURCE_ID: &str = "netflix-store";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the CSV, the store file, and generated SQL artifacts
    pub data_dir: PathBuf,

    /// Logical table name inside the store
    pub table_name: String,

    /// Data-source identifier callers must supply on POST /api/query
    pub data_source_id: String,

    /// Server bind address
    pub bind_addr: String,

    /// Year floor applied by the release-years endpoint
    pub release_year_floor: i32,

    /// Optional download URL for the `fetch` subcommand
    pub dataset_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("NETFLIX_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let bind_addr = std::env::var("NETFLIX_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3001".to_string());

        let release_year_floor = std::env::var("NETFLIX_YEAR_FLOOR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2010);

        Self {
            data_dir,
            table_name: TABLE_NAME.to_string(),
            data_source_id: DATA_SOURCE_ID.to_string(),
            bind_addr,
            release_year_floor,
            dataset_url: std::env::var("NETFLIX_CSV_URL").ok(),
        }
    }

    /// Config rooted at an explicit data directory. Used by tests and the
    /// ingest CLI's --data-dir override.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Self::from_env()
        }
    }

    /// Path of the source CSV inside the data directory.
    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("netflix_imdb_dataset.csv")
    }

    /// Path of the on-disk store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("netflix_shows.parquet")
    }

    /// Path of the generated schema-definition script.
    pub fn setup_sql_path(&self) -> PathBuf {
        self.data_dir.join("setup_netflix_store.sql")
    }

    /// Path of the generated canned-analytics library.
    pub fn analytics_sql_path(&self) -> PathBuf {
        self.data_dir.join("netflix_analytics_queries.sql")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
