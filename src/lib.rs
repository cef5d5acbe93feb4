//! netflix-daas - Data-as-a-service demo over an embedded analytical store
//!
//! A fixed CSV dataset is downloaded, loaded into an embedded analytical
//! store (polars' SQL engine over a Parquet file), and served through a
//! handful of HTTP endpoints that run SQL and return JSON rows plus timing
//! metadata. Query planning, storage, and execution are the engine's;
//! this crate shapes connection lifecycle, schema generation from column
//! types, and response formatting.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod executor;
pub mod ingestion;
pub mod schema;
pub mod store;

pub use error::{DaasError, Result};
