//! Ingestion - Source acquisition, schema inference, and store population

pub mod pipeline;
pub mod source;

pub use pipeline::{ColumnReport, IngestPipeline, IngestReport, SampleReport};
pub use source::{SourceColumn, SourceRecordSet};
