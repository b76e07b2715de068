//! Pipeline stages that run after loading.
//!
//! Loaders turn documents into local graphs; services resolve references,
//! fold datasets into the combined graph, count categories and write the
//! output documents.

/// Logs a leniency event at `warn` in strict mode and at `debug` otherwise.
macro_rules! leniency {
    ($strict:expr, $($arg:tt)+) => {
        if $strict {
            tracing::warn!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

mod aggregator;
mod export;
mod merger;
mod pipeline;
mod resolver;

pub use aggregator::{classify, summarize, CategoryBuckets};
pub use export::{dataset_file_name, sanitize_file_name, ExportDocument, Exporter, Metadata};
pub use merger::{CombinedGraph, GraphAccumulator};
pub use pipeline::{read_sources, Pipeline, PipelineOutput, SourceDocument};
pub use resolver::{Resolution, Resolver};
