//! Source reading and the per-source processing sequence.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::Utc;
use futures::future::join_all;

use super::aggregator::summarize;
use super::export::dataset_file_name;
use super::merger::{CombinedGraph, GraphAccumulator};
use super::resolver::Resolver;
use crate::config::{Config, Source};
use crate::error::AppError;
use crate::loaders::{loader_for, strip_bom};
use crate::models::{Dataset, Diagnostics};

/// A declared source together with its document text.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub source: Source,
    pub text: String,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Datasets in fold order.
    pub datasets: Vec<Dataset>,
    pub combined: CombinedGraph,
    /// Source file name → description, for processed sources only.
    pub data_sources: BTreeMap<String, String>,
}

async fn read_source(source: &Source, base_dir: &Path) -> Result<String, AppError> {
    let path = source.resolve_path(base_dir);
    tokio::fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::MissingSource(path.clone())
        } else {
            AppError::io(&path, e)
        }
    })
}

/// Reads every declared source concurrently, keeping declaration order.
///
/// Sources that cannot be read are logged and left out.
pub async fn read_sources(sources: &[Source], base_dir: &Path) -> Vec<SourceDocument> {
    let reads = sources.iter().map(|source| read_source(source, base_dir));
    let results = join_all(reads).await;

    sources
        .iter()
        .zip(results)
        .filter_map(|(source, result)| match result {
            Ok(text) => Some(SourceDocument {
                source: source.clone(),
                text,
            }),
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "Omitting unreadable source");
                None
            }
        })
        .collect()
}

/// Id prefixes and dataset file names taken by sources already folded.
#[derive(Debug, Default)]
struct ClaimedSources {
    keys: HashSet<String>,
    files: HashSet<String>,
}

impl ClaimedSources {
    /// Rejects a source whose key or dataset file would clash with an earlier one.
    fn check(&self, source: &Source, prefix: &str) -> Result<(), AppError> {
        let reason = if self.keys.contains(source.key()) {
            format!("key `{}` is already used by an earlier source", source.key())
        } else if self.files.contains(&dataset_file_name(prefix, &source.name)) {
            format!("name `{}` clashes with an earlier source", source.name)
        } else {
            return Ok(());
        };

        Err(AppError::InvalidSource {
            name: source.name.clone(),
            reason,
        })
    }

    fn insert(&mut self, source: &Source, prefix: &str) {
        self.keys.insert(source.key().to_string());
        self.files.insert(dataset_file_name(prefix, &source.name));
    }
}

/// Runs loaded documents through load → resolve → summarize → fold.
pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn strict(&self) -> bool {
        self.config.pipeline.strict_mode
    }

    /// Turns one document into a dataset.
    pub fn process(&self, source: &Source, text: &str) -> Result<Dataset, AppError> {
        let loader = loader_for(source, self.config)?;
        let mut graph = loader.load(strip_bom(text))?;

        let resolution =
            Resolver::new(self.config.pipeline.ambiguity, self.strict()).resolve(&graph);
        graph.diagnostics.dangling_references = resolution.dangling;
        graph.diagnostics.ambiguous_references = resolution.ambiguous;
        self.report(source, &graph.diagnostics);

        let summary = summarize(
            &graph.nodes,
            &resolution.relationships,
            &self.config.categories,
        );

        Ok(Dataset {
            name: source.name.clone(),
            key: source.key().to_string(),
            data_source: source.file_name(),
            summary,
            nodes: graph.nodes,
            relationships: resolution.relationships,
            records: graph.records,
            diagnostics: graph.diagnostics,
            id_scope: graph.id_scope,
        })
    }

    fn report(&self, source: &Source, diagnostics: &Diagnostics) {
        for skipped in &diagnostics.skipped_statements {
            leniency!(
                self.strict(),
                source = %source.name,
                line = skipped.line,
                text = %skipped.text,
                reason = %skipped.reason,
                "Skipped statement"
            );
        }
        if diagnostics.duplicate_ids > 0 {
            leniency!(
                self.strict(),
                source = %source.name,
                count = diagnostics.duplicate_ids,
                "Renamed duplicate node ids"
            );
        }
        if diagnostics.skipped_records > 0 {
            leniency!(
                self.strict(),
                source = %source.name,
                count = diagnostics.skipped_records,
                "Skipped records"
            );
        }
    }

    /// Processes documents sequentially and folds them in the given order.
    ///
    /// A source that fails is logged and omitted; the run always completes.
    pub fn run(&self, documents: &[SourceDocument]) -> PipelineOutput {
        let mut accumulator = GraphAccumulator::new();
        let mut datasets = Vec::with_capacity(documents.len());
        let mut data_sources = BTreeMap::new();

        let prefix = &self.config.output.dataset_prefix;
        let mut claimed = ClaimedSources::default();

        for document in documents {
            let source = &document.source;
            let result = claimed
                .check(source, prefix)
                .and_then(|()| self.process(source, &document.text));
            match result {
                Ok(dataset) => {
                    claimed.insert(source, prefix);
                    tracing::info!(
                        source = %source.name,
                        nodes = dataset.summary.total_nodes,
                        relationships = dataset.summary.total_relationships,
                        records = dataset.records.len(),
                        "Processed source"
                    );
                    accumulator.fold(&dataset, Utc::now());

                    // Same file name in another directory: fall back to the declared path
                    let file = if data_sources.contains_key(&dataset.data_source) {
                        source.path.to_string_lossy().to_string()
                    } else {
                        dataset.data_source.clone()
                    };
                    data_sources.insert(
                        file,
                        source
                            .description
                            .clone()
                            .unwrap_or_else(|| source.name.clone()),
                    );
                    datasets.push(dataset);
                }
                Err(e) => {
                    tracing::error!(source = %source.name, error = %e, "Omitting source");
                }
            }
        }

        PipelineOutput {
            datasets,
            combined: accumulator.finish(&self.config.categories),
            data_sources,
        }
    }
}
