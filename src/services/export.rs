//! Output documents: the combined file and one file per dataset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::merger::CombinedGraph;
use super::pipeline::PipelineOutput;
use crate::config::OutputConfig;
use crate::error::AppError;
use crate::models::{Dataset, RelationshipRecord};

/// Run metadata stamped into the combined document.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub generated_at: DateTime<Utc>,
    /// Source file name → description.
    pub data_sources: BTreeMap<String, String>,
    pub version: String,
}

/// The combined output document.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub datasets: &'a [Dataset],
    pub combined: &'a CombinedGraph,
    pub tabular_relationships: &'a BTreeMap<String, Vec<RelationshipRecord>>,
    pub metadata: Metadata,
}

impl<'a> ExportDocument<'a> {
    pub fn new(output: &'a PipelineOutput, version: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            datasets: &output.datasets,
            combined: &output.combined,
            tabular_relationships: &output.combined.tabular_relationships,
            metadata: Metadata {
                generated_at,
                data_sources: output.data_sources.clone(),
                version: version.to_string(),
            },
        }
    }
}

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "dataset".to_string()
    } else {
        sanitized
    }
}

/// File name of a per-dataset document.
pub fn dataset_file_name(prefix: &str, dataset_name: &str) -> String {
    format!("{}{}.json", prefix, sanitize_file_name(dataset_name))
}

/// Writes run output under the configured directory.
pub struct Exporter<'a> {
    config: &'a OutputConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a OutputConfig) -> Self {
        Self { config }
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, AppError> {
        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }

    async fn write(&self, path: &Path, bytes: Vec<u8>) -> Result<(), AppError> {
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| AppError::io(path, e))
    }

    /// Writes the combined document and every per-dataset document.
    ///
    /// Returns the written paths, combined document first.
    pub async fn write_all(&self, output: &PipelineOutput) -> Result<Vec<PathBuf>, AppError> {
        let dir = &self.config.dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::io(dir, e))?;

        let document = ExportDocument::new(output, &self.config.version, Utc::now());
        let combined_path = dir.join(&self.config.combined_file);
        self.write(&combined_path, self.encode(&document)?).await?;

        let mut written = vec![combined_path];
        for dataset in &output.datasets {
            let path = dir.join(dataset_file_name(&self.config.dataset_prefix, &dataset.name));
            self.write(&path, self.encode(dataset)?).await?;
            tracing::debug!(dataset = %dataset.name, path = %path.display(), "Wrote dataset");
            written.push(path);
        }

        Ok(written)
    }
}
