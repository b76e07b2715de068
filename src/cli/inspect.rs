//! Inspect subcommand - summarise a combined output document.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::models::Summary;

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    #[default]
    Text,
    Json,
    Toon,
}

/// Summarise a combined document written by `build`.
#[derive(Parser)]
pub struct InspectCommand {
    /// Path to the combined JSON document.
    pub file: PathBuf,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = InspectFormat::Text)]
    pub format: InspectFormat,
}

#[derive(Deserialize)]
struct CombinedSection {
    summary: Summary,
}

#[derive(Deserialize)]
struct DatasetSection {
    name: String,
    summary: Summary,
}

/// The parts of a combined document the report reads.
#[derive(Deserialize)]
struct CombinedDocument {
    #[serde(default)]
    datasets: Vec<DatasetSection>,
    combined: CombinedSection,
    #[serde(default)]
    tabular_relationships: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Node and relationship counts of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub name: String,
    pub nodes: usize,
    pub relationships: usize,
}

/// Counts extracted from a combined document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub dataset_count: usize,
    pub summary: Summary,
    pub datasets: Vec<DatasetCounts>,
    /// Relationship-table file → record count.
    pub tabular_relationships: BTreeMap<String, usize>,
}

impl InspectReport {
    /// Builds a report from combined document text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let document: CombinedDocument = serde_json::from_str(text)?;

        Ok(Self {
            dataset_count: document.datasets.len(),
            summary: document.combined.summary,
            datasets: document
                .datasets
                .into_iter()
                .map(|d| DatasetCounts {
                    name: d.name,
                    nodes: d.summary.total_nodes,
                    relationships: d.summary.total_relationships,
                })
                .collect(),
            tabular_relationships: document
                .tabular_relationships
                .into_iter()
                .map(|(file, records)| (file, records.len()))
                .collect(),
        })
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Datasets: {}", self.dataset_count)?;
        writeln!(f, "Nodes: {}", s.total_nodes)?;
        writeln!(f, "Relationships: {}", s.total_relationships)?;
        writeln!(f, "Events: {}", s.events)?;
        writeln!(f, "Persons: {}", s.persons)?;
        writeln!(f, "Locations: {}", s.locations)?;
        writeln!(f, "Times: {}", s.times)?;

        if !self.datasets.is_empty() {
            writeln!(f)?;
            for dataset in &self.datasets {
                writeln!(
                    f,
                    "  {}: {} nodes, {} relationships",
                    dataset.name, dataset.nodes, dataset.relationships
                )?;
            }
        }

        if !self.tabular_relationships.is_empty() {
            writeln!(f)?;
            writeln!(f, "Relationship tables:")?;
            for (file, count) in &self.tabular_relationships {
                writeln!(f, "  {}: {} records", file, count)?;
            }
        }

        Ok(())
    }
}

impl InspectCommand {
    /// Run the inspect command.
    pub fn run(self) -> Result<()> {
        let content = std::fs::read_to_string(&self.file)
            .wrap_err_with(|| format!("Failed to read {}", self.file.display()))?;
        let report = InspectReport::from_json(&content)
            .wrap_err_with(|| format!("{} is not a combined document", self.file.display()))?;

        match self.format {
            InspectFormat::Text => print!("{}", report),
            InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            InspectFormat::Toon => {
                let toon = serde_toon::to_string(&report)
                    .map_err(|e| eyre!("TOON serialization error: {}", e))?;
                println!("{}", toon);
            }
        }

        Ok(())
    }
}
