//! Build subcommand - run the pipeline and write output documents.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use crate::config::Config;
use crate::services::{read_sources, Exporter, Pipeline};

/// Build the combined graph from the configured sources.
#[derive(Parser)]
pub struct BuildCommand {
    /// Project config file (defaults to .histograph.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory, overriding `output.dir`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report every skipped statement, reference and record as a warning.
    #[arg(long)]
    pub strict: bool,
}

impl BuildCommand {
    /// Run the build command.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = self.output {
            config.output.dir = dir;
        }
        if self.strict {
            config.pipeline.strict_mode = true;
        }

        if config.sources.is_empty() {
            tracing::warn!("No sources configured; writing an empty graph");
        }

        tracing::info!(
            sources = config.sources.len(),
            base_dir = %config.input.base_dir.display(),
            "Reading sources"
        );
        let documents = read_sources(&config.sources, &config.input.base_dir).await;

        let output = Pipeline::new(&config).run(&documents);
        let summary = output.combined.summary;
        tracing::info!(
            datasets = output.datasets.len(),
            nodes = summary.total_nodes,
            relationships = summary.total_relationships,
            events = summary.events,
            persons = summary.persons,
            locations = summary.locations,
            times = summary.times,
            "Combined graph built"
        );

        let written = Exporter::new(&config.output).write_all(&output).await?;
        for path in &written {
            tracing::info!(path = %path.display(), "Wrote output");
        }

        Ok(())
    }
}
