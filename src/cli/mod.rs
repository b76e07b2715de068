//! CLI module for Histograph.
//!
//! Subcommands:
//! - `build`: Run the pipeline over the configured sources and write output
//! - `inspect`: Summarise an existing combined document

mod build;
mod inspect;

use clap::{Parser, Subcommand};

pub use build::BuildCommand;
pub use inspect::{InspectCommand, InspectFormat, InspectReport};

/// Histograph - Historical knowledge graph builder
#[derive(Parser)]
#[command(name = "histograph")]
#[command(about = "Unify graph scripts, path exports and tables into one property graph")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the combined graph and per-dataset documents
    Build(BuildCommand),

    /// Summarise a combined output document
    Inspect(InspectCommand),
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Build(cmd) => cmd.run().await,
            Command::Inspect(cmd) => cmd.run(),
        }
    }
}
