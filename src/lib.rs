//! Histograph - Historical Knowledge Graph Builder
//!
//! Unifies graph-construction scripts, path/record JSON exports and tabular
//! entity files into one property graph with per-source datasets,
//! provenance and category summaries.

pub mod cli;
pub mod config;
pub mod error;
pub mod loaders;
pub mod models;
pub mod parser;
pub mod services;
