//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::analyze::AnalyzeArgs;
use crate::cli::commands::status::StatusArgs;

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(name = "tagsmith")]
#[command(about = "AI-assisted document classification for Paperless-ngx", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (overrides tagsmith.yaml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a document and print metadata suggestions
    Analyze(AnalyzeArgs),

    /// Check configuration and provider connectivity
    Status(StatusArgs),
}
