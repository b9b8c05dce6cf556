// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface. Flags are folded over the defaults (or a JSON config
// file) into one `GenerateConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docforge_core::config::GenerateConfig;
use docforge_core::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "docforge",
    about = "Materialise a JSON business-document corpus into real files",
    version
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render every document in the corpus into the output directory
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Corpus JSON with a top-level `documents` array
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Destination directory [default: output/]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also synthesize scanned PDFs
    #[arg(long)]
    pub include_pdf: bool,

    /// Also export the relational database
    #[arg(long)]
    pub include_db: bool,

    /// Database definition used with --include-db
    #[arg(long, value_name = "PATH")]
    pub db_input: Option<PathBuf>,

    /// Base seed for scan degradation
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON configuration file; flags given here override it
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write manifest.json with a SHA-256 per artifact
    #[arg(long)]
    pub manifest: bool,

    /// Stop at the first failing document
    #[arg(long)]
    pub fail_fast: bool,
}

impl GenerateArgs {
    pub fn into_config(self) -> Result<GenerateConfig> {
        let mut config = match &self.config {
            Some(path) => GenerateConfig::from_file(path)?,
            None => GenerateConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(db_input) = self.db_input {
            config.database_input = db_input;
        }
        if let Some(seed) = self.seed {
            config.scan.seed = seed;
        }
        // Switches can only turn a feature on.
        config.include_pdf |= self.include_pdf;
        config.include_db |= self.include_db;
        config.write_manifest |= self.manifest;
        config.fail_fast |= self.fail_fast;
        Ok(config)
    }
}
