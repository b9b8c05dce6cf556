// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docforge: JSON business-document corpus to EML, DOCX, XLSX, PPTX, Markdown
// and scanned PDF files.
//
// Entry point. Initialises logging on stderr, builds the configuration and
// runs the pipeline once. The exit code is non-zero if any document failed.

mod cli;
mod pipeline;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

/// Returns whether every document made it to disk.
fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Command::Generate(args) => {
            let config = args.into_config().context("loading configuration")?;
            tracing::info!(
                input = %config.input.display(),
                output = %config.output_dir.display(),
                include_pdf = config.include_pdf,
                include_db = config.include_db,
                "docforge starting"
            );
            let report = pipeline::run(config).context("generation aborted")?;
            for line in report.summary() {
                println!("{line}");
            }
            Ok(report.is_success())
        }
    }
}
