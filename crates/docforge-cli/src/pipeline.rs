// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generation pipeline: corpus -> render -> write, one document at a time.
//
// A failing document is recorded and the run moves on (unless fail-fast is
// set). Only problems that make the whole run meaningless, an unreadable
// corpus or an invalid scan profile, abort it with an error.

use std::path::PathBuf;

use docforge_core::config::GenerateConfig;
use docforge_core::corpus::Corpus;
use docforge_core::error::{DocumentFailure, Result};
use docforge_core::types::DocumentKind;
use docforge_document::RendererRegistry;
use docforge_store::{DatabaseExport, DatabaseSpec, Manifest, OutputWriter};
use tracing::{error, info, instrument, warn};

/// What a run produced.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// Scan documents left out because PDF generation was not requested.
    pub skipped: Vec<String>,
    pub failures: Vec<DocumentFailure>,
    pub database: Option<DatabaseExport>,
    pub manifest: Option<PathBuf>,
    /// Set when fail-fast cut the run short.
    pub aborted: bool,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable end-of-run summary, one line per item.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Generated {} file(s) in {}",
            self.written.len(),
            self.output_dir.display()
        )];
        if !self.skipped.is_empty() {
            lines.push(format!(
                "Skipped {} scanned PDF document(s); pass --include-pdf to generate them",
                self.skipped.len()
            ));
        }
        if let Some(db) = &self.database {
            lines.push(format!(
                "Database {}: {} table(s), {} row(s)",
                db.path.display(),
                db.counts.len(),
                db.total_rows()
            ));
        }
        if let Some(manifest) = &self.manifest {
            lines.push(format!("Manifest {}", manifest.display()));
        }
        if self.aborted {
            lines.push("Stopped at the first failure (--fail-fast)".to_string());
        }
        if !self.failures.is_empty() {
            lines.push(format!("{} failure(s):", self.failures.len()));
            lines.extend(self.failures.iter().map(|f| format!("  {f}")));
        }
        lines
    }
}

/// Run one generation pass.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output_dir.display()))]
pub fn run(config: GenerateConfig) -> Result<GenerationReport> {
    let corpus = Corpus::load(&config.input)?;
    let registry = RendererRegistry::standard(config.include_pdf.then(|| config.scan.clone()))?;
    let writer = OutputWriter::new(&config.output_dir);

    let mut report = GenerationReport {
        output_dir: config.output_dir.clone(),
        ..GenerationReport::default()
    };
    let mut manifest = Manifest::new();

    for failure in corpus.rejected {
        error!(id = %failure.id, error = %failure.error, "document rejected");
        report.failures.push(failure);
        if config.fail_fast {
            report.aborted = true;
            return Ok(report);
        }
    }

    for document in &corpus.documents {
        if document.kind() == DocumentKind::PdfScan && !config.include_pdf {
            warn!(id = %document.id, "scan document skipped, PDF generation disabled");
            report.skipped.push(document.id.clone());
            continue;
        }

        let outcome = registry.render(document).and_then(|artifact| {
            let path = writer.write(&artifact)?;
            Ok((artifact, path))
        });
        match outcome {
            Ok((artifact, path)) => {
                manifest.record(&artifact);
                report.written.push(path);
            }
            Err(err) => {
                error!(id = %document.id, error = %err, "document failed");
                report.failures.push(DocumentFailure::new(&document.id, err));
                if config.fail_fast {
                    report.aborted = true;
                    return Ok(report);
                }
            }
        }
    }

    if config.include_db {
        match DatabaseSpec::load(&config.database_input).and_then(|spec| spec.export(&writer)) {
            Ok(export) => report.database = Some(export),
            Err(err) => {
                error!(error = %err, "database export failed");
                report.failures.push(DocumentFailure::new(
                    config.database_input.display().to_string(),
                    err,
                ));
            }
        }
    }

    if config.write_manifest {
        report.manifest = Some(manifest.write(&writer)?);
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "generation finished"
    );
    Ok(report)
}
