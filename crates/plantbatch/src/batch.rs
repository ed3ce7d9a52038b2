//! Batch export of every diagram in a document.
//!
//! [`BatchExporter`] walks the diagrams of a source document in order,
//! renders each one and writes `{name}.png` into the output directory. A
//! diagram that fails is recorded in the [`ExportSummary`] and the batch
//! moves on to the next one.

use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::Path,
};

use log::{debug, info, warn};

use plantbatch_core::source::{self, DiagramUnit};

use crate::{PlantbatchError, transport::Renderer};

/// A diagram that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    name: String,
    message: String,
}

impl Failure {
    /// Returns the diagram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    succeeded: usize,
    failures: Vec<Failure>,
}

impl ExportSummary {
    /// Number of diagrams written.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of diagrams that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failed diagrams in source order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Returns `true` if no diagram failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, name: &str, message: String) {
        self.failures.push(Failure {
            name: name.to_string(),
            message,
        });
    }
}

/// Exports all diagrams of a document through a [`Renderer`].
#[derive(Debug)]
pub struct BatchExporter<R> {
    renderer: R,
}

impl<R: Renderer> BatchExporter<R> {
    /// Create an exporter using `renderer` for every diagram.
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Returns the renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Export every diagram in `source` into `out_dir`.
    ///
    /// A progress line is written to `progress` for each diagram, followed by
    /// a final report. Diagrams whose names collide overwrite earlier files.
    ///
    /// # Errors
    ///
    /// Render and file write failures of single diagrams are recorded in the
    /// returned summary. An error is returned only if writing to `progress`
    /// fails.
    pub fn run(
        &self,
        source: &str,
        out_dir: &Path,
        progress: &mut impl Write,
    ) -> Result<ExportSummary, PlantbatchError> {
        info!(out_dir = out_dir.display().to_string(); "Exporting diagrams");

        let mut summary = ExportSummary::default();
        let mut seen = HashSet::new();

        for unit in source::diagrams(source) {
            if !seen.insert(unit.name().to_string()) {
                warn!(name = unit.name(); "Duplicate diagram name, overwriting earlier output");
            }

            write!(progress, "▶ {}: exporting… ", unit.name())?;
            progress.flush()?;

            match self.export_unit(&unit, out_dir) {
                Ok(()) => {
                    writeln!(progress, "✓")?;
                    summary.succeeded += 1;
                }
                Err(message) => {
                    writeln!(progress, "✗ {message}")?;
                    summary.record_failure(unit.name(), message);
                }
            }
        }

        write_report(&summary, out_dir, progress)?;

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed();
            "Export finished"
        );

        Ok(summary)
    }

    fn export_unit(&self, unit: &DiagramUnit, out_dir: &Path) -> Result<(), String> {
        let image = self
            .renderer
            .render(unit.text())
            .map_err(|err| err.to_string())?;

        let path = out_dir.join(format!("{}.png", unit.name()));
        fs::write(&path, &image)
            .map_err(|err| format!("cannot write '{}': {err}", path.display()))?;

        debug!(path = path.display().to_string(), bytes = image.len(); "Diagram written");
        Ok(())
    }
}

fn write_report(summary: &ExportSummary, out_dir: &Path, out: &mut impl Write) -> io::Result<()> {
    let out_dir = fs::canonicalize(out_dir).unwrap_or_else(|_| out_dir.to_path_buf());

    writeln!(out)?;
    writeln!(
        out,
        "Finished. {} succeeded, {} failed.",
        summary.succeeded(),
        summary.failed()
    )?;
    writeln!(out, "Output dir: {}", out_dir.display())?;

    if !summary.is_success() {
        writeln!(out)?;
        writeln!(out, "Failures:")?;
        for failure in summary.failures() {
            writeln!(out, "  • {}: {}", failure.name(), failure.message())?;
        }
    }

    Ok(())
}
