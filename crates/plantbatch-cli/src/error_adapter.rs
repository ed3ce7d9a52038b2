//! Error adapter for converting PlantbatchError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use plantbatch::PlantbatchError;

/// Adapter for [`PlantbatchError`].
///
/// Attaches an error code and, where one exists, a hint on how to fix the
/// setup that caused the error.
pub struct ErrorAdapter<'a>(pub &'a PlantbatchError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            PlantbatchError::Io(_) => "plantbatch::io",
            PlantbatchError::InputNotFound(_)
            | PlantbatchError::OutputDir { .. }
            | PlantbatchError::ToolNotFound { .. }
            | PlantbatchError::Config(_) => "plantbatch::config",
            PlantbatchError::Startup(_) => "plantbatch::startup",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            PlantbatchError::InputNotFound(_) => "check the path of the PlantUML source file",
            PlantbatchError::OutputDir { .. } => "choose a writable directory with --output",
            PlantbatchError::ToolNotFound { .. } => {
                "install Docker (or set `container.tool` in the configuration), \
                 or drop --docker and pass --server"
            }
            PlantbatchError::Config(_) => "fix or remove the configuration file",
            PlantbatchError::Startup(_) => {
                "check that the image can be pulled and that the host port is free (--port)"
            }
            PlantbatchError::Io(_) => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
