//! Error types for Plantbatch operations.
//!
//! This module provides the main error type [`PlantbatchError`] for failures
//! that abort a whole run. Failures of a single diagram are reported as
//! [`RenderError`](crate::transport::RenderError) and never abort a batch.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::container::StartupError;

/// The main error type for Plantbatch operations.
///
/// # Variants
///
/// Configuration problems (`InputNotFound`, `OutputDir`, `ToolNotFound`,
/// `Config`) are detected before any export is attempted. `Startup` is
/// raised while bringing up a local rendering server; any container that was
/// already started is still stopped.
#[derive(Debug, Error)]
pub enum PlantbatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Input file '{}' not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("Cannot create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Container tool `{tool}` not found in PATH")]
    ToolNotFound { tool: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Startup error: {0}")]
    Startup(#[from] StartupError),
}

impl PlantbatchError {
    /// Returns `true` for errors caused by invalid setup rather than by the
    /// rendering server.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound(_) | Self::OutputDir { .. } | Self::ToolNotFound { .. } | Self::Config(_)
        )
    }
}
