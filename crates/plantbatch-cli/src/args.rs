//! Command-line argument definitions for the Plantbatch CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input file and output directory,
//! the rendering server, and logging verbosity. Options left unset fall back
//! to the configuration file and then to built-in defaults.

use clap::Parser;

use plantbatch::{config::AppConfig, transport::Method};

/// Batch-export PlantUML diagrams to PNG, optionally through a local
/// rendering server container
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the PlantUML source file
    #[arg(help = "PlantUML source file")]
    pub input: String,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "./exported")]
    pub output: String,

    /// Base URL of an existing PlantUML server (e.g. http://localhost:8080)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Transport method (AUTO, POST or GET)
    #[arg(short, long)]
    pub method: Option<Method>,

    /// Launch a local PlantUML server container for the run
    #[arg(long)]
    pub docker: bool,

    /// Host port for the server container
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Server container image
    #[arg(short, long)]
    pub image: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Override configuration values with the options given on the command line.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.server {
            config.server_mut().set_url(url);
        }
        if let Some(method) = self.method {
            config.server_mut().set_method(method);
        }
        if let Some(port) = self.port {
            config.container_mut().set_host_port(port);
        }
        if let Some(image) = &self.image {
            config.container_mut().set_image(image);
        }
    }
}
