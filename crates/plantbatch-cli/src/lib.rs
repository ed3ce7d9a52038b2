//! CLI logic for the Plantbatch exporter.
//!
//! This module contains the core CLI logic: configuration loading, input and
//! output validation, rendering server selection, and the batch run itself.

pub mod error_adapter;

mod args;
mod config;
mod interrupt;

pub use args::Args;
pub use interrupt::Interrupts;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::info;

use plantbatch::{
    PlantbatchError,
    batch::{BatchExporter, ExportSummary},
    config::{AppConfig, PUBLIC_SERVER},
    container::ContainerGuard,
    transport::HttpRenderer,
};

/// Run the Plantbatch CLI application
///
/// This function exports every diagram of the input file and writes a
/// progress report to standard output.
///
/// The rendering server is chosen in this order: an explicit server URL
/// (command line, then configuration file), a local container when
/// `--docker` is given, and finally the public PlantUML server.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `PlantbatchError` for:
/// - Configuration loading errors
/// - A missing input file or an output directory that cannot be created
/// - A container tool that is not installed
/// - A local server that fails to start
///
/// Diagrams that fail to render are not errors; they are reported in the
/// returned [`ExportSummary`].
///
/// SIGINT and SIGTERM stop a launched container before the process exits.
pub fn run(args: &Args) -> Result<ExportSummary, PlantbatchError> {
    let interrupts = Interrupts::install()?;
    let mut stdout = io::stdout().lock();
    run_with(args, &interrupts, &mut stdout)
}

/// Same as [`run`], writing the progress report to `progress` and leaving
/// signal handling alone.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_output(
    args: &Args,
    progress: &mut impl Write,
) -> Result<ExportSummary, PlantbatchError> {
    run_with(args, &Interrupts::default(), progress)
}

fn run_with(
    args: &Args,
    interrupts: &Interrupts,
    progress: &mut impl Write,
) -> Result<ExportSummary, PlantbatchError> {
    info!(
        input_path = args.input,
        output_dir = args.output;
        "Processing diagrams"
    );

    let input = Path::new(&args.input);

    let mut app_config = config::load_config(args.config.as_ref(), input)?;
    args.apply_to(&mut app_config);

    if !input.is_file() {
        return Err(PlantbatchError::InputNotFound(input.to_path_buf()));
    }

    let out_dir = Path::new(&args.output);
    fs::create_dir_all(out_dir).map_err(|source| PlantbatchError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let source = fs::read_to_string(input)?;

    if let Some(url) = app_config.server().url() {
        export(&source, url, &app_config, out_dir, progress)
    } else if args.docker {
        let container = start_container(&app_config, interrupts, progress)?;
        let summary = export(&source, container.endpoint(), &app_config, out_dir, progress);
        stop_container(container, interrupts, progress)?;
        summary
    } else {
        export(&source, PUBLIC_SERVER, &app_config, out_dir, progress)
    }
}

/// Start the server container and wait for it, reporting each step.
///
/// The container is watched by `interrupts` from the moment it exists.
fn start_container(
    app_config: &AppConfig,
    interrupts: &Interrupts,
    progress: &mut impl Write,
) -> Result<ContainerGuard, PlantbatchError> {
    let settings = app_config.container();
    writeln!(
        progress,
        "Starting rendering server container {} on port {}…",
        settings.image(),
        settings.host_port()
    )?;

    let container = ContainerGuard::start(settings)?;
    interrupts.watch(&container);

    writeln!(progress, "Waiting for rendering server at {}…", container.endpoint())?;
    if let Err(err) = container.wait_ready(app_config.probe()) {
        stop_container(container, interrupts, progress)?;
        return Err(err.into());
    }
    writeln!(progress, "Rendering server is up.")?;

    Ok(container)
}

fn stop_container(
    container: ContainerGuard,
    interrupts: &Interrupts,
    progress: &mut impl Write,
) -> io::Result<()> {
    let notice = writeln!(progress, "Stopping rendering server container…");
    interrupts.release(container);
    notice
}

fn export(
    source: &str,
    endpoint: &str,
    app_config: &AppConfig,
    out_dir: &Path,
    progress: &mut impl Write,
) -> Result<ExportSummary, PlantbatchError> {
    let method = app_config.server().method();
    info!(endpoint, method:%; "Using rendering server");

    let renderer = HttpRenderer::new(endpoint, method, app_config.http());
    BatchExporter::new(renderer).run(source, out_dir, progress)
}
