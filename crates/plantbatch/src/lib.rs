//! Plantbatch - Batch export of PlantUML diagrams to PNG.
//!
//! A source document may contain many `@startuml` ... `@enduml` blocks. Each
//! block is rendered by a PlantUML server (an existing one, the public one, or
//! a disposable local container) and written to its own PNG file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::{io, path::Path};
//!
//! use plantbatch::{
//!     batch::BatchExporter,
//!     config::{AppConfig, PUBLIC_SERVER},
//!     transport::{HttpRenderer, Method},
//! };
//!
//! let config = AppConfig::default();
//! let renderer = HttpRenderer::new(PUBLIC_SERVER, Method::Auto, config.http());
//!
//! let summary = BatchExporter::new(renderer)
//!     .run("@startuml\nAlice -> Bob\n@enduml\n", Path::new("out"), &mut io::stdout())
//!     .expect("Failed to export");
//!
//! assert!(summary.is_success());
//! ```

pub mod batch;
pub mod config;
pub mod container;
pub mod transport;

mod error;

pub use plantbatch_core::{encoding, source};

pub use error::PlantbatchError;
