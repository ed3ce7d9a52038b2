//! Plantbatch Core Types and Definitions
//!
//! This crate provides the pure, I/O-free building blocks used by the
//! Plantbatch exporter. It includes:
//!
//! - **Encoding**: The compact URL payload format understood by PlantUML
//!   servers ([`encoding::encode`])
//! - **Source**: Splitting a multi-diagram document into named units
//!   ([`source::diagrams`])

pub mod encoding;
pub mod source;
