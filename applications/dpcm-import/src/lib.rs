//! DPCM Import
//!
//! Command-line front end for `dpcm-audio`: inspects WAVE files and converts
//! them to raw DPCM payloads.
//!
//! This library exposes the configuration and command logic for testing.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{ConvertOptions, ConvertOutcome};
pub use config::ImportConfig;
pub use error::{CliError, Result};
