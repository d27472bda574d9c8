//! CLI module for the acceptance harness.
//!
//! This module provides the command-line interface for rendering, validating
//! and running deployment scenarios.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, ProvisionerKind};
pub use output::OutputFormatter;
