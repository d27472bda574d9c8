//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Acceptance harness for the managed AI app deployment resource.
#[derive(Parser, Debug)]
#[command(name = "ai-app-acctest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the configuration text of every step.
    Render {
        /// Scenario file (defaults to the built-in scenario).
        #[arg(short, long, env = "AI_APP_SCENARIO")]
        file: Option<PathBuf>,
    },

    /// Validate the specs of every step without applying anything.
    Validate {
        /// Scenario file (defaults to the built-in scenario).
        #[arg(short, long, env = "AI_APP_SCENARIO")]
        file: Option<PathBuf>,

        /// Treat warnings as errors.
        #[arg(long)]
        strict: bool,
    },

    /// Apply every step, check attributes, then tear down.
    Run {
        /// Scenario file (defaults to the built-in scenario).
        #[arg(short, long, env = "AI_APP_SCENARIO")]
        file: Option<PathBuf>,

        /// Provisioning layer to drive.
        #[arg(short, long, default_value = "simulated")]
        provisioner: ProvisionerKind,

        /// Terraform binary used by the terraform provisioner.
        #[arg(long, env = "AI_APP_TERRAFORM_BIN", default_value = "terraform")]
        terraform_bin: PathBuf,

        /// Cancel the run after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

/// Provisioning layers selectable from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProvisionerKind {
    /// In-memory provisioning layer.
    #[default]
    Simulated,
    /// The `terraform` CLI.
    Terraform,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Commands {
    /// Scenario file named by the command, if any.
    #[must_use]
    pub const fn file(&self) -> Option<&PathBuf> {
        match self {
            Self::Render { file } | Self::Validate { file, .. } | Self::Run { file, .. } => {
                file.as_ref()
            }
        }
    }
}
