//! Error types for the acceptance harness.
//!
//! The hierarchy follows the lifecycle of a scenario: loading and validating
//! specs, rendering configuration text, applying and checking each step, and
//! tearing the provisioned resource down at the end.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the acceptance harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Scenario setup and configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration text could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A step failed while applying or checking.
    #[error("Step {step} failed: {source}")]
    Step {
        /// One-based index of the failing step.
        step: usize,
        /// What went wrong.
        #[source]
        source: StepError,
    },

    /// The scenario exceeded its overall time budget.
    #[error("Scenario timed out after {timeout:?}")]
    Timeout {
        /// Configured timeout.
        timeout: std::time::Duration,
    },

    /// Teardown of the provisioned resource failed.
    #[error("Teardown failed: {0}")]
    Teardown(#[source] ApplyError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Scenario setup and configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The scenario file was not found.
    #[error("Scenario file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The scenario file could not be parsed.
    #[error("Failed to parse scenario: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A deployment spec failed validation.
    #[error("Spec validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is missing or empty.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },
}

/// Rendering errors. These indicate a harness bug, never bad data.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A field could not be bound to a valid HCL identifier.
    #[error("Cannot bind field '{field}': {message}")]
    Binding {
        /// The field being bound.
        field: String,
        /// Underlying reason.
        message: String,
    },

    /// The HCL document could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Failure of a single step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The provisioning layer rejected or failed the apply.
    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    /// An attribute check did not hold.
    #[error("check failed: {0}")]
    Check(#[from] CheckFailure),
}

/// Errors raised by a provisioning layer while converging state.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The configuration text could not be parsed.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the parse failure.
        message: String,
    },

    /// The configuration parsed but was refused.
    #[error("Configuration rejected for {address}: {reason}")]
    Rejected {
        /// Resource address.
        address: String,
        /// Why it was refused.
        reason: String,
    },

    /// An external command exited unsuccessfully.
    #[error("`{command}` exited with status {status}: {stderr}")]
    Command {
        /// The command line that was run.
        command: String,
        /// Exit status, or -1 if killed by a signal.
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The provisioning layer produced output the harness cannot read.
    #[error("Unreadable provisioner output: {message}")]
    InvalidOutput {
        /// Description of the problem.
        message: String,
    },

    /// IO errors while talking to the provisioning layer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An observed attribute did not match its expectation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{path}: expected {expected}, observed {}", .observed.as_deref().unwrap_or("<absent>"))]
pub struct CheckFailure {
    /// Attribute path that was checked.
    pub path: String,
    /// Human-readable expectation.
    pub expected: String,
    /// Observed value, if the attribute exists.
    pub observed: Option<String>,
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps a step failure with its one-based index.
    #[must_use]
    pub fn step(step: usize, source: impl Into<StepError>) -> Self {
        Self::Step {
            step,
            source: source.into(),
        }
    }

    /// Returns the attribute check failure, if that is what failed.
    #[must_use]
    pub const fn check_failure(&self) -> Option<&CheckFailure> {
        match self {
            Self::Step {
                source: StepError::Check(failure),
                ..
            } => Some(failure),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl RenderError {
    /// Creates a binding error for a field.
    #[must_use]
    pub fn binding(field: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Binding {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

impl ApplyError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl std::fmt::Display) -> Self {
        Self::InvalidConfig {
            message: message.to_string(),
        }
    }
}
