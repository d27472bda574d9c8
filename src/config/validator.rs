//! Caller-level validation of deployment specs.
//!
//! The renderer never validates: an invalid spec renders to configuration the
//! provisioning layer will refuse. These checks exist so that scenario files
//! can be linted before anything is applied.

use crate::error::{ConfigError, HarnessError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::DeploymentSpec;

/// Validator for deployment specs.
#[derive(Debug, Default)]
pub struct SpecValidator {
    /// Treat warnings as errors.
    strict: bool,
}

/// Validation result containing all findings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl SpecValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// Makes warnings fail validation too.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validates a deployment spec.
    ///
    /// # Errors
    ///
    /// Returns the first error found, or the first warning in strict mode.
    pub fn validate(&self, spec: &DeploymentSpec) -> Result<ValidationResult> {
        let result = Self::inspect(spec);

        if let Some(first_error) = result.errors.first() {
            return Err(HarnessError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }));
        }

        if self.strict {
            if let Some(warning) = result.warnings.first() {
                return Err(HarnessError::Config(ConfigError::ValidationError {
                    message: warning.clone(),
                    field: None,
                }));
            }
        }

        debug!("Spec validation passed with {} warnings", result.warnings.len());
        Ok(result)
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn inspect(spec: &DeploymentSpec) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_required(spec, &mut result);
        Self::validate_ports(spec, &mut result);
        Self::validate_env_vars(spec, &mut result);

        if spec.image.ends_with(":latest") {
            result.warnings.push(String::from(
                "image: Using ':latest' makes the scenario non-reproducible",
            ));
        }

        result
    }

    /// Validates required scalar fields.
    fn validate_required(spec: &DeploymentSpec, result: &mut ValidationResult) {
        let required = [
            ("tenant_id", &spec.tenant_id),
            ("region", &spec.region),
            ("flavor", &spec.flavor),
            ("image", &spec.image),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: String::from(field),
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        if spec.cpu_count == 0 {
            result.errors.push(ValidationError {
                field: String::from("cpu_count"),
                message: String::from("CPU count must be at least 1"),
            });
        }
    }

    /// Validates the optional ports.
    fn validate_ports(spec: &DeploymentSpec, result: &mut ValidationResult) {
        for (field, port) in [
            ("default_http_port", spec.default_http_port),
            ("grpc_port", spec.grpc_port),
        ] {
            if port == Some(0) {
                result.errors.push(ValidationError {
                    field: String::from(field),
                    message: String::from("Port 0 is not a valid port"),
                });
            }
        }

        // Callers pair these by convention; the renderer does not.
        if spec.default_http_port.is_some() != spec.grpc_port.is_some() {
            result.warnings.push(String::from(
                "ports: default_http_port and grpc_port are usually set together",
            ));
        }
    }

    /// Validates environment variables.
    fn validate_env_vars(spec: &DeploymentSpec, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (i, env_var) in spec.env_vars.iter().enumerate() {
            if env_var.name.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: format!("env_vars.{i}.name"),
                    message: String::from("Environment variable name cannot be empty"),
                });
            } else if !seen.insert(env_var.name.as_str()) {
                result.warnings.push(format!(
                    "env_vars.{i}.name: Duplicate environment variable '{}'",
                    env_var.name
                ));
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
