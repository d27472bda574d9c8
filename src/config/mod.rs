//! Configuration module for the acceptance harness.
//!
//! This module handles everything that describes a desired state:
//! - The [`DeploymentSpec`] data model and its null-as-removal env values
//! - Loading scenario files and the tenant identifier from the environment
//! - Caller-level validation of specs
//! - Fingerprints of rendered configuration text

mod spec;
mod parser;
mod validator;
mod hash;

pub use spec::{DeploymentSpec, EnvValue, EnvVar};
pub use parser::{ScenarioFile, ScenarioParser, StepFile, TENANT_ENV_VAR};
pub use validator::{SpecValidator, ValidationError, ValidationResult};
pub use hash::ConfigFingerprint;
