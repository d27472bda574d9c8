//! Scenario file loading and environment lookup.
//!
//! Scenario files are YAML documents listing successive desired states and
//! the attributes expected after each apply. The tenant identifier is never
//! written in the file; it is read from the process environment when the
//! scenario is constructed.

use crate::error::{ConfigError, HarnessError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::DeploymentSpec;

/// Environment variable holding the tenant (cloud project) identifier.
pub const TENANT_ENV_VAR: &str = "OVH_CLOUD_PROJECT_SERVICE_TEST";

/// A scenario as written in a YAML file.
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    /// Scenario name, used in logs and reports.
    pub name: String,
    /// Ordered steps.
    pub steps: Vec<StepFile>,
}

/// One step of a scenario file.
#[derive(Debug, Clone)]
pub struct StepFile {
    /// Full desired state for this step.
    pub spec: DeploymentSpec,
    /// Expected attributes after apply, keyed by attribute path.
    ///
    /// A scalar means "equals"; `~` means "absent".
    pub checks: Vec<(String, serde_yaml::Value)>,
}

/// Parser for scenario files.
#[derive(Debug, Default)]
pub struct ScenarioParser {
    /// Base path for resolving `.env`.
    base_path: Option<PathBuf>,
}

impl ScenarioParser {
    /// Creates a new scenario parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to find `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ScenarioFile> {
        let path = path.as_ref();
        info!("Loading scenario from: {}", path.display());

        if !path.exists() {
            return Err(HarnessError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the scenario has no steps.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ScenarioFile> {
        debug!("Parsing YAML scenario");
        let location = source.map(|p| p.display().to_string());

        let raw: RawScenarioFile = serde_yaml::from_str(content).map_err(|e| {
            HarnessError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: location.clone(),
            })
        })?;

        if raw.steps.is_empty() {
            return Err(HarnessError::Config(ConfigError::ParseError {
                message: format!("Scenario '{}' has no steps", raw.name),
                location,
            }));
        }

        let scenario = raw.into_scenario();
        debug!(
            "Parsed scenario '{}' with {} steps",
            scenario.name,
            scenario.steps.len()
        );
        Ok(scenario)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                HarnessError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Reads the tenant identifier from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or blank. This is a setup
    /// failure, raised before anything is rendered.
    pub fn tenant_from_env() -> Result<String> {
        Self::tenant_from(std::env::var(TENANT_ENV_VAR).ok())
    }

    fn tenant_from(value: Option<String>) -> Result<String> {
        match value {
            Some(tenant) if !tenant.trim().is_empty() => Ok(tenant),
            _ => Err(HarnessError::Config(ConfigError::MissingEnvVar {
                name: String::from(TENANT_ENV_VAR),
            })),
        }
    }
}

/// On-disk layout; `checks` is a YAML mapping whose order is kept.
#[derive(Deserialize)]
struct RawScenarioFile {
    name: String,
    #[serde(default)]
    steps: Vec<RawStepFile>,
}

#[derive(Deserialize)]
struct RawStepFile {
    spec: DeploymentSpec,
    #[serde(default)]
    checks: serde_yaml::Mapping,
}

impl RawScenarioFile {
    fn into_scenario(self) -> ScenarioFile {
        ScenarioFile {
            name: self.name,
            steps: self
                .steps
                .into_iter()
                .map(|step| StepFile {
                    spec: step.spec,
                    checks: step
                        .checks
                        .into_iter()
                        .map(|(path, expected)| (yaml_key(path), expected))
                        .collect(),
                })
                .collect(),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
