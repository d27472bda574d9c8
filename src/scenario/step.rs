//! Scenario construction.
//!
//! A scenario is an ordered list of steps. Each step owns the configuration
//! text rendered from one [`DeploymentSpec`] and the checks to evaluate after
//! that text has been applied. Specs are rendered once, when the step is
//! added, and are not kept.

use tracing::{debug, info};

use crate::config::{ConfigFingerprint, DeploymentSpec, ScenarioFile, SpecValidator};
use crate::error::{ConfigError, HarnessError, Result};
use crate::render::ConfigRenderer;

use super::check::Check;

/// One apply-and-verify cycle.
#[derive(Debug, Clone)]
pub struct TestStep {
    /// Full desired state as configuration text.
    pub config: String,
    /// Fingerprint of `config`.
    pub fingerprint: ConfigFingerprint,
    /// Checks evaluated in order after apply.
    pub checks: Vec<Check>,
}

/// An ordered sequence of steps against one resource.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Address of the resource the steps converge.
    pub address: String,
    /// Steps, applied strictly in order.
    pub steps: Vec<TestStep>,
}

/// Builder that renders specs into steps.
#[derive(Debug)]
pub struct ScenarioBuilder {
    /// Scenario name.
    name: String,
    /// Renderer used for every step.
    renderer: ConfigRenderer,
    /// Steps built so far.
    steps: Vec<TestStep>,
}

impl ScenarioBuilder {
    /// Creates a builder using the default resource labels.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            renderer: ConfigRenderer::default(),
            steps: Vec::new(),
        }
    }

    /// Uses a custom renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: ConfigRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Renders `spec` and appends it as the next step.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails; the scenario must not run.
    pub fn step(mut self, spec: DeploymentSpec, checks: Vec<Check>) -> Result<Self> {
        let config = self.renderer.render(&spec)?;
        let fingerprint = ConfigFingerprint::of(&config);

        debug!(
            "Scenario '{}' step {}: {} checks, config {}",
            self.name,
            self.steps.len() + 1,
            checks.len(),
            fingerprint.short()
        );

        self.steps.push(TestStep {
            config,
            fingerprint,
            checks,
        });
        Ok(self)
    }

    /// Finishes the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if no step was added.
    pub fn build(self) -> Result<Scenario> {
        if self.steps.is_empty() {
            return Err(HarnessError::Config(ConfigError::validation(
                format!("Scenario '{}' has no steps", self.name),
                "steps",
            )));
        }

        info!("Built scenario '{}' with {} steps", self.name, self.steps.len());

        Ok(Scenario {
            address: self.renderer.address(),
            name: self.name,
            steps: self.steps,
        })
    }

    /// Builds a scenario from a parsed file, injecting `tenant` into every
    /// spec that does not name one.
    ///
    /// # Errors
    ///
    /// Returns an error if a spec fails validation, a check is malformed, or
    /// rendering fails.
    pub fn from_file(file: ScenarioFile, tenant: &str) -> Result<Scenario> {
        let validator = SpecValidator::new();
        let mut builder = Self::new(file.name);

        for step in file.steps {
            let mut spec = step.spec;
            if spec.tenant_id.is_empty() {
                spec.tenant_id = tenant.to_string();
            }
            validator.validate(&spec)?;

            let checks = step
                .checks
                .iter()
                .map(|(path, expected)| Check::from_yaml(path, expected))
                .collect::<Result<Vec<_>>>()?;

            builder = builder.step(spec, checks)?;
        }

        builder.build()
    }
}

impl Scenario {
    /// Total number of checks across all steps.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.steps.iter().map(|s| s.checks.len()).sum()
    }
}
