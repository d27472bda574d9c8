//! Sequential step execution with guaranteed teardown.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{HarnessError, Result};
use crate::scenario::{Scenario, TestStep};

use super::provisioner::Provisioner;
use super::report::{RunReport, StepReport};

/// Runs scenarios against a provisioning layer.
#[derive(Debug)]
pub struct StepRunner<P> {
    /// Provisioning layer.
    provisioner: P,
    /// Limit for the whole step sequence.
    timeout: Option<Duration>,
}

impl<P: Provisioner> StepRunner<P> {
    /// Creates a runner without a timeout.
    #[must_use]
    pub const fn new(provisioner: P) -> Self {
        Self {
            provisioner,
            timeout: None,
        }
    }

    /// Cancels the step sequence if it runs longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the provisioning layer.
    #[must_use]
    pub const fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Applies every step in order, checking attributes after each apply.
    ///
    /// Teardown runs exactly once whatever happens to the steps. When both
    /// the steps and teardown fail, the step error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first apply error, check failure or timeout, or the
    /// teardown error if the steps passed.
    pub async fn run(&self, scenario: &Scenario) -> Result<RunReport> {
        info!(
            "Running scenario '{}' ({} steps) with {} provisioner",
            scenario.name,
            scenario.steps.len(),
            self.provisioner.name()
        );

        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(scenario.steps.len());

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_steps(scenario, &mut steps))
                .await
                .unwrap_or_else(|_| {
                    warn!("Scenario '{}' timed out after {limit:?}", scenario.name);
                    Err(HarnessError::Timeout { timeout: limit })
                }),
            None => self.run_steps(scenario, &mut steps).await,
        };

        info!("Tearing down {}", scenario.address);
        let teardown = self.provisioner.destroy().await;

        match (outcome, teardown) {
            (Ok(()), Ok(())) => {
                let report = RunReport {
                    scenario: scenario.name.clone(),
                    provisioner: self.provisioner.name().to_string(),
                    address: scenario.address.clone(),
                    started_at,
                    finished_at: Utc::now(),
                    steps,
                };
                info!(
                    "Scenario '{}' passed: {} checks in {} ms",
                    report.scenario,
                    report.checks_passed(),
                    report.duration_ms()
                );
                Ok(report)
            }
            (Ok(()), Err(e)) => {
                error!("Teardown failed: {e}");
                Err(HarnessError::Teardown(e))
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(teardown)) => {
                error!("Teardown also failed: {teardown}");
                Err(e)
            }
        }
    }

    async fn run_steps(&self, scenario: &Scenario, reports: &mut Vec<StepReport>) -> Result<()> {
        for (index, step) in scenario.steps.iter().enumerate() {
            let report = self.run_step(index + 1, step).await?;
            reports.push(report);
        }
        Ok(())
    }

    async fn run_step(&self, number: usize, step: &TestStep) -> Result<StepReport> {
        let started = Instant::now();
        info!("Step {number}: applying config {}", step.fingerprint.short());

        let outcome = self.provisioner.apply(&step.config).await.map_err(|e| {
            error!("Step {number}: apply failed: {e}");
            HarnessError::step(number, e)
        })?;

        if !outcome.changed {
            debug!("Step {number}: no changes");
        }

        for check in &step.checks {
            check.evaluate(&outcome.attributes).map_err(|failure| {
                error!("Step {number}: {failure}");
                HarnessError::step(number, failure)
            })?;
            debug!("Step {number}: {check} ok");
        }

        Ok(StepReport {
            step: number,
            fingerprint: step.fingerprint.short().to_string(),
            changed: outcome.changed,
            checks_passed: step.checks.len(),
            checks_total: step.checks.len(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentSpec, EnvVar};
    use crate::error::{ApplyError, StepError};
    use crate::runner::provisioner::{ApplyOutcome, MockProvisioner};
    use crate::runner::SimulatedProvisioner;
    use crate::scenario::{ai_app_basic, AttributeSet, Check, ScenarioBuilder};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn two_step_scenario() -> Scenario {
        ScenarioBuilder::new("two-steps")
            .step(
                DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v1"),
                vec![Check::equals("image", "img:v1").expect("check")],
            )
            .expect("step 1")
            .step(
                DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v2"),
                vec![Check::equals("image", "img:v2").expect("check")],
            )
            .expect("step 2")
            .build()
            .expect("scenario")
    }

    fn observed(image: &str) -> ApplyOutcome {
        ApplyOutcome::changed(AttributeSet::from_json(&json!({ "image": image })))
    }

    #[tokio::test]
    async fn test_ai_app_basic_passes_against_simulated_layer() {
        let scenario = ai_app_basic("tenant-123").expect("scenario");
        let runner = StepRunner::new(SimulatedProvisioner::new());

        let report = runner.run(&scenario).await.expect("scenario should pass");

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.checks_passed(), 12);
        assert!(report.steps.iter().all(|s| s.changed));
        assert!(runner.provisioner().attributes().await.is_none());
    }

    #[tokio::test]
    async fn test_omitting_instead_of_null_fails_at_step_two() {
        let scenario = ScenarioBuilder::new("omitted")
            .step(
                DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v1")
                    .with_env_var(EnvVar::new("testEnvVarName", "testEnvVarValue")),
                vec![],
            )
            .expect("step 1")
            .step(
                DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v2")
                    .with_env_var(EnvVar::new("testEnvVarName2", "testEnvVarValue2")),
                vec![Check::equals("env_vars.0.name", "testEnvVarName2").expect("check")],
            )
            .expect("step 2")
            .build()
            .expect("scenario");

        let runner = StepRunner::new(SimulatedProvisioner::new());
        let err = runner.run(&scenario).await.expect_err("should fail");

        assert!(matches!(err, HarnessError::Step { step: 2, .. }));
        let failure = err.check_failure().expect("check failure");
        assert_eq!(failure.path, "env_vars.0.name");
        assert_eq!(failure.observed.as_deref(), Some("testEnvVarName"));
        assert!(runner.provisioner().attributes().await.is_none());
    }

    #[tokio::test]
    async fn test_apply_error_aborts_remaining_steps() {
        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_apply()
            .times(1)
            .returning(|_| Err(ApplyError::rejected("x.y", "quota exceeded")));
        provisioner.expect_destroy().times(1).returning(|| Ok(()));
        provisioner.expect_name().return_const("mock");

        let err = StepRunner::new(provisioner)
            .run(&two_step_scenario())
            .await
            .expect_err("should fail");

        assert!(matches!(
            err,
            HarnessError::Step {
                step: 1,
                source: StepError::Apply(ApplyError::Rejected { .. })
            }
        ));
    }

    #[tokio::test]
    async fn test_check_mismatch_stops_sequence() {
        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_apply()
            .times(1)
            .returning(|_| Ok(observed("img:other")));
        provisioner.expect_destroy().times(1).returning(|| Ok(()));
        provisioner.expect_name().return_const("mock");

        let err = StepRunner::new(provisioner)
            .run(&two_step_scenario())
            .await
            .expect_err("should fail");

        let failure = err.check_failure().expect("check failure");
        assert_eq!(failure.path, "image");
        assert_eq!(failure.observed.as_deref(), Some("img:other"));
    }

    #[tokio::test]
    async fn test_step_error_wins_over_teardown_error() {
        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_apply()
            .returning(|_| Err(ApplyError::invalid_config("broken")));
        provisioner
            .expect_destroy()
            .times(1)
            .returning(|| Err(ApplyError::rejected("x.y", "still in use")));
        provisioner.expect_name().return_const("mock");

        let err = StepRunner::new(provisioner)
            .run(&two_step_scenario())
            .await
            .expect_err("should fail");

        assert!(matches!(err, HarnessError::Step { step: 1, .. }));
    }

    #[tokio::test]
    async fn test_teardown_error_after_passing_steps() {
        let mut provisioner = MockProvisioner::new();
        let mut images = vec!["img:v2", "img:v1"];
        provisioner
            .expect_apply()
            .times(2)
            .returning(move |_| Ok(observed(images.pop().unwrap_or_default())));
        provisioner
            .expect_destroy()
            .times(1)
            .returning(|| Err(ApplyError::rejected("x.y", "still in use")));
        provisioner.expect_name().return_const("mock");

        let err = StepRunner::new(provisioner)
            .run(&two_step_scenario())
            .await
            .expect_err("should fail");

        assert!(matches!(err, HarnessError::Teardown(_)));
    }

    struct SlowProvisioner {
        destroyed: AtomicUsize,
    }

    #[async_trait]
    impl Provisioner for SlowProvisioner {
        async fn apply(&self, _config: &str) -> std::result::Result<ApplyOutcome, ApplyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(observed("img:v1"))
        }

        async fn destroy(&self) -> std::result::Result<(), ApplyError> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timeout_still_tears_down() {
        let runner = StepRunner::new(SlowProvisioner {
            destroyed: AtomicUsize::new(0),
        })
        .with_timeout(Duration::from_millis(50));

        let err = runner.run(&two_step_scenario()).await.expect_err("should time out");

        assert!(matches!(
            err,
            HarnessError::Timeout { timeout } if timeout == Duration::from_millis(50)
        ));
        assert!(err.to_string().ends_with("after 50ms"));
        assert_eq!(runner.provisioner().destroyed.load(Ordering::SeqCst), 1);
    }
}
