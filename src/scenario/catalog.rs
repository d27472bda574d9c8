//! Built-in scenarios.

use crate::config::{DeploymentSpec, EnvVar};
use crate::error::Result;

use super::check::Check;
use super::step::{Scenario, ScenarioBuilder};

const REGION: &str = "GRA";
const FLAVOR: &str = "ai1-1-cpu";
const IMAGE_REPOSITORY: &str =
    "k248cdcu.gra7.container-registry.ovh.net/public/grpc-gateway-server-image";

/// Two-step AI app scenario: create with one env var, then remove it by null
/// while adding a second one and both ports.
///
/// # Errors
///
/// Returns an error if a step cannot be rendered.
pub fn ai_app_basic(tenant: &str) -> Result<Scenario> {
    ai_app_basic_steps(tenant)?
        .into_iter()
        .try_fold(ScenarioBuilder::new("ai_app_basic"), |builder, (spec, checks)| {
            builder.step(spec, checks)
        })?
        .build()
}

/// Specs and checks of [`ai_app_basic`], before rendering.
///
/// # Errors
///
/// Returns an error if a check path is malformed.
pub fn ai_app_basic_steps(tenant: &str) -> Result<Vec<(DeploymentSpec, Vec<Check>)>> {
    let image_v1 = format!("{IMAGE_REPOSITORY}:v1");
    let image_v2 = format!("{IMAGE_REPOSITORY}:http-8081-grpc-8082");

    let create = DeploymentSpec::new(tenant, REGION, FLAVOR, image_v1.as_str())
        .with_cpu_count(1)
        .with_env_var(EnvVar::new("testEnvVarName", "testEnvVarValue"));

    let update = DeploymentSpec::new(tenant, REGION, FLAVOR, image_v2.as_str())
        .with_cpu_count(1)
        .with_ports(8081, 8082)
        .with_env_vars(vec![
            EnvVar::null("testEnvVarName"),
            EnvVar::new("testEnvVarName2", "testEnvVarValue2"),
        ]);

    Ok(vec![
        (
            create,
            vec![
                Check::equals("service_name", tenant)?,
                Check::equals("region", REGION)?,
                Check::equals("image", &image_v1)?,
                Check::equals("env_vars.0.name", "testEnvVarName")?,
                Check::equals("env_vars.0.value", "testEnvVarValue")?,
            ],
        ),
        (
            update,
            vec![
                Check::equals("service_name", tenant)?,
                Check::equals("region", REGION)?,
                Check::equals("image", &image_v2)?,
                Check::equals("env_vars.0.name", "testEnvVarName2")?,
                Check::equals("env_vars.0.value", "testEnvVarValue2")?,
                Check::equals("default_http_port", 8081)?,
                Check::equals("grpc_port", 8082)?,
            ],
        ),
    ])
}
