//! Deployment specification types.
//!
//! A [`DeploymentSpec`] describes one desired state of the AI app resource.
//! Scenarios build a fresh spec for every step; nothing here is mutated once it
//! has been rendered.

use serde::{Deserialize, Deserializer, Serialize};

/// One desired state of the deployed application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentSpec {
    /// Target project identifier (rendered as `service_name`).
    ///
    /// Scenario files usually leave it out; it is injected from the
    /// environment when the scenario is built.
    #[serde(default)]
    pub tenant_id: String,
    /// Region the app runs in (e.g. "GRA").
    pub region: String,
    /// Compute flavor (e.g. "ai1-1-cpu").
    pub flavor: String,
    /// Number of CPUs requested.
    #[serde(default = "default_cpu_count")]
    pub cpu_count: u32,
    /// Container image reference.
    pub image: String,
    /// Default HTTP port, emitted only when set.
    #[serde(default)]
    pub default_http_port: Option<u16>,
    /// gRPC port, emitted only when set.
    #[serde(default)]
    pub grpc_port: Option<u16>,
    /// Environment variables, in rendering order.
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,
}

/// A single environment variable declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value, or an explicit null requesting removal.
    ///
    /// The key is required in scenario files; only `value: ~` yields `Null`.
    #[serde(deserialize_with = "explicit_value")]
    pub value: EnvValue,
}

/// Value of an environment variable.
///
/// `Null` is not "unspecified": it is rendered as an explicit `null`, which the
/// provisioning layer reads as "delete this variable".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum EnvValue {
    /// A concrete string value.
    Present(String),
    /// Explicit null.
    #[default]
    Null,
}

const fn default_cpu_count() -> u32 {
    1
}

/// Reads an env var value that must be written out, even when it is null.
fn explicit_value<'de, D>(deserializer: D) -> Result<EnvValue, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(EnvValue::from)
}

impl DeploymentSpec {
    /// Creates a spec with the required fields and no ports or env vars.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        region: impl Into<String>,
        flavor: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            region: region.into(),
            flavor: flavor.into(),
            cpu_count: default_cpu_count(),
            image: image.into(),
            default_http_port: None,
            grpc_port: None,
            env_vars: Vec::new(),
        }
    }

    /// Sets the CPU count.
    #[must_use]
    pub const fn with_cpu_count(mut self, cpu_count: u32) -> Self {
        self.cpu_count = cpu_count;
        self
    }

    /// Sets both the default HTTP port and the gRPC port.
    #[must_use]
    pub const fn with_ports(mut self, default_http_port: u16, grpc_port: u16) -> Self {
        self.default_http_port = Some(default_http_port);
        self.grpc_port = Some(grpc_port);
        self
    }

    /// Appends an environment variable.
    #[must_use]
    pub fn with_env_var(mut self, env_var: EnvVar) -> Self {
        self.env_vars.push(env_var);
        self
    }

    /// Replaces the environment variables.
    #[must_use]
    pub fn with_env_vars(mut self, env_vars: Vec<EnvVar>) -> Self {
        self.env_vars = env_vars;
        self
    }

    /// Returns the env var names in declaration order.
    #[must_use]
    pub fn env_var_names(&self) -> Vec<&str> {
        self.env_vars.iter().map(|e| e.name.as_str()).collect()
    }
}

impl EnvVar {
    /// Creates an env var with a concrete value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::Present(value.into()),
        }
    }

    /// Creates an env var whose value is an explicit null (removal).
    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: EnvValue::Null,
        }
    }
}

impl EnvValue {
    /// Returns the string value, if present.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Present(value) => Some(value),
            Self::Null => None,
        }
    }

    /// Returns true for the explicit null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Option<String>> for EnvValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Present)
    }
}

impl From<EnvValue> for Option<String> {
    fn from(value: EnvValue) -> Self {
        match value {
            EnvValue::Present(value) => Some(value),
            EnvValue::Null => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_from_option() {
        assert_eq!(EnvValue::from(Some(String::from("v"))), EnvValue::Present(String::from("v")));
        assert_eq!(EnvValue::from(None), EnvValue::Null);
    }

    #[test]
    fn test_null_is_distinct_from_empty_string() {
        let empty = EnvVar::new("A", "");
        let null = EnvVar::null("A");

        assert_ne!(empty, null);
        assert_eq!(empty.value.as_str(), Some(""));
        assert!(null.value.is_null());
    }

    #[test]
    fn test_deserialize_yaml_null_value() {
        let yaml = r#"
tenant_id: t
region: GRA
flavor: ai1-1-cpu
image: "img:v1"
env_vars:
  - name: X
    value: ~
  - name: Z
    value: W
"#;
        let spec: DeploymentSpec = serde_yaml::from_str(yaml).expect("spec should parse");

        assert_eq!(spec.cpu_count, 1);
        assert_eq!(spec.env_vars, vec![EnvVar::null("X"), EnvVar::new("Z", "W")]);
        assert_eq!(spec.default_http_port, None);
    }

    #[test]
    fn test_missing_value_key_is_rejected() {
        let yaml = r#"
tenant_id: t
region: GRA
flavor: ai1-1-cpu
image: "img:v1"
env_vars:
  - name: X
"#;
        let err = serde_yaml::from_str::<DeploymentSpec>(yaml).expect_err("value is required");
        assert!(err.to_string().contains("missing field `value`"));
    }

    #[test]
    fn test_builder_helpers() {
        let spec = DeploymentSpec::new("t", "GRA", "ai1-1-cpu", "img:v1")
            .with_cpu_count(2)
            .with_ports(8081, 8082)
            .with_env_var(EnvVar::new("A", "1"))
            .with_env_var(EnvVar::null("B"));

        assert_eq!(spec.cpu_count, 2);
        assert_eq!(spec.default_http_port, Some(8081));
        assert_eq!(spec.grpc_port, Some(8082));
        assert_eq!(spec.env_var_names(), vec!["A", "B"]);
    }
}
