//! In-memory provisioning layer.
//!
//! Parses configuration text with `hcl-rs` and converges a single resource the
//! way the real provider treats optional+computed attributes: a value in the
//! configuration replaces the stored one, an explicit `null` removes it, and an
//! omitted attribute keeps its previous value. `env_vars` entries are applied
//! one by one to the stored list, so a `null` value deletes that variable.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ConfigFingerprint;
use crate::error::ApplyError;
use crate::render::{DEFAULT_RESOURCE_NAME, DEFAULT_RESOURCE_TYPE};
use crate::scenario::AttributeSet;

use super::provisioner::{ApplyOutcome, Provisioner};

/// Attributes that must be present and non-empty.
const REQUIRED_STRINGS: [&str; 3] = ["service_name", "region", "image"];

/// Name of the list attribute with per-entry removal semantics.
const ENV_VARS: &str = "env_vars";

/// Stored state of the simulated resource.
#[derive(Debug, Clone)]
struct Deployed {
    /// Converged attribute values.
    values: Map<String, Value>,
    /// Fingerprint of the last applied configuration.
    fingerprint: ConfigFingerprint,
}

/// Provisioning layer that keeps one resource in memory.
#[derive(Debug)]
pub struct SimulatedProvisioner {
    /// Resource type label to look for.
    resource_type: String,
    /// Resource name label to look for.
    resource_name: String,
    /// Current state, `None` until the first apply.
    state: Mutex<Option<Deployed>>,
}

impl Default for SimulatedProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvisioner {
    /// Creates a provisioner for the default AI app resource.
    #[must_use]
    pub fn new() -> Self {
        Self::for_resource(DEFAULT_RESOURCE_TYPE, DEFAULT_RESOURCE_NAME)
    }

    /// Creates a provisioner for a specific resource block.
    #[must_use]
    pub fn for_resource(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            state: Mutex::new(None),
        }
    }

    /// Returns the current attributes, or `None` if nothing is deployed.
    pub async fn attributes(&self) -> Option<AttributeSet> {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|deployed| AttributeSet::from_json(&Value::Object(deployed.values.clone())))
    }

    fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_name)
    }

    /// Extracts the desired attributes of our resource block.
    fn desired(&self, config: &str) -> Result<Map<String, Value>, ApplyError> {
        let document: Value = hcl::from_str(config).map_err(ApplyError::invalid_config)?;

        let block = document
            .get("resource")
            .and_then(|r| r.get(&self.resource_type))
            .and_then(|t| t.get(&self.resource_name))
            .ok_or_else(|| ApplyError::rejected(self.address(), "resource block not found"))?;

        match block {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(ApplyError::rejected(self.address(), "resource block is not a body")),
        }
    }

    fn check_required(&self, desired: &Map<String, Value>) -> Result<(), ApplyError> {
        for field in REQUIRED_STRINGS {
            match desired.get(field).and_then(Value::as_str) {
                Some(value) if !value.is_empty() => {}
                _ => {
                    return Err(ApplyError::rejected(
                        self.address(),
                        format!("required attribute '{field}' is missing or empty"),
                    ));
                }
            }
        }

        let resources = desired
            .get("resources")
            .and_then(Value::as_object)
            .ok_or_else(|| ApplyError::rejected(self.address(), "required attribute 'resources' is missing"))?;

        if resources.get("flavor").and_then(Value::as_str).is_none_or(str::is_empty) {
            return Err(ApplyError::rejected(
                self.address(),
                "required attribute 'resources.flavor' is missing or empty",
            ));
        }
        if resources.get("cpu").and_then(Value::as_u64).is_none_or(|cpu| cpu == 0) {
            return Err(ApplyError::rejected(
                self.address(),
                "'resources.cpu' must be a positive number",
            ));
        }

        Ok(())
    }

    /// Applies desired attributes on top of the previous ones.
    fn converge(
        &self,
        previous: &Map<String, Value>,
        desired: Map<String, Value>,
    ) -> Result<Map<String, Value>, ApplyError> {
        let mut values = previous.clone();

        for (key, value) in desired {
            if key == ENV_VARS {
                let merged = self.merge_env_vars(values.get(ENV_VARS), value)?;
                values.insert(key, merged);
            } else if value.is_null() {
                values.remove(&key);
            } else {
                values.insert(key, value);
            }
        }

        Ok(values)
    }

    fn merge_env_vars(&self, previous: Option<&Value>, desired: Value) -> Result<Value, ApplyError> {
        let entries = match desired {
            Value::Null => return Ok(Value::Array(Vec::new())),
            Value::Array(entries) => entries,
            _ => return Err(ApplyError::rejected(self.address(), "'env_vars' must be a list")),
        };

        let mut current: Vec<(String, String)> = previous
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some((
                            item.get("name")?.as_str()?.to_string(),
                            item.get("value")?.as_str()?.to_string(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        for entry in entries {
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| ApplyError::rejected(self.address(), "env var without a name"))?;

            match entry.get("value") {
                None | Some(Value::Null) => {
                    debug!("Removing env var {name}");
                    current.retain(|(existing, _)| existing != name);
                }
                Some(Value::String(value)) => {
                    if let Some(slot) = current.iter_mut().find(|(existing, _)| existing == name) {
                        slot.1.clone_from(value);
                    } else {
                        current.push((name.to_string(), value.clone()));
                    }
                }
                Some(_) => {
                    return Err(ApplyError::rejected(
                        self.address(),
                        format!("value of env var '{name}' must be a string or null"),
                    ));
                }
            }
        }

        Ok(Value::Array(
            current
                .into_iter()
                .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
                .collect(),
        ))
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    async fn apply(&self, config: &str) -> Result<ApplyOutcome, ApplyError> {
        let fingerprint = ConfigFingerprint::of(config);
        let desired = self.desired(config)?;
        self.check_required(&desired)?;

        let mut state = self.state.lock().await;

        if let Some(deployed) = state.as_ref() {
            if deployed.fingerprint == fingerprint {
                debug!("Config {} already applied", fingerprint.short());
                return Ok(ApplyOutcome::unchanged(AttributeSet::from_json(
                    &Value::Object(deployed.values.clone()),
                )));
            }
        }

        let created = state.is_none();
        let previous = state
            .as_ref()
            .map(|deployed| deployed.values.clone())
            .unwrap_or_default();

        let mut values = self.converge(&previous, desired)?;
        if created {
            values.insert(String::from("id"), Value::String(uuid::Uuid::new_v4().to_string()));
            info!("Created {}", self.address());
        } else {
            info!("Updated {}", self.address());
        }

        let changed = created || values != previous;
        let attributes = AttributeSet::from_json(&Value::Object(values.clone()));
        *state = Some(Deployed { values, fingerprint });

        Ok(if changed {
            ApplyOutcome::changed(attributes)
        } else {
            ApplyOutcome::unchanged(attributes)
        })
    }

    async fn destroy(&self) -> Result<(), ApplyError> {
        if self.state.lock().await.take().is_some() {
            info!("Destroyed {}", self.address());
        } else {
            debug!("Nothing to destroy for {}", self.address());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
