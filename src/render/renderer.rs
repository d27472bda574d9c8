//! HCL rendering of deployment specs.
//!
//! The renderer is explicit branch/iterate logic over [`DeploymentSpec`]: each
//! optional field is a presence check, `env_vars` is an ordered loop, and each
//! entry branches on [`EnvValue`]. The resulting [`Body`] is serialized with
//! `hcl-rs`, which also takes care of string escaping.

use hcl::expr::{Expression, Object, ObjectKey};
use hcl::{Attribute, Block, Body, Identifier, Number};
use tracing::debug;

use crate::config::{ConfigFingerprint, DeploymentSpec, EnvValue, EnvVar};
use crate::error::RenderError;

/// Resource type of the managed AI app.
pub const DEFAULT_RESOURCE_TYPE: &str = "ovh_cloud_project_ai_app";

/// Resource name used by the acceptance scenarios.
pub const DEFAULT_RESOURCE_NAME: &str = "my_test_app";

/// Renders deployment specs into resource configuration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRenderer {
    /// Resource type label.
    resource_type: String,
    /// Resource name label.
    resource_name: String,
}

impl Default for ConfigRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_TYPE, DEFAULT_RESOURCE_NAME)
    }
}

impl ConfigRenderer {
    /// Creates a renderer for the given resource labels.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
        }
    }

    /// Resource type label.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Resource name label.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Returns the resource address, e.g. `ovh_cloud_project_ai_app.my_test_app`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_name)
    }

    /// Renders a spec into configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be bound or the document cannot be
    /// serialized. Both indicate a harness bug and should abort the scenario.
    pub fn render(&self, spec: &DeploymentSpec) -> Result<String, RenderError> {
        let body = self.body(spec)?;
        let text = hcl::to_string(&body).map_err(|e| RenderError::Serialize(e.to_string()))?;

        debug!(
            "Rendered {} ({} env vars, fingerprint {})",
            self.address(),
            spec.env_vars.len(),
            ConfigFingerprint::of(&text).short()
        );

        Ok(text)
    }

    /// Builds the HCL body for a spec without serializing it.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be bound to a valid identifier.
    pub fn body(&self, spec: &DeploymentSpec) -> Result<Body, RenderError> {
        let block = Block::builder("resource")
            .add_label(self.resource_type.clone())
            .add_label(self.resource_name.clone())
            .add_attributes(Self::attributes(spec)?)
            .build();

        Ok(Body::builder().add_block(block).build())
    }

    /// Builds the resource attributes in rendering order.
    fn attributes(spec: &DeploymentSpec) -> Result<Vec<Attribute>, RenderError> {
        let mut resources = Object::new();
        resources.insert(key("cpu")?, Expression::Number(Number::from(spec.cpu_count)));
        resources.insert(key("flavor")?, Expression::String(spec.flavor.clone()));

        let mut attrs = vec![
            attribute("service_name", Expression::String(spec.tenant_id.clone()))?,
            attribute("region", Expression::String(spec.region.clone()))?,
            attribute("resources", Expression::Object(resources))?,
            attribute("image", Expression::String(spec.image.clone()))?,
        ];

        if let Some(port) = spec.default_http_port {
            attrs.push(attribute("default_http_port", Expression::Number(Number::from(port)))?);
        }

        if let Some(port) = spec.grpc_port {
            attrs.push(attribute("grpc_port", Expression::Number(Number::from(port)))?);
        }

        if !spec.env_vars.is_empty() {
            let entries = spec
                .env_vars
                .iter()
                .map(env_var_entry)
                .collect::<Result<Vec<_>, _>>()?;
            attrs.push(attribute("env_vars", Expression::Array(entries))?);
        }

        Ok(attrs)
    }
}

/// Renders one env var as `{ name = "...", value = "..." | null }`.
fn env_var_entry(env_var: &EnvVar) -> Result<Expression, RenderError> {
    let value = match &env_var.value {
        EnvValue::Present(value) => Expression::String(value.clone()),
        EnvValue::Null => Expression::Null,
    };

    let mut entry = Object::new();
    entry.insert(key("name")?, Expression::String(env_var.name.clone()));
    entry.insert(key("value")?, value);

    Ok(Expression::Object(entry))
}

fn identifier(field: &str) -> Result<Identifier, RenderError> {
    Identifier::new(field).map_err(|e| RenderError::binding(field, e))
}

fn key(field: &str) -> Result<ObjectKey, RenderError> {
    identifier(field).map(ObjectKey::Identifier)
}

fn attribute(field: &str, expr: Expression) -> Result<Attribute, RenderError> {
    Ok(Attribute::new(identifier(field)?, expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial_spec() -> DeploymentSpec {
        DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v1")
            .with_env_var(EnvVar::new("X", "Y"))
    }

    fn updated_spec() -> DeploymentSpec {
        DeploymentSpec::new("T", "GRA", "ai1-1-cpu", "img:v2")
            .with_ports(8081, 8082)
            .with_env_var(EnvVar::null("X"))
            .with_env_var(EnvVar::new("Z", "W"))
    }

    /// Parses rendered text back and returns the resource block attributes.
    fn parsed_attributes(text: &str) -> Vec<(String, Expression)> {
        let body = hcl::parse(text).expect("rendered text should parse");
        let block = body.blocks().next().expect("one resource block");
        block
            .body()
            .attributes()
            .map(|attr| (attr.key().to_string(), attr.expr.clone().into()))
            .collect()
    }

    fn find<'a>(attrs: &'a [(String, Expression)], name: &str) -> Option<&'a Expression> {
        attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn as_u64(expr: Option<&Expression>) -> Option<u64> {
        match expr {
            Some(Expression::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    fn env_entries(attrs: &[(String, Expression)]) -> Vec<(String, Expression)> {
        let Some(Expression::Array(entries)) = find(attrs, "env_vars") else {
            panic!("env_vars should be an array");
        };
        entries
            .iter()
            .map(|entry| {
                let Expression::Object(object) = entry else {
                    panic!("env var entry should be an object");
                };
                let mut name = None;
                let mut value = None;
                for (k, v) in object {
                    let key = match k {
                        ObjectKey::Identifier(ident) => ident.as_str().to_owned(),
                        ObjectKey::Expression(Expression::String(s)) => s.clone(),
                        other => panic!("unexpected key {other:?}"),
                    };
                    match key.as_str() {
                        "name" => name = Some(v.clone()),
                        "value" => value = Some(v.clone()),
                        other => panic!("unexpected key {other}"),
                    }
                }
                let Some(Expression::String(name)) = name else {
                    panic!("name should be a string");
                };
                (name, value.expect("value is always emitted"))
            })
            .collect()
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = ConfigRenderer::default();
        let spec = updated_spec();

        let first = renderer.render(&spec).expect("render");
        let second = renderer.render(&spec).expect("render");

        assert_eq!(first, second);
    }

    #[test]
    fn test_render_resource_block_labels() {
        let text = ConfigRenderer::default().render(&initial_spec()).expect("render");
        let body = hcl::parse(&text).expect("parse");
        let block = body.blocks().next().expect("block");

        assert_eq!(block.identifier(), "resource");
        let labels: Vec<&str> = block.labels().iter().map(|l| l.as_str()).collect();
        assert_eq!(labels, vec![DEFAULT_RESOURCE_TYPE, DEFAULT_RESOURCE_NAME]);
    }

    #[test]
    fn test_unconditional_fields() {
        let text = ConfigRenderer::default().render(&initial_spec()).expect("render");
        let attrs = parsed_attributes(&text);

        assert_eq!(find(&attrs, "service_name"), Some(&Expression::String("T".into())));
        assert_eq!(find(&attrs, "region"), Some(&Expression::String("GRA".into())));
        assert_eq!(find(&attrs, "image"), Some(&Expression::String("img:v1".into())));
        assert!(matches!(find(&attrs, "resources"), Some(Expression::Object(_))));
    }

    #[test]
    fn test_ports_omitted_when_absent() {
        let text = ConfigRenderer::default().render(&initial_spec()).expect("render");

        assert!(!text.contains("default_http_port"));
        assert!(!text.contains("grpc_port"));
    }

    #[test]
    fn test_ports_emitted_with_exact_values() {
        let text = ConfigRenderer::default().render(&updated_spec()).expect("render");
        let attrs = parsed_attributes(&text);

        assert_eq!(as_u64(find(&attrs, "default_http_port")), Some(8081));
        assert_eq!(as_u64(find(&attrs, "grpc_port")), Some(8082));
    }

    #[test]
    fn test_ports_are_independently_optional() {
        let mut spec = initial_spec();
        spec.grpc_port = Some(9000);

        let text = ConfigRenderer::default().render(&spec).expect("render");
        let attrs = parsed_attributes(&text);

        assert!(find(&attrs, "default_http_port").is_none());
        assert_eq!(as_u64(find(&attrs, "grpc_port")), Some(9000));
    }

    #[test]
    fn test_env_vars_preserve_order_and_null_branch() {
        let text = ConfigRenderer::default().render(&updated_spec()).expect("render");
        let entries = env_entries(&parsed_attributes(&text));

        assert_eq!(
            entries,
            vec![
                (String::from("X"), Expression::Null),
                (String::from("Z"), Expression::String("W".into())),
            ]
        );
    }

    #[test]
    fn test_null_distinct_from_empty_string() {
        let spec = DeploymentSpec::new("T", "GRA", "f", "i")
            .with_env_var(EnvVar::new("EMPTY", ""))
            .with_env_var(EnvVar::null("GONE"));

        let text = ConfigRenderer::default().render(&spec).expect("render");
        let entries = env_entries(&parsed_attributes(&text));

        assert_eq!(entries[0].1, Expression::String(String::new()));
        assert_eq!(entries[1].1, Expression::Null);
        assert!(text.contains("null"));
    }

    #[test]
    fn test_empty_env_vars_omits_block() {
        let spec = DeploymentSpec::new("T", "GRA", "f", "i");
        let text = ConfigRenderer::default().render(&spec).expect("render");

        assert!(!text.contains("env_vars"));
    }

    #[test]
    fn test_values_are_escaped() {
        let spec = DeploymentSpec::new("T", "GRA", "f", "i")
            .with_env_var(EnvVar::new("TRICKY", "say \"hi\" ${oops}"))
            .with_env_var(EnvVar::new("DIRECTIVE", "%{ if true }x%{ endif }"))
            .with_env_var(EnvVar::new("SLASH", "C:\\dir\nnext"));

        let text = ConfigRenderer::default().render(&spec).expect("render");
        let entries = env_entries(&parsed_attributes(&text));

        assert!(text.contains("$${oops}"));
        assert!(text.contains("%%{ if true }"));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, "TRICKY");
        assert_eq!(entries[0].1, Expression::String(String::from("say \"hi\" ${oops}")));
        assert_eq!(
            entries[1].1,
            Expression::String(String::from("%{ if true }x%{ endif }"))
        );
        assert_eq!(entries[2].1, Expression::String(String::from("C:\\dir\nnext")));
    }

    #[test]
    fn test_custom_address() {
        let renderer = ConfigRenderer::new("ovh_cloud_project_ai_app", "other");
        assert_eq!(renderer.address(), "ovh_cloud_project_ai_app.other");
        assert_eq!(
            ConfigRenderer::default().address(),
            "ovh_cloud_project_ai_app.my_test_app"
        );
    }
}
