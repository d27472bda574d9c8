//! Attribute addressing and observed attribute sets.
//!
//! Observed state is flattened into dotted paths, the way acceptance checks
//! address it: `image`, `resources.cpu`, `env_vars.0.name`. Lists also expose
//! their length under `<list>.#`. Null values are omitted.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ConfigError;

/// A dotted attribute path with zero-based list indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    segments: Vec<PathSegment>,
}

/// One segment of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named field.
    Key(String),
    /// Position in a list.
    Index(usize),
    /// List length (`#`).
    Count,
}

impl AttributePath {
    /// Path of a field of the env var at `index`, e.g. `env_vars.0.name`.
    #[must_use]
    pub fn env_var(index: usize, field: &str) -> Self {
        Self {
            segments: vec![
                PathSegment::Key(String::from("env_vars")),
                PathSegment::Index(index),
                PathSegment::Key(field.to_string()),
            ],
        }
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl FromStr for AttributePath {
    type Err = ConfigError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments = path
            .split('.')
            .map(|segment| match segment {
                "" => Err(ConfigError::validation(
                    format!("Attribute path '{path}' has an empty segment"),
                    path,
                )),
                "#" => Ok(PathSegment::Count),
                s if s.bytes().all(|b| b.is_ascii_digit()) => s
                    .parse()
                    .map(PathSegment::Index)
                    .map_err(|e| ConfigError::validation(format!("Bad index in '{path}': {e}"), path)),
                s => Ok(PathSegment::Key(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Key(key) => f.write_str(key)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
                PathSegment::Count => f.write_str("#")?,
            }
        }
        Ok(())
    }
}

/// Flat view of a resource's observed attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, String>);

impl AttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Flattens a JSON object of resource values.
    #[must_use]
    pub fn from_json(values: &Value) -> Self {
        let mut set = Self::new();
        flatten("", values, &mut set.0);
        set
    }

    /// Looks up an attribute by path.
    #[must_use]
    pub fn get(&self, path: &AttributePath) -> Option<&str> {
        self.0.get(&path.to_string()).map(String::as_str)
    }

    /// Looks up an attribute by its dotted string form.
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Number of flattened attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates attributes in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(join("#"), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten(&join(&i.to_string()), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(&join(key), item, out);
            }
        }
    }
}
