//! Attribute checks evaluated after each apply.

use crate::error::{CheckFailure, ConfigError, HarnessError, Result};

use super::attributes::{AttributePath, AttributeSet};

/// What a check expects of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The attribute exists and equals this value.
    Equals(String),
    /// The attribute does not exist.
    Absent,
    /// The attribute exists with any value.
    Set,
}

/// A single `(path, expectation)` assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Attribute being checked.
    pub path: AttributePath,
    /// Expected state of the attribute.
    pub expectation: Expectation,
}

impl Check {
    /// Expects `path` to equal `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn equals(path: &str, value: impl ToString) -> Result<Self> {
        Self::new(path, Expectation::Equals(value.to_string()))
    }

    /// Expects `path` to be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn absent(path: &str) -> Result<Self> {
        Self::new(path, Expectation::Absent)
    }

    /// Expects `path` to be present with any value.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn set(path: &str) -> Result<Self> {
        Self::new(path, Expectation::Set)
    }

    /// Builds a check from a path and expectation.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed.
    pub fn new(path: &str, expectation: Expectation) -> Result<Self> {
        Ok(Self {
            path: path.parse().map_err(HarnessError::Config)?,
            expectation,
        })
    }

    /// Builds a check from a scenario file entry.
    ///
    /// A YAML null means absent; strings, numbers and booleans mean equals.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed or the expected value is
    /// not a scalar.
    pub fn from_yaml(path: &str, expected: &serde_yaml::Value) -> Result<Self> {
        let expectation = match expected {
            serde_yaml::Value::Null => Expectation::Absent,
            serde_yaml::Value::String(s) => Expectation::Equals(s.clone()),
            serde_yaml::Value::Number(n) => Expectation::Equals(n.to_string()),
            serde_yaml::Value::Bool(b) => Expectation::Equals(b.to_string()),
            _ => {
                return Err(HarnessError::Config(ConfigError::validation(
                    "Expected value must be a scalar or ~",
                    path,
                )));
            }
        };
        Self::new(path, expectation)
    }

    /// Evaluates the check against observed attributes.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckFailure`] with the expected and observed values.
    pub fn evaluate(&self, observed: &AttributeSet) -> std::result::Result<(), CheckFailure> {
        let actual = observed.get(&self.path);

        let holds = match (&self.expectation, actual) {
            (Expectation::Equals(expected), Some(actual)) => expected == actual,
            (Expectation::Absent, None) | (Expectation::Set, Some(_)) => true,
            _ => false,
        };

        if holds {
            Ok(())
        } else {
            Err(CheckFailure {
                path: self.path.to_string(),
                expected: self.expectation.to_string(),
                observed: actual.map(String::from),
            })
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals(value) => write!(f, "{value:?}"),
            Self::Absent => f.write_str("<absent>"),
            Self::Set => f.write_str("<any value>"),
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} == {}", self.path, self.expectation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observed() -> AttributeSet {
        AttributeSet::from_json(&json!({
            "region": "GRA",
            "grpc_port": 8082,
            "env_vars": [{ "name": "Z", "value": "W" }]
        }))
    }

    #[test]
    fn test_equals_holds() {
        let check = Check::equals("env_vars.0.name", "Z").expect("check");
        assert!(check.evaluate(&observed()).is_ok());

        let port = Check::equals("grpc_port", 8082).expect("check");
        assert!(port.evaluate(&observed()).is_ok());
    }

    #[test]
    fn test_mismatch_reports_path_expected_observed() {
        let check = Check::equals("env_vars.0.name", "X").expect("check");
        let failure = check.evaluate(&observed()).expect_err("should fail");

        assert_eq!(failure.path, "env_vars.0.name");
        assert_eq!(failure.expected, "\"X\"");
        assert_eq!(failure.observed.as_deref(), Some("Z"));
    }

    #[test]
    fn test_absent_and_set() {
        assert!(Check::absent("env_vars.1.name").expect("check").evaluate(&observed()).is_ok());
        assert!(Check::absent("region").expect("check").evaluate(&observed()).is_err());
        assert!(Check::set("region").expect("check").evaluate(&observed()).is_ok());
        assert!(Check::set("image").expect("check").evaluate(&observed()).is_err());
    }

    #[test]
    fn test_from_yaml() {
        let null = Check::from_yaml("x", &serde_yaml::Value::Null).expect("check");
        assert_eq!(null.expectation, Expectation::Absent);

        let number: serde_yaml::Value = serde_yaml::from_str("8081").expect("yaml");
        let port = Check::from_yaml("default_http_port", &number).expect("check");
        assert_eq!(port.expectation, Expectation::Equals(String::from("8081")));

        let list: serde_yaml::Value = serde_yaml::from_str("[1, 2]").expect("yaml");
        assert!(Check::from_yaml("x", &list).is_err());
    }
}
