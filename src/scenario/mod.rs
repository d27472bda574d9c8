//! Scenarios: ordered steps of rendered configuration paired with checks.

mod attributes;
mod catalog;
mod check;
mod step;

pub use attributes::{AttributePath, AttributeSet, PathSegment};
pub use catalog::{ai_app_basic, ai_app_basic_steps};
pub use check::{Check, Expectation};
pub use step::{Scenario, ScenarioBuilder, TestStep};
