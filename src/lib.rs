// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # AI App Acceptance Harness
//!
//! Acceptance tests for the `ovh_cloud_project_ai_app` resource of a
//! declarative provisioning layer.
//!
//! ## Overview
//!
//! A scenario is a sequence of desired states. Each one is rendered into HCL,
//! applied through a provisioning layer, and checked against the attributes
//! the layer reports back. The resource is always torn down at the end.
//!
//! The interesting transition is removing an environment variable: the next
//! desired state lists it with an explicit `null` value instead of leaving it
//! out, because an omitted entry is kept by the provider.
//!
//! ## Modules
//!
//! - [`config`]: Deployment specs, scenario files, validation, fingerprints
//! - [`render`]: HCL rendering of specs
//! - [`scenario`]: Steps, checks and attribute paths, built-in scenarios
//! - [`runner`]: Provisioning layers and the step runner
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! name: env-var-removal
//! steps:
//!   - spec:
//!       region: GRA
//!       flavor: ai1-1-cpu
//!       image: registry.example/app:v1
//!       env_vars:
//!         - name: X
//!           value: "Y"
//!     checks:
//!       env_vars.0.name: X
//!   - spec:
//!       region: GRA
//!       flavor: ai1-1-cpu
//!       image: registry.example/app:v2
//!       env_vars:
//!         - name: X
//!           value: ~
//!         - name: Z
//!           value: W
//!     checks:
//!       env_vars.0.name: Z
//!       env_vars.1.name: ~
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod render;
pub mod runner;
pub mod scenario;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigFingerprint, DeploymentSpec, EnvValue, EnvVar, ScenarioParser, SpecValidator};
pub use error::{HarnessError, Result};
pub use render::ConfigRenderer;
pub use runner::{Provisioner, RunReport, SimulatedProvisioner, StepRunner, TerraformProvisioner};
pub use scenario::{ai_app_basic, Check, Expectation, Scenario, ScenarioBuilder};
