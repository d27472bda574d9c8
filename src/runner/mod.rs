//! Step execution against a provisioning layer.
//!
//! This module contains:
//! - The [`Provisioner`] trait and its outcome type
//! - An in-memory provisioner for tests and dry runs
//! - A provisioner driving the `terraform` CLI
//! - The [`StepRunner`] and its reports

mod executor;
mod provisioner;
mod report;
mod simulated;
mod terraform;

pub use executor::StepRunner;
pub use provisioner::{ApplyOutcome, Provisioner};
pub use report::{RunReport, StepReport};
pub use simulated::SimulatedProvisioner;
pub use terraform::{attributes_from_show, TerraformProvisioner, DEFAULT_PROVIDER_SOURCE};
