//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::error::HarnessError;
use crate::runner::RunReport;
use crate::scenario::Scenario;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Step row for table display.
#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Config")]
    fingerprint: String,
    #[tabled(rename = "Changed")]
    changed: String,
    #[tabled(rename = "Checks")]
    checks: String,
    #[tabled(rename = "Time")]
    duration: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the rendered configuration of every step.
    #[must_use]
    pub fn format_rendered(&self, scenario: &Scenario) -> String {
        match self.format {
            OutputFormat::Json => {
                let steps: Vec<_> = scenario
                    .steps
                    .iter()
                    .enumerate()
                    .map(|(i, step)| {
                        serde_json::json!({
                            "step": i + 1,
                            "fingerprint": step.fingerprint,
                            "config": step.config,
                        })
                    })
                    .collect();
                let json = serde_json::json!({
                    "scenario": scenario.name,
                    "address": scenario.address,
                    "steps": steps,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                for (i, step) in scenario.steps.iter().enumerate() {
                    let _ = writeln!(
                        output,
                        "# step {} ({})\n{}",
                        i + 1,
                        step.fingerprint.short(),
                        step.config
                    );
                }
                output
            }
        }
    }

    /// Formats validation results, one per step.
    #[must_use]
    pub fn format_validation(&self, scenario: &str, results: &[ValidationResult]) -> String {
        match self.format {
            OutputFormat::Json => {
                let steps: Vec<_> = results
                    .iter()
                    .enumerate()
                    .map(|(i, result)| {
                        serde_json::json!({
                            "step": i + 1,
                            "valid": result.is_valid(),
                            "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                            "warnings": result.warnings,
                        })
                    })
                    .collect();
                let json = serde_json::json!({ "scenario": scenario, "steps": steps });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("\nScenario: {scenario}\n\n");
                for (i, result) in results.iter().enumerate() {
                    let status = if result.is_valid() {
                        "✓".green()
                    } else {
                        "✗".red()
                    };
                    let _ = writeln!(
                        output,
                        "   {status} step {} ({} errors, {} warnings)",
                        i + 1,
                        result.errors.len(),
                        result.warning_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "       - {error}");
                    }
                    for warning in &result.warnings {
                        let _ = writeln!(output, "       {} {warning}", "⚠".yellow());
                    }
                }
                output
            }
        }
    }

    /// Formats a passing run report.
    #[must_use]
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "passed", "report": report });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();

                let _ = write!(
                    output,
                    "\nScenario '{}' against {} ({})\n\n",
                    report.scenario, report.address, report.provisioner
                );

                let rows: Vec<StepRow> = report
                    .steps
                    .iter()
                    .map(|s| StepRow {
                        step: s.step,
                        fingerprint: s.fingerprint.clone(),
                        changed: if s.changed { "yes" } else { "no" }.to_string(),
                        checks: format!("{}/{}", s.checks_passed, s.checks_total),
                        duration: format!("{} ms", s.duration_ms),
                    })
                    .collect();

                output.push_str(&Table::new(rows).to_string());
                output.push('\n');

                let _ = write!(
                    output,
                    "\n{} {} checks passed in {} ms\n",
                    "✓".green(),
                    report.checks_passed(),
                    report.duration_ms()
                );
                output
            }
        }
    }

    /// Formats a failed command.
    #[must_use]
    pub fn format_failure(&self, error: &HarnessError) -> String {
        match self.format {
            OutputFormat::Json => {
                let step = match error {
                    HarnessError::Step { step, .. } => Some(*step),
                    _ => None,
                };
                let mut json = serde_json::json!({
                    "status": "failed",
                    "error": error.to_string(),
                    "step": step,
                });
                if let Some(failure) = error.check_failure() {
                    json["check"] = serde_json::json!({
                        "path": failure.path,
                        "expected": failure.expected,
                        "observed": failure.observed,
                    });
                }
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {error}", "✗".red()),
        }
    }
}
