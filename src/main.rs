//! ai-app-acctest CLI entrypoint.
//!
//! This is the main entrypoint for the acceptance harness command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use ai_app_acctest::cli::{Cli, Commands, OutputFormat, OutputFormatter, ProvisionerKind};
use ai_app_acctest::config::{DeploymentSpec, ScenarioParser, SpecValidator, ValidationResult};
use ai_app_acctest::error::{HarnessError, Result};
use ai_app_acctest::runner::{Provisioner, SimulatedProvisioner, StepRunner, TerraformProvisioner};
use ai_app_acctest::scenario::{ai_app_basic, ai_app_basic_steps, Scenario, ScenarioBuilder};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    let json = cli.output == OutputFormat::Json;

    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = formatter.format_failure(&e);
            if !json || emit(&message).is_err() {
                eprintln!("{message}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Render { file } => cmd_render(file.as_deref(), formatter),
        Commands::Validate { file, strict } => cmd_validate(file.as_deref(), strict, formatter),
        Commands::Run {
            file,
            provisioner,
            terraform_bin,
            timeout_secs,
        } => {
            cmd_run(
                file.as_deref(),
                provisioner,
                terraform_bin,
                timeout_secs,
                formatter,
            )
            .await
        }
    }
}

/// Writes command output to stdout.
fn emit(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

/// Reads the tenant identifier, loading `.env` first.
fn load_tenant() -> Result<String> {
    ScenarioParser::new().load_dotenv()?;
    ScenarioParser::tenant_from_env()
}

/// Builds the scenario from a file, or the built-in one.
fn load_scenario(file: Option<&Path>) -> Result<Scenario> {
    let tenant = load_tenant()?;

    match file {
        Some(path) => {
            let scenario_file = ScenarioParser::new().load_file(path)?;
            ScenarioBuilder::from_file(scenario_file, &tenant)
        }
        None => {
            debug!("No scenario file given, using built-in scenario");
            ai_app_basic(&tenant)
        }
    }
}

/// Render every step's configuration.
fn cmd_render(file: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let scenario = load_scenario(file)?;
    emit(&formatter.format_rendered(&scenario))
}

/// Validate every step's spec.
fn cmd_validate(file: Option<&Path>, strict: bool, formatter: &OutputFormatter) -> Result<()> {
    let tenant = load_tenant()?;

    let (name, specs): (String, Vec<DeploymentSpec>) = match file {
        Some(path) => {
            let scenario_file = ScenarioParser::new().load_file(path)?;
            let specs = scenario_file
                .steps
                .into_iter()
                .map(|step| {
                    let mut spec = step.spec;
                    if spec.tenant_id.is_empty() {
                        spec.tenant_id.clone_from(&tenant);
                    }
                    spec
                })
                .collect();
            (scenario_file.name, specs)
        }
        None => (
            String::from("ai_app_basic"),
            ai_app_basic_steps(&tenant)?
                .into_iter()
                .map(|(spec, _)| spec)
                .collect(),
        ),
    };

    let results: Vec<ValidationResult> = specs.iter().map(SpecValidator::inspect).collect();
    emit(&formatter.format_validation(&name, &results))?;

    let validator = SpecValidator::new().strict(strict);
    for spec in &specs {
        validator.validate(spec)?;
    }

    info!("Scenario '{name}' is valid ({} steps)", specs.len());
    Ok(())
}

/// Run the scenario against a provisioning layer.
async fn cmd_run(
    file: Option<&Path>,
    kind: ProvisionerKind,
    terraform_bin: PathBuf,
    timeout_secs: Option<u64>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let scenario = load_scenario(file)?;

    let provisioner: Box<dyn Provisioner> = match kind {
        ProvisionerKind::Simulated => Box::new(SimulatedProvisioner::new()),
        ProvisionerKind::Terraform => Box::new(
            TerraformProvisioner::new(terraform_bin)
                .map_err(|e| HarnessError::internal(format!("Cannot prepare terraform: {e}")))?
                .with_address(scenario.address.clone()),
        ),
    };

    let mut runner = StepRunner::new(provisioner);
    if let Some(secs) = timeout_secs {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }

    let report = runner.run(&scenario).await?;
    emit(&formatter.format_report(&report))
}
