//! Provisioning through the `terraform` CLI.
//!
//! Each provisioner owns a temporary working directory holding `provider.tf`
//! and the `main.tf` of the current step. Observed attributes come from
//! `terraform show -json`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::error::ApplyError;
use crate::render::{DEFAULT_RESOURCE_NAME, DEFAULT_RESOURCE_TYPE};
use crate::scenario::AttributeSet;

use super::provisioner::{ApplyOutcome, Provisioner};

/// Registry source of the provider serving the AI app resource.
pub const DEFAULT_PROVIDER_SOURCE: &str = "ovh/ovh";

/// Line `terraform apply` prints when there is nothing to do.
const NO_CHANGES_MARKER: &str = "No changes.";

/// Provisioner that shells out to `terraform`.
#[derive(Debug)]
pub struct TerraformProvisioner {
    /// Path or name of the terraform binary.
    binary: PathBuf,
    /// Provider registry source.
    provider_source: String,
    /// Resource address in state.
    address: String,
    /// Working directory, removed on drop.
    work_dir: TempDir,
    /// Whether `terraform init` has run.
    initialized: Mutex<bool>,
    /// Held while a terraform process is alive, including after cancellation.
    in_flight: Arc<Mutex<()>>,
}

impl TerraformProvisioner {
    /// Creates a provisioner with a fresh working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let work_dir = tempfile::Builder::new().prefix("ai-app-acctest-").tempdir()?;
        debug!("Terraform working directory: {}", work_dir.path().display());

        Ok(Self {
            binary: binary.into(),
            provider_source: String::from(DEFAULT_PROVIDER_SOURCE),
            address: format!("{DEFAULT_RESOURCE_TYPE}.{DEFAULT_RESOURCE_NAME}"),
            work_dir,
            initialized: Mutex::new(false),
            in_flight: Arc::new(Mutex::new(())),
        })
    }

    /// Sets the resource address to read back after apply.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the provider registry source.
    #[must_use]
    pub fn with_provider_source(mut self, source: impl Into<String>) -> Self {
        self.provider_source = source.into();
        self
    }

    /// Working directory holding the configuration files.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    fn provider_config(&self) -> String {
        let provider = self.address.split('_').next().unwrap_or("ovh");
        format!(
            "terraform {{\n  required_providers {{\n    {provider} = {{\n      source = \"{}\"\n    }}\n  }}\n}}\n",
            self.provider_source
        )
    }

    async fn ensure_initialized(&self) -> Result<(), ApplyError> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }

        tokio::fs::write(self.work_dir().join("provider.tf"), self.provider_config()).await?;
        self.run(&["init", "-input=false", "-no-color"]).await?;
        *initialized = true;
        Ok(())
    }

    /// Runs terraform with `args` and returns its stdout.
    ///
    /// The process is supervised by a separate task. If this future is
    /// dropped (a step timing out), the task kills the process and only
    /// releases `in_flight` once it has exited.
    async fn run(&self, args: &[&str]) -> Result<String, ApplyError> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        info!("Running {command}");

        let slot = Arc::clone(&self.in_flight).lock_owned().await;
        let mut child = Command::new(&self.binary)
            .args(args)
            .current_dir(self.work_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (_cancel_on_drop, cancelled) = oneshot::channel::<()>();
        let supervisor = tokio::spawn(async move {
            let _slot = slot;
            let finished = tokio::select! {
                output = collect_output(&mut child) => Some(output),
                _ = cancelled => None,
            };
            if finished.is_none() {
                warn!("Terraform command cancelled, killing process");
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill terraform process: {e}");
                }
            }
            finished
        });

        let (status, stdout, stderr) = supervisor
            .await
            .map_err(|e| ApplyError::Io(std::io::Error::other(e.to_string())))?
            .ok_or_else(|| ApplyError::InvalidOutput {
                message: format!("{command} was cancelled"),
            })??;

        if !status.success() {
            return Err(ApplyError::Command {
                command,
                status: status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Waits until no terraform process is running.
    async fn wait_idle(&self) {
        drop(self.in_flight.lock().await);
    }
}

/// Waits for `child` while draining both pipes.
async fn collect_output(child: &mut Child) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (status, stdout, stderr) =
        tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))?;
    Ok((status, stdout, stderr))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Finds `address` in `terraform show -json` output and flattens its values.
///
/// # Errors
///
/// Returns an error if the output is not JSON or the resource is missing.
pub fn attributes_from_show(output: &str, address: &str) -> Result<AttributeSet, ApplyError> {
    let document: Value = serde_json::from_str(output).map_err(|e| ApplyError::InvalidOutput {
        message: format!("show output is not JSON: {e}"),
    })?;

    document
        .pointer("/values/root_module/resources")
        .and_then(Value::as_array)
        .and_then(|resources| {
            resources
                .iter()
                .find(|r| r.get("address").and_then(Value::as_str) == Some(address))
        })
        .and_then(|r| r.get("values"))
        .map(AttributeSet::from_json)
        .ok_or_else(|| ApplyError::InvalidOutput {
            message: format!("resource {address} not found in state"),
        })
}

#[async_trait]
impl Provisioner for TerraformProvisioner {
    async fn apply(&self, config: &str) -> Result<ApplyOutcome, ApplyError> {
        tokio::fs::write(self.work_dir().join("main.tf"), config).await?;
        self.ensure_initialized().await?;

        let applied = self
            .run(&["apply", "-auto-approve", "-input=false", "-no-color"])
            .await?;
        let shown = self.run(&["show", "-json", "-no-color"]).await?;
        let attributes = attributes_from_show(&shown, &self.address)?;

        Ok(if applied.contains(NO_CHANGES_MARKER) {
            ApplyOutcome::unchanged(attributes)
        } else {
            ApplyOutcome::changed(attributes)
        })
    }

    async fn destroy(&self) -> Result<(), ApplyError> {
        if !*self.initialized.lock().await {
            debug!("Nothing to destroy, terraform was never initialized");
            return Ok(());
        }

        // An apply cancelled by a timeout may still be exiting.
        self.wait_idle().await;
        if let Err(e) = self
            .run(&["destroy", "-auto-approve", "-input=false", "-no-color"])
            .await
        {
            warn!("Destroy of {} failed", self.address);
            return Err(e);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "terraform"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_OUTPUT: &str = r#"{
  "format_version": "1.0",
  "values": {
    "root_module": {
      "resources": [
        {
          "address": "ovh_cloud_project_ai_app.my_test_app",
          "type": "ovh_cloud_project_ai_app",
          "name": "my_test_app",
          "values": {
            "id": "1234",
            "service_name": "tenant",
            "image": "img:v2",
            "default_http_port": 8081,
            "grpc_port": null,
            "env_vars": [{ "name": "testEnvVarName2", "value": "testEnvVarValue2" }]
          }
        }
      ]
    }
  }
}"#;

    #[test]
    fn test_attributes_from_show() {
        let attributes =
            attributes_from_show(SHOW_OUTPUT, "ovh_cloud_project_ai_app.my_test_app").expect("attributes");

        assert_eq!(attributes.get_str("default_http_port"), Some("8081"));
        assert_eq!(attributes.get_str("grpc_port"), None);
        assert_eq!(attributes.get_str("env_vars.0.name"), Some("testEnvVarName2"));
    }

    #[test]
    fn test_attributes_from_show_missing_resource() {
        let result = attributes_from_show(SHOW_OUTPUT, "ovh_cloud_project_ai_app.other");
        assert!(matches!(result, Err(ApplyError::InvalidOutput { .. })));

        let result = attributes_from_show("not json", "x.y");
        assert!(matches!(result, Err(ApplyError::InvalidOutput { .. })));
    }

    #[test]
    fn test_provider_config() {
        let provisioner = TerraformProvisioner::new("terraform").expect("provisioner");
        let config = provisioner.provider_config();

        assert!(config.contains("required_providers"));
        assert!(config.contains("ovh = {"));
        assert!(config.contains("source = \"ovh/ovh\""));
        hcl::parse(&config).expect("provider config should be valid HCL");
    }

    #[tokio::test]
    async fn test_destroy_before_init_is_noop() {
        let provisioner = TerraformProvisioner::new("terraform-not-installed").expect("provisioner");
        provisioner.destroy().await.expect("destroy");
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let provisioner = TerraformProvisioner::new("terraform-not-installed").expect("provisioner");
        let result = provisioner.apply("resource \"x\" \"y\" {}").await;

        assert!(matches!(result, Err(ApplyError::Io(_))));
        assert!(provisioner.work_dir().join("main.tf").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_status() {
        let provisioner = TerraformProvisioner::new("false").expect("provisioner");
        let result = provisioner.apply("resource \"x\" \"y\" {}").await;

        match result {
            Err(ApplyError::Command { command, status, .. }) => {
                assert!(command.contains("init"));
                assert_eq!(status, 1);
            }
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_apply_is_killed_before_destroy() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        use crate::error::HarnessError;
        use crate::runner::StepRunner;
        use crate::scenario::ai_app_basic;

        let bin_dir = tempfile::tempdir().expect("temp dir");
        let log = bin_dir.path().join("calls.log");
        let script = bin_dir.path().join("terraform");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 apply) echo 'apply started' >> '{log}'; sleep 2; echo 'apply finished' >> '{log}' ;;\n\
                 destroy) echo 'destroyed' >> '{log}' ;;\n\
                 esac\n",
                log = log.display()
            ),
        )
        .expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");

        let provisioner = TerraformProvisioner::new(&script).expect("provisioner");
        let runner = StepRunner::new(provisioner).with_timeout(Duration::from_millis(300));
        let scenario = ai_app_basic("tenant").expect("scenario");

        let result = runner.run(&scenario).await;
        assert!(matches!(result, Err(HarnessError::Timeout { .. })));

        // Outlive the sleep so a surviving apply would have logged.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let calls = std::fs::read_to_string(&log).expect("read log");
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines, vec!["apply started", "destroyed"]);
    }
}
