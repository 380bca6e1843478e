//! Backend that shells out to the docker binary.

pub(crate) mod args;
mod parse;

use std::collections::BTreeMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{Credentials, OrchestratorConfig};
use crate::domain::{Container, ExecSpec, Network, RunSpec, Stats};
use crate::error::{Error, Result};
use crate::ports::Orchestrator;

/// Exit code produced by the `timeout` wrapper when the deadline elapses.
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Orchestrator backed by the docker command-line binary.
pub struct CliOrchestrator {
    config: OrchestratorConfig,
}

impl CliOrchestrator {
    /// Build the adapter. If credentials are configured a `docker login` is
    /// attempted once; a login failure is reported but does not block
    /// subsequent operations.
    pub async fn new(config: OrchestratorConfig) -> Self {
        if let Some(credentials) = &config.credentials {
            if let Err(e) = login(&config.binary, credentials).await {
                warn!(error = %e, "docker login failed, continuing without registry auth");
            }
        }
        Self { config }
    }

    /// Invoke the docker binary and return its stdout, failing fast on a
    /// non-zero exit code with the backend's stderr as diagnostic.
    async fn docker(&self, operation: &str, args: &[String]) -> Result<String> {
        debug!(operation, binary = %self.config.binary, "invoking backend");

        let output = Command::new(&self.config.binary).args(args).output().await?;
        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::backend(operation, detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

async fn login(binary: &str, credentials: &Credentials) -> Result<()> {
    let mut child = Command::new(binary)
        .args(["login", "--username", &credentials.username, "--password-stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(credentials.password.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::backend("login", detail));
    }

    debug!("registry login succeeded");
    Ok(())
}

#[async_trait]
impl Orchestrator for CliOrchestrator {
    async fn create_network(&self, name: &str, internal: bool) -> Result<()> {
        let mut args = vec!["network".to_string(), "create".to_string()];
        if internal {
            args.push("--internal".to_string());
        }
        args.push(name.to_string());

        self.docker("network create", &args).await?;
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<()> {
        let args = vec!["network".to_string(), "rm".to_string(), name.to_string()];
        self.docker("network rm", &args).await?;
        Ok(())
    }

    async fn network_connect(&self, container: &str, network: &str) -> Result<()> {
        let args = vec![
            "network".to_string(),
            "connect".to_string(),
            network.to_string(),
            container.to_string(),
        ];
        self.docker("network connect", &args).await?;
        Ok(())
    }

    async fn network_disconnect(&self, container: &str, network: &str, force: bool) -> Result<()> {
        let mut args = vec!["network".to_string(), "disconnect".to_string()];
        if force {
            args.push("--force".to_string());
        }
        args.push(network.to_string());
        args.push(container.to_string());

        self.docker("network disconnect", &args).await?;
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        let args = vec![
            "network".to_string(),
            "ls".to_string(),
            "--format".to_string(),
            "{{json .}}".to_string(),
        ];
        let output = self.docker("network ls", &args).await?;
        parse::parse_networks(&output)
    }

    async fn pull(&self, image: &str) -> Result<()> {
        let args = vec!["pull".to_string(), image.to_string()];
        self.docker("pull", &args).await?;
        Ok(())
    }

    async fn list(&self, filters: &BTreeMap<String, String>) -> Result<Vec<Container>> {
        let output = self.docker("ps", &args::list_args(filters)).await?;
        parse::parse_containers(&output)
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        debug!(image = %spec.image, name = %spec.name, "running container");
        let output = self.docker("run", &args::run_args(spec, &self.config)).await?;
        Ok(output.trim().to_string())
    }

    async fn execute(&self, container: &str, spec: &ExecSpec) -> Result<String> {
        debug!(container, "executing command in container");
        let docker_args = args::exec_args(container, spec);

        // The advisory timeout is enforced by wrapping the invocation in
        // `timeout <secs> docker exec ...`; the wrapper exits with 124 when
        // the deadline elapses.
        let (program, invocation) = match spec.timeout_secs {
            Some(secs) => {
                let mut wrapped = vec![secs.to_string(), self.config.binary.clone()];
                wrapped.extend(docker_args);
                ("timeout".to_string(), wrapped)
            }
            None => (self.config.binary.clone(), docker_args),
        };

        let output = Command::new(&program).args(&invocation).output().await?;
        if !output.status.success() {
            if let (Some(seconds), Some(TIMEOUT_EXIT_CODE)) =
                (spec.timeout_secs, output.status.code())
            {
                return Err(Error::Timeout { seconds });
            }
            let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::backend("exec", detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn get_stats(
        &self,
        container: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Stats>> {
        let output = self
            .docker("stats", &args::stats_args(container, filters))
            .await?;
        parse::parse_stats(&output)
    }

    async fn remove(&self, container: &str, force: bool) -> Result<()> {
        debug!(container, force, "removing container");

        let mut args = vec!["rm".to_string()];
        if force {
            args.push("--force".to_string());
        }
        args.push(container.to_string());

        let output = self.docker("rm", &args).await?;

        // Some backends exit 0 without doing anything; only trust a removal
        // the backend echoed back.
        if !output.contains(container) {
            return Err(Error::backend(
                "rm",
                format!("backend did not confirm removal of {container:?}: {}", output.trim()),
            ));
        }
        Ok(())
    }

    fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_without_credentials_skips_login() {
        let adapter = CliOrchestrator::new(OrchestratorConfig::new()).await;
        assert_eq!(adapter.config().namespace, "utopia");
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation_in_output() {
        // A backend that exits 0 but does not echo the identifier must be
        // treated as a failed removal. Simulated with `echo` standing in
        // for the docker binary.
        let config = OrchestratorConfig::new().with_binary("echo");
        let adapter = CliOrchestrator::new(config).await;

        // `echo rm x` prints "rm x", which contains the name: accepted.
        assert!(adapter.remove("x", false).await.is_ok());

        // `true` exits 0 with no output at all: the no-op must be rejected.
        let config = OrchestratorConfig::new().with_binary("true");
        let adapter = CliOrchestrator::new(config).await;
        let err = adapter.remove("missing", false).await;
        assert!(err.is_err());
        match err {
            Err(Error::Backend { operation, .. }) => assert_eq!(operation, "rm"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_surfaces() {
        let config = OrchestratorConfig::new().with_binary("/nonexistent/docker-binary");
        let adapter = CliOrchestrator::new(config).await;
        let result = adapter.pull("alpine").await;
        assert!(matches!(result, Err(Error::Spawn(_))));
    }
}
