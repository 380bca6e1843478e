//! Backend that talks to the Docker Engine HTTP API.

mod payload;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{RequestBuilder, StatusCode};
use tracing::debug;

use crate::config::{Credentials, OrchestratorConfig};
use crate::domain::{Container, ExecSpec, Network, RunSpec, Stats};
use crate::error::{Error, Result};
use crate::ports::Orchestrator;

use payload::{
    ConnectBody, ContainerSummary, CreateNetworkBody, CreatedResponse, DisconnectBody, EngineStats,
    ExecCreateBody, ExecInspectResponse, ExecStartBody, NetworkSummary,
};

/// Orchestrator backed by the engine's HTTP endpoint.
pub struct HttpOrchestrator {
    config: OrchestratorConfig,
    client: reqwest::Client,
    auth_header: Option<String>,
}

/// Credentials as the engine expects them: a base64 JSON blob for the
/// `X-Registry-Auth` header.
fn registry_auth(credentials: &Credentials) -> String {
    let blob = serde_json::json!({
        "username": credentials.username,
        "password": credentials.password,
    });
    STANDARD.encode(blob.to_string())
}

impl HttpOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let auth_header = config.credentials.as_ref().map(registry_auth);
        Self {
            config,
            client: reqwest::Client::new(),
            auth_header,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint.trim_end_matches('/'))
    }

    /// Send a request, attach the auth header if configured, and fail fast
    /// on any status other than the method-specific expected one.
    async fn send(
        &self,
        operation: &str,
        expected: StatusCode,
        builder: RequestBuilder,
    ) -> Result<String> {
        let builder = match &self.auth_header {
            Some(header) => builder.header("X-Registry-Auth", header),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != expected {
            return Err(Error::backend(
                operation,
                format!("unexpected status {status}: {}", body.trim()),
            ));
        }
        Ok(body)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, operation: &str, body: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| Error::Parse(format!("{operation}: malformed engine response: {e}")))
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn create_network(&self, name: &str, internal: bool) -> Result<()> {
        let body = CreateNetworkBody {
            name: name.to_string(),
            internal,
        };
        self.send(
            "network create",
            StatusCode::CREATED,
            self.client.post(self.url("/networks/create")).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> Result<()> {
        self.send(
            "network rm",
            StatusCode::NO_CONTENT,
            self.client.delete(self.url(&format!("/networks/{name}"))),
        )
        .await?;
        Ok(())
    }

    async fn network_connect(&self, container: &str, network: &str) -> Result<()> {
        let body = ConnectBody {
            container: container.to_string(),
        };
        self.send(
            "network connect",
            StatusCode::OK,
            self.client
                .post(self.url(&format!("/networks/{network}/connect")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn network_disconnect(&self, container: &str, network: &str, force: bool) -> Result<()> {
        let body = DisconnectBody {
            container: container.to_string(),
            force,
        };
        self.send(
            "network disconnect",
            StatusCode::OK,
            self.client
                .post(self.url(&format!("/networks/{network}/disconnect")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        let body = self
            .send(
                "network ls",
                StatusCode::OK,
                self.client.get(self.url("/networks")),
            )
            .await?;
        let summaries: Vec<NetworkSummary> = self.decode("network ls", &body)?;
        Ok(summaries.into_iter().map(NetworkSummary::into_network).collect())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        debug!(image, "pulling image");
        self.send(
            "pull",
            StatusCode::OK,
            self.client
                .post(self.url("/images/create"))
                .query(&[("fromImage", image)]),
        )
        .await?;
        Ok(())
    }

    async fn list(&self, filters: &BTreeMap<String, String>) -> Result<Vec<Container>> {
        let mut builder = self
            .client
            .get(self.url("/containers/json"))
            .query(&[("all", "true")]);
        if !filters.is_empty() {
            builder = builder.query(&[("filters", payload::filters_json(filters))]);
        }

        let body = self.send("ps", StatusCode::OK, builder).await?;
        let summaries: Vec<ContainerSummary> = self.decode("ps", &body)?;
        Ok(summaries
            .into_iter()
            .map(ContainerSummary::into_container)
            .collect())
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        debug!(image = %spec.image, name = %spec.name, "creating container");

        let body = payload::create_container_body(spec, &self.config);
        let mut builder = self.client.post(self.url("/containers/create")).json(&body);
        if !spec.name.is_empty() {
            builder = builder.query(&[("name", spec.name.as_str())]);
        }

        let response = self.send("run", StatusCode::CREATED, builder).await?;
        let created: CreatedResponse = self.decode("run", &response)?;

        self.send(
            "run",
            StatusCode::NO_CONTENT,
            self.client
                .post(self.url(&format!("/containers/{}/start", created.id))),
        )
        .await?;

        debug!(id = %created.id, "container started");
        Ok(created.id)
    }

    async fn execute(&self, container: &str, spec: &ExecSpec) -> Result<String> {
        debug!(container, "executing command in container");

        let create = ExecCreateBody {
            attach_stdout: true,
            attach_stderr: true,
            tty: true,
            env: payload::exec_env(&spec.env),
            cmd: spec.command.iter().filter(|t| !t.is_empty()).cloned().collect(),
        };
        let response = self
            .send(
                "exec",
                StatusCode::CREATED,
                self.client
                    .post(self.url(&format!("/containers/{container}/exec")))
                    .json(&create),
            )
            .await?;
        let created: CreatedResponse = self.decode("exec", &response)?;

        let start = ExecStartBody {
            detach: false,
            tty: true,
        };
        let mut builder = self
            .client
            .post(self.url(&format!("/exec/{}/start", created.id)))
            .json(&start);
        if let Some(seconds) = spec.timeout_secs {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let output = match self.send("exec", StatusCode::OK, builder).await {
            Err(Error::Http(e)) if e.is_timeout() => {
                return Err(Error::Timeout {
                    seconds: spec.timeout_secs.unwrap_or(0),
                })
            }
            other => other?,
        };

        let inspect_body = self
            .send(
                "exec",
                StatusCode::OK,
                self.client
                    .get(self.url(&format!("/exec/{}/json", created.id))),
            )
            .await?;
        let inspect: ExecInspectResponse = self.decode("exec", &inspect_body)?;
        if let Some(code) = inspect.exit_code {
            if code != 0 {
                return Err(Error::backend(
                    "exec",
                    format!("command exited with status {code}: {}", output.trim()),
                ));
            }
        }

        Ok(output)
    }

    async fn get_stats(
        &self,
        container: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Stats>> {
        let targets: Vec<String> = match container {
            Some(id) => vec![id.to_string()],
            None => self.list(filters).await?.into_iter().map(|c| c.id).collect(),
        };

        let mut all = Vec::with_capacity(targets.len());
        for target in targets {
            let body = self
                .send(
                    "stats",
                    StatusCode::OK,
                    self.client
                        .get(self.url(&format!("/containers/{target}/stats")))
                        .query(&[("stream", "false")]),
                )
                .await?;
            let raw: EngineStats = self.decode("stats", &body)?;
            all.push(raw.into_stats());
        }
        Ok(all)
    }

    async fn remove(&self, container: &str, force: bool) -> Result<()> {
        debug!(container, force, "removing container");
        self.send(
            "rm",
            StatusCode::NO_CONTENT,
            self.client
                .delete(self.url(&format!("/containers/{container}")))
                .query(&[("force", if force { "true" } else { "false" })]),
        )
        .await?;
        Ok(())
    }

    fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
