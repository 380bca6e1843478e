use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::OrchestratorConfig;
use crate::domain::{Container, ExecSpec, Network, RunSpec, Stats};
use crate::error::Result;

/// Port implemented by each backend (docker CLI, engine HTTP API).
///
/// Every mutating operation is fail-fast: a non-success exit code or HTTP
/// status surfaces immediately as [`crate::error::Error::Backend`] carrying
/// the backend's raw diagnostic text. There is no retry at this layer, and
/// concurrent mutations of the same container are not coordinated here;
/// callers must serialize same-target mutations themselves.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Create a network, optionally isolated from external access.
    async fn create_network(&self, name: &str, internal: bool) -> Result<()>;

    /// Remove a network.
    async fn remove_network(&self, name: &str) -> Result<()>;

    /// Attach a container to a network.
    async fn network_connect(&self, container: &str, network: &str) -> Result<()>;

    /// Detach a container from a network.
    async fn network_disconnect(&self, container: &str, network: &str, force: bool) -> Result<()>;

    /// List all networks.
    async fn list_networks(&self) -> Result<Vec<Network>>;

    /// Pull an image.
    async fn pull(&self, image: &str) -> Result<()>;

    /// List containers, with backend-native `key=value` filters passed
    /// through unchanged.
    async fn list(&self, filters: &BTreeMap<String, String>) -> Result<Vec<Container>>;

    /// Launch a container and return its identifier.
    async fn run(&self, spec: &RunSpec) -> Result<String>;

    /// Execute a command inside a running container and return its captured
    /// output. A timeout is reported as [`crate::error::Error::Timeout`],
    /// distinct from a generic failure.
    async fn execute(&self, container: &str, spec: &ExecSpec) -> Result<String>;

    /// Resource statistics for one container, or for every container when
    /// `container` is `None`.
    async fn get_stats(
        &self,
        container: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Stats>>;

    /// Remove a container. Succeeds only once the backend confirms the
    /// removal of this specific identifier.
    async fn remove(&self, container: &str, force: bool) -> Result<()>;

    /// The shared resource-limit configuration this adapter was built with.
    fn config(&self) -> &OrchestratorConfig;
}
