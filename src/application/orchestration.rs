use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::domain::{Container, ExecSpec, Network, RunSpec, Stats};
use crate::error::Result;
use crate::ports::Orchestrator;

/// Facade decoupling callers from a concrete backend choice.
///
/// Every method forwards to the configured adapter unchanged; there is no
/// independent logic and no state beyond the adapter reference.
pub struct Orchestration {
    adapter: Arc<dyn Orchestrator>,
}

impl Orchestration {
    pub fn new(adapter: Arc<dyn Orchestrator>) -> Self {
        Self { adapter }
    }

    pub async fn create_network(&self, name: &str, internal: bool) -> Result<()> {
        self.adapter.create_network(name, internal).await
    }

    pub async fn remove_network(&self, name: &str) -> Result<()> {
        self.adapter.remove_network(name).await
    }

    pub async fn network_connect(&self, container: &str, network: &str) -> Result<()> {
        self.adapter.network_connect(container, network).await
    }

    pub async fn network_disconnect(
        &self,
        container: &str,
        network: &str,
        force: bool,
    ) -> Result<()> {
        self.adapter.network_disconnect(container, network, force).await
    }

    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        self.adapter.list_networks().await
    }

    pub async fn pull(&self, image: &str) -> Result<()> {
        self.adapter.pull(image).await
    }

    pub async fn list(&self, filters: &BTreeMap<String, String>) -> Result<Vec<Container>> {
        self.adapter.list(filters).await
    }

    pub async fn run(&self, spec: &RunSpec) -> Result<String> {
        self.adapter.run(spec).await
    }

    pub async fn execute(&self, container: &str, spec: &ExecSpec) -> Result<String> {
        self.adapter.execute(container, spec).await
    }

    pub async fn get_stats(
        &self,
        container: Option<&str>,
        filters: &BTreeMap<String, String>,
    ) -> Result<Vec<Stats>> {
        self.adapter.get_stats(container, filters).await
    }

    pub async fn remove(&self, container: &str, force: bool) -> Result<()> {
        self.adapter.remove(container, force).await
    }

    pub fn config(&self) -> &OrchestratorConfig {
        self.adapter.config()
    }

    /// Split a shell-ish command string into tokens, honoring single and
    /// double quotes.
    pub fn parse_command(command: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut open_quote: Option<char> = None;

        for c in command.chars() {
            match open_quote {
                Some(q) if c == q => open_quote = None,
                Some(_) => current.push(c),
                None if c == '\'' || c == '"' => open_quote = Some(c),
                None if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                None => current.push(c),
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }

        tokens
    }
}
