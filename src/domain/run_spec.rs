use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured description of a container to launch.
///
/// Env vars, labels and volumes use ordered maps/vectors so the backend
/// invocation built from a spec is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub command: Vec<String>,
    pub entrypoint: Option<String>,
    pub workdir: Option<String>,
    /// Bind specs in `host:container[:mode]` form.
    pub volumes: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub hostname: Option<String>,
    pub network: Option<String>,
    pub remove_on_exit: bool,
    /// Host folder bound read-write at `/tmp` inside the container.
    pub mount_folder: Option<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<String>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn with_volume(mut self, bind: impl Into<String>) -> Self {
        self.volumes.push(bind.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_remove_on_exit(mut self, remove: bool) -> Self {
        self.remove_on_exit = remove;
        self
    }

    pub fn with_mount_folder(mut self, folder: impl Into<String>) -> Self {
        self.mount_folder = Some(folder.into());
        self
    }
}

/// A command to execute inside a running container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecSpec {
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Advisory timeout; the CLI backend enforces it with a `timeout`
    /// wrapper, the HTTP backend with a request deadline.
    pub timeout_secs: Option<u64>,
}

impl ExecSpec {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ..Default::default()
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}
