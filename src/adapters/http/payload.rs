//! Engine API request bodies and the fixed native-to-domain field mapping.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::adapters::cli::args::sanitize_env_key;
use crate::config::OrchestratorConfig;
use crate::domain::{Container, IoBytes, Metric, Network, RunSpec, Stats};

const BYTES_PER_MB: i64 = 1024 * 1024;

#[derive(Debug, Serialize)]
pub(crate) struct CreateNetworkBody {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Internal")]
    pub internal: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConnectBody {
    #[serde(rename = "Container")]
    pub container: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DisconnectBody {
    #[serde(rename = "Container")]
    pub container: String,
    #[serde(rename = "Force")]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateContainerBody {
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "Cmd", skip_serializing_if = "Vec::is_empty")]
    cmd: Vec<String>,
    #[serde(rename = "Entrypoint", skip_serializing_if = "Option::is_none")]
    entrypoint: Option<Vec<String>>,
    #[serde(rename = "Env", skip_serializing_if = "Vec::is_empty")]
    env: Vec<String>,
    #[serde(rename = "WorkingDir", skip_serializing_if = "Option::is_none")]
    working_dir: Option<String>,
    #[serde(rename = "Hostname", skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(rename = "Labels")]
    labels: BTreeMap<String, String>,
    #[serde(rename = "HostConfig")]
    host_config: HostConfigBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct HostConfigBody {
    #[serde(rename = "Binds", skip_serializing_if = "Vec::is_empty")]
    binds: Vec<String>,
    #[serde(rename = "NetworkMode", skip_serializing_if = "Option::is_none")]
    network_mode: Option<String>,
    #[serde(rename = "AutoRemove")]
    auto_remove: bool,
    #[serde(rename = "NanoCpus", skip_serializing_if = "Option::is_none")]
    nano_cpus: Option<i64>,
    #[serde(rename = "Memory", skip_serializing_if = "Option::is_none")]
    memory: Option<i64>,
    #[serde(rename = "MemorySwap", skip_serializing_if = "Option::is_none")]
    memory_swap: Option<i64>,
}

/// Build the create-container payload with the same semantic fields as the
/// CLI argument builder, resource limits included.
pub(crate) fn create_container_body(
    spec: &RunSpec,
    config: &OrchestratorConfig,
) -> CreateContainerBody {
    let env: Vec<String> = spec
        .env
        .iter()
        .filter_map(|(key, value)| {
            let key = sanitize_env_key(key);
            if key.is_empty() {
                None
            } else {
                Some(format!("{key}={value}"))
            }
        })
        .collect();

    let mut labels = BTreeMap::new();
    labels.insert(
        format!("{}-created", config.namespace),
        chrono::Utc::now().timestamp_millis().to_string(),
    );
    for (key, value) in &spec.labels {
        if !key.is_empty() {
            labels.insert(key.clone(), value.clone());
        }
    }

    let mut binds = Vec::new();
    if let Some(folder) = &spec.mount_folder {
        if !folder.is_empty() {
            binds.push(format!("{folder}:/tmp:rw"));
        }
    }
    binds.extend(spec.volumes.iter().filter(|b| !b.is_empty()).cloned());

    CreateContainerBody {
        image: spec.image.clone(),
        cmd: spec.command.iter().filter(|t| !t.is_empty()).cloned().collect(),
        entrypoint: spec
            .entrypoint
            .as_ref()
            .filter(|e| !e.is_empty())
            .map(|e| vec![e.clone()]),
        env,
        working_dir: spec.workdir.clone().filter(|w| !w.is_empty()),
        hostname: spec.hostname.clone().filter(|h| !h.is_empty()),
        labels,
        host_config: HostConfigBody {
            binds,
            network_mode: spec.network.clone().filter(|n| !n.is_empty()),
            auto_remove: spec.remove_on_exit,
            nano_cpus: (config.cpus > 0.0).then(|| (config.cpus * 1e9) as i64),
            memory: (config.memory_mb > 0).then(|| config.memory_mb as i64 * BYTES_PER_MB),
            memory_swap: (config.swap_mb > 0).then(|| config.swap_mb as i64 * BYTES_PER_MB),
        },
    }
}

/// The engine's listing filter object: each key maps to a list of values.
pub(crate) fn filters_json(filters: &BTreeMap<String, String>) -> String {
    let object: BTreeMap<&str, Vec<&str>> = filters
        .iter()
        .map(|(key, value)| (key.as_str(), vec![value.as_str()]))
        .collect();
    serde_json::to_string(&object).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedResponse {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecCreateBody {
    #[serde(rename = "AttachStdout")]
    pub attach_stdout: bool,
    #[serde(rename = "AttachStderr")]
    pub attach_stderr: bool,
    #[serde(rename = "Tty")]
    pub tty: bool,
    #[serde(rename = "Env", skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(rename = "Cmd")]
    pub cmd: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecStartBody {
    #[serde(rename = "Detach")]
    pub detach: bool,
    #[serde(rename = "Tty")]
    pub tty: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecInspectResponse {
    #[serde(rename = "ExitCode", default)]
    pub exit_code: Option<i64>,
}

/// `GET /containers/json` entry, native field names.
#[derive(Debug, Deserialize)]
pub(crate) struct ContainerSummary {
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Labels", default)]
    labels: HashMap<String, String>,
}

impl ContainerSummary {
    pub(crate) fn into_container(self) -> Container {
        let name = self
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();
        Container::new(name, self.id, self.status, self.labels)
    }
}

/// `GET /networks` entry, native field names.
#[derive(Debug, Deserialize)]
pub(crate) struct NetworkSummary {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "Driver", default)]
    driver: String,
    #[serde(rename = "Scope", default)]
    scope: String,
}

impl NetworkSummary {
    pub(crate) fn into_network(self) -> Network {
        Network::new(self.name, self.id, self.driver, self.scope)
    }
}

/// Raw engine stats sample (`GET /containers/{id}/stats?stream=false`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EngineStats {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    cpu_stats: CpuStats,
    #[serde(default)]
    precpu_stats: CpuStats,
    #[serde(default)]
    memory_stats: MemoryStats,
    #[serde(default)]
    networks: HashMap<String, NetworkIo>,
    #[serde(default)]
    blkio_stats: BlkioStats,
}

#[derive(Debug, Default, Deserialize)]
struct CpuStats {
    #[serde(default)]
    cpu_usage: CpuUsage,
    #[serde(default)]
    system_cpu_usage: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CpuUsage {
    #[serde(default)]
    total_usage: u64,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryStats {
    #[serde(default)]
    usage: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkIo {
    #[serde(default)]
    rx_bytes: u64,
    #[serde(default)]
    tx_bytes: u64,
}

#[derive(Debug, Default, Deserialize)]
struct BlkioStats {
    #[serde(default)]
    io_service_bytes_recursive: Option<Vec<BlkioEntry>>,
}

#[derive(Debug, Deserialize)]
struct BlkioEntry {
    #[serde(default)]
    op: String,
    #[serde(default)]
    value: u64,
}

impl EngineStats {
    /// Map a raw sample onto the domain stats shape: CPU and memory as
    /// fractions, the three IO pairs in bytes.
    pub(crate) fn into_stats(self) -> Stats {
        let mut stats = Stats::new(self.id, self.name.trim_start_matches('/').to_string());

        stats.cpu_usage = match (
            self.cpu_stats.system_cpu_usage,
            self.precpu_stats.system_cpu_usage,
        ) {
            (Some(system), Some(presystem)) => {
                let cpu_delta = self.cpu_stats.cpu_usage.total_usage as f64
                    - self.precpu_stats.cpu_usage.total_usage as f64;
                let system_delta = system as f64 - presystem as f64;
                if system_delta > 0.0 {
                    Metric::measured(cpu_delta / system_delta)
                } else {
                    Metric::measured(0.0)
                }
            }
            _ => Metric::missing(),
        };

        let usage = self.memory_stats.usage.unwrap_or(0);
        let limit = self.memory_stats.limit.unwrap_or(0);
        stats.memory_usage = if limit > 0 {
            Metric::measured(usage as f64 / limit as f64)
        } else {
            Metric::missing()
        };
        stats.memory_io = IoBytes::new(usage as f64, limit as f64);

        let (rx, tx) = self
            .networks
            .values()
            .fold((0u64, 0u64), |(rx, tx), n| (rx + n.rx_bytes, tx + n.tx_bytes));
        stats.network_io = IoBytes::new(rx as f64, tx as f64);

        let (read, write) = self
            .blkio_stats
            .io_service_bytes_recursive
            .unwrap_or_default()
            .iter()
            .fold((0u64, 0u64), |(r, w), entry| match entry.op.as_str() {
                "read" | "Read" => (r + entry.value, w),
                "write" | "Write" => (r, w + entry.value),
                _ => (r, w),
            });
        stats.disk_io = IoBytes::new(read as f64, write as f64);

        stats
    }
}

/// Exec env vars go through the same key sanitization as run env vars.
pub(crate) fn exec_env(env: &BTreeMap<String, String>) -> Vec<String> {
    env.iter()
        .filter_map(|(key, value)| {
            let key = sanitize_env_key(key);
            if key.is_empty() {
                None
            } else {
                Some(format!("{key}={value}"))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_threads_resource_limits() {
        let config = OrchestratorConfig::new()
            .with_cpus(2.0)
            .with_memory_mb(512)
            .with_swap_mb(1024);
        let spec = RunSpec::new("alpine:3.20", "worker");
        let body = serde_json::to_value(create_container_body(&spec, &config)).unwrap();

        assert_eq!(body["HostConfig"]["NanoCpus"], 2_000_000_000i64);
        assert_eq!(body["HostConfig"]["Memory"], 512i64 * 1024 * 1024);
        assert_eq!(body["HostConfig"]["MemorySwap"], 1024i64 * 1024 * 1024);
    }

    #[test]
    fn test_create_body_zero_limits_omitted() {
        let spec = RunSpec::new("alpine:3.20", "worker");
        let body = serde_json::to_value(create_container_body(&spec, &OrchestratorConfig::new()))
            .unwrap();
        let host_config = body["HostConfig"].as_object().unwrap();

        assert!(!host_config.contains_key("NanoCpus"));
        assert!(!host_config.contains_key("Memory"));
        assert!(!host_config.contains_key("MemorySwap"));
    }

    #[test]
    fn test_create_body_provenance_label() {
        let config = OrchestratorConfig::new().with_namespace("runtimes");
        let spec = RunSpec::new("alpine:3.20", "worker");
        let body = serde_json::to_value(create_container_body(&spec, &config)).unwrap();

        let value = body["Labels"]["runtimes-created"].as_str().unwrap();
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_create_body_env_sanitized_and_mount_folder_first() {
        let spec = RunSpec::new("alpine:3.20", "worker")
            .with_env("FOO BAR!", "1")
            .with_mount_folder("/data")
            .with_volume("/a:/b");
        let body = serde_json::to_value(create_container_body(&spec, &OrchestratorConfig::new()))
            .unwrap();

        assert_eq!(body["Env"][0], "FOOBAR=1");
        assert_eq!(body["HostConfig"]["Binds"][0], "/data:/tmp:rw");
        assert_eq!(body["HostConfig"]["Binds"][1], "/a:/b");
    }

    #[test]
    fn test_filters_json_list_form() {
        let mut filters = BTreeMap::new();
        filters.insert("label".to_string(), "utopia-created".to_string());
        assert_eq!(filters_json(&filters), "{\"label\":[\"utopia-created\"]}");
    }

    #[test]
    fn test_container_summary_mapping() {
        let raw = "{\"Id\":\"abc\",\"Names\":[\"/web\"],\"Status\":\"Up 1 hour\",\"Labels\":{\"env\":\"prod\"}}";
        let summary: ContainerSummary = serde_json::from_str(raw).unwrap();
        let container = summary.into_container();
        assert_eq!(container.name, "web");
        assert_eq!(container.id, "abc");
        assert_eq!(container.labels.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_engine_stats_mapping() {
        let raw = r#"{
            "id": "abc",
            "name": "/web",
            "cpu_stats": {"cpu_usage": {"total_usage": 400}, "system_cpu_usage": 2000},
            "precpu_stats": {"cpu_usage": {"total_usage": 200}, "system_cpu_usage": 1000},
            "memory_stats": {"usage": 512, "limit": 1024},
            "networks": {"eth0": {"rx_bytes": 10, "tx_bytes": 20}},
            "blkio_stats": {"io_service_bytes_recursive": [
                {"op": "Read", "value": 100},
                {"op": "Write", "value": 200}
            ]}
        }"#;
        let engine: EngineStats = serde_json::from_str(raw).unwrap();
        let stats = engine.into_stats();

        assert_eq!(stats.container_id, "abc");
        assert_eq!(stats.container_name, "web");
        assert_eq!(stats.cpu_usage.fraction, 0.2);
        assert!(stats.cpu_usage.valid);
        assert_eq!(stats.memory_usage.fraction, 0.5);
        assert_eq!(stats.memory_io, IoBytes::new(512.0, 1024.0));
        assert_eq!(stats.network_io, IoBytes::new(10.0, 20.0));
        assert_eq!(stats.disk_io, IoBytes::new(100.0, 200.0));
    }

    #[test]
    fn test_engine_stats_missing_cpu_sample() {
        let raw = r#"{"id": "abc", "name": "web", "memory_stats": {}}"#;
        let engine: EngineStats = serde_json::from_str(raw).unwrap();
        let stats = engine.into_stats();
        assert!(!stats.cpu_usage.valid);
        assert!(!stats.memory_usage.valid);
        assert_eq!(stats.cpu_usage.fraction, 0.0);
    }
}
