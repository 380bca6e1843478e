use std::env;

/// Registry credentials, passed through to the backend as-is.
///
/// The CLI backend feeds them to `docker login` once at construction; the
/// HTTP backend encodes them into the `X-Registry-Auth` header on every
/// request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Adapter configuration, fixed at construction time.
///
/// Resource limits (`cpus`, `memory_mb`, `swap_mb`) are read when building
/// `run` invocations; a zero value means "no limit" and the corresponding
/// flag is never emitted. The namespace prefixes the provenance label that
/// tags every container created through this crate.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub namespace: String,
    pub cpus: f64,
    pub memory_mb: u64,
    pub swap_mb: u64,
    /// Path to the docker executable (CLI backend).
    pub binary: String,
    /// Base URL of the engine HTTP endpoint (HTTP backend).
    pub endpoint: String,
    pub credentials: Option<Credentials>,
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self {
            namespace: "utopia".to_string(),
            cpus: 0.0,
            memory_mb: 0,
            swap_mb: 0,
            binary: "docker".to_string(),
            endpoint: "http://localhost:2375".to_string(),
            credentials: None,
        }
    }

    pub fn from_env() -> Self {
        let base = Self::new();
        Self {
            namespace: env::var("DOCKHAND_NAMESPACE").unwrap_or(base.namespace),
            cpus: env::var("DOCKHAND_CPUS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.cpus),
            memory_mb: env::var("DOCKHAND_MEMORY_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.memory_mb),
            swap_mb: env::var("DOCKHAND_SWAP_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.swap_mb),
            binary: env::var("DOCKHAND_DOCKER_BIN").unwrap_or(base.binary),
            endpoint: env::var("DOCKER_HOST")
                .ok()
                .filter(|s| s.starts_with("http"))
                .unwrap_or(base.endpoint),
            credentials: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_cpus(mut self, cpus: f64) -> Self {
        self.cpus = cpus;
        self
    }

    pub fn with_memory_mb(mut self, memory_mb: u64) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    pub fn with_swap_mb(mut self, swap_mb: u64) -> Self {
        self.swap_mb = swap_mb;
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::new();
        assert_eq!(config.namespace, "utopia");
        assert_eq!(config.cpus, 0.0);
        assert_eq!(config.memory_mb, 0);
        assert_eq!(config.swap_mb, 0);
        assert_eq!(config.binary, "docker");
    }

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::new()
            .with_namespace("runtimes")
            .with_cpus(2.5)
            .with_memory_mb(512)
            .with_swap_mb(1024);
        assert_eq!(config.namespace, "runtimes");
        assert_eq!(config.cpus, 2.5);
        assert_eq!(config.memory_mb, 512);
        assert_eq!(config.swap_mb, 1024);
    }
}
