//! Uniform async API over two interchangeable Docker backends: the `docker`
//! command-line binary and the Engine HTTP API.
//!
//! The [`Orchestrator`] trait is the backend contract; [`CliOrchestrator`]
//! and [`HttpOrchestrator`] implement it, and [`Orchestration`] is a thin
//! facade over whichever one the caller constructs:
//!
//! ```no_run
//! use std::sync::Arc;
//! use dockhand::{CliOrchestrator, Orchestration, OrchestratorConfig, RunSpec};
//!
//! # async fn demo() -> dockhand::Result<()> {
//! let config = OrchestratorConfig::new().with_namespace("runtimes").with_memory_mb(512);
//! let orchestration = Orchestration::new(Arc::new(CliOrchestrator::new(config).await));
//!
//! let id = orchestration
//!     .run(&RunSpec::new("alpine:3.20", "worker").with_remove_on_exit(true))
//!     .await?;
//! orchestration.remove(&id, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{CliOrchestrator, HttpOrchestrator};
pub use application::Orchestration;
pub use config::{Credentials, OrchestratorConfig};
pub use domain::{Container, ExecSpec, IoBytes, Metric, Network, RunSpec, Stats};
pub use error::{Error, Result};
pub use ports::Orchestrator;
