pub mod container;
pub mod network;
pub mod run_spec;
pub mod stats;

pub use container::Container;
pub use network::Network;
pub use run_spec::{ExecSpec, RunSpec};
pub use stats::{IoBytes, Metric, Stats};
