pub mod cli;
pub mod http;
pub mod units;

pub use cli::CliOrchestrator;
pub use http::HttpOrchestrator;
