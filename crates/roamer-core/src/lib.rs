pub mod config;
pub mod runner;
pub mod status;

pub use config::{ConfigError, ExplorerConfig};
pub use runner::{Runner, RunnerError};
pub use status::{RunState, RunStatus};
