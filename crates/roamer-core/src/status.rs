use std::fmt;

use roamer_driver::Coverage;
use roamer_explore::StrategyKind;
use serde::{Deserialize, Serialize};

/// Lifecycle of a runner. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Snapshot of a runner, taken without waiting for an in-flight step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    /// Steps in which the strategy acted.
    pub steps_executed: u64,
    /// Coverage as of the last completed step.
    pub coverage: Coverage,
    /// Most recent step failure, recovered or not.
    pub last_error: Option<String>,
    pub strategy: StrategyKind,
}
