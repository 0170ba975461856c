//! Exploration strategies.
//!
//! Each strategy consumes the candidate list of the current screen and
//! performs at most a handful of actions through an [`Executor`] per call.
//! `test` returns `Ok(false)` when the strategy has nothing left to do,
//! which ends the run.

pub mod breadth_first;
pub mod depth_first;
pub mod random;
pub mod replay;

use std::fmt;

use roamer_driver::Target;
use serde::{Deserialize, Serialize};

use crate::traversal::executor::{Executor, StepError};
use crate::traversal::plan::PlanStack;

pub use breadth_first::BreadthFirst;
pub use depth_first::DepthFirst;
pub use random::RandomWalk;
pub use replay::Replay;

/// Strategy selector, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    DepthFirst,
    BreadthFirst,
    Random,
    Replay,
}

impl StrategyKind {
    /// Name used in the run summary.
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::DepthFirst => "Depth-First Tester",
            StrategyKind::BreadthFirst => "Breadth-First Tester",
            StrategyKind::Random => "Random Coverage Tester",
            StrategyKind::Replay => "Log Replay Tester",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::DepthFirst => "depth_first",
            StrategyKind::BreadthFirst => "breadth_first",
            StrategyKind::Random => "random",
            StrategyKind::Replay => "replay",
        };
        f.write_str(name)
    }
}

pub enum Strategy {
    DepthFirst(DepthFirst),
    BreadthFirst(BreadthFirst),
    Random(RandomWalk),
    Replay(Replay),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::DepthFirst(_) => StrategyKind::DepthFirst,
            Strategy::BreadthFirst(_) => StrategyKind::BreadthFirst,
            Strategy::Random(_) => StrategyKind::Random,
            Strategy::Replay(_) => StrategyKind::Replay,
        }
    }

    /// Run one step against the current screen. `Ok(false)` means the
    /// strategy is done.
    pub fn test(&mut self, exec: &mut Executor<'_>, candidates: &[Target]) -> Result<bool, StepError> {
        match self {
            Strategy::DepthFirst(s) => s.test(exec, candidates),
            Strategy::BreadthFirst(s) => s.test(exec, candidates),
            Strategy::Random(s) => s.test(exec, candidates),
            Strategy::Replay(s) => s.test(exec, candidates),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.kind()).finish()
    }
}

/// Shared step of the registry-backed strategies: plan (or back out of an
/// empty page), promote, then pop and perform the next ready action.
pub(crate) fn run_planned_step<F>(
    plan: &mut PlanStack,
    exec: &mut Executor<'_>,
    candidates: &[Target],
    plan_moves: F,
) -> Result<bool, StepError>
where
    F: FnOnce(&mut PlanStack, &mut Executor<'_>) -> Result<(), StepError>,
{
    if candidates.is_empty() {
        plan.plan(roamer_log::Action::WebviewBack);
    } else {
        plan_moves(plan, exec)?;
    }
    plan.promote_fresh();

    let leads_with_input = candidates.first().is_some_and(Target::is_input);
    match plan.take_next(leads_with_input) {
        Some(action) => {
            exec.perform(&action, candidates)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
