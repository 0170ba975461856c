pub mod strategy;
pub mod traversal;

pub use strategy::{BreadthFirst, DepthFirst, RandomWalk, Replay, Strategy, StrategyKind};
pub use traversal::executor::{compose_action, Executor, StepError};
pub use traversal::plan::PlanStack;
pub use traversal::registry::VisitedRegistry;
