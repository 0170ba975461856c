use roamer_driver::Target;
use roamer_log::Action;

use super::run_planned_step;
use crate::traversal::executor::{compose_action, Executor, StepError};
use crate::traversal::plan::PlanStack;
use crate::traversal::registry::VisitedRegistry;

/// Probe the next unoffered target of the current page, then step back.
/// Every forward move is unwound by exactly one webview back.
#[derive(Debug, Default)]
pub struct DepthFirst {
    registry: VisitedRegistry,
    plan: PlanStack,
}

impl DepthFirst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test(&mut self, exec: &mut Executor<'_>, candidates: &[Target]) -> Result<bool, StepError> {
        let registry = &mut self.registry;
        run_planned_step(&mut self.plan, exec, candidates, |plan, exec| {
            let signature = exec.page_signature()?;
            if let Some(index) = registry.handle_page(signature, candidates) {
                if let Some(action) = candidates.get(index).and_then(|t| compose_action(index, t)) {
                    plan.plan(action);
                }
            }
            plan.plan(Action::WebviewBack);
            Ok(())
        })
    }

    pub fn registry(&self) -> &VisitedRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &PlanStack {
        &self.plan
    }
}
