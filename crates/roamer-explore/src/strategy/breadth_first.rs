use roamer_driver::Target;
use roamer_log::Action;

use super::run_planned_step;
use crate::traversal::executor::{compose_action, Executor, StepError};
use crate::traversal::plan::PlanStack;
use crate::traversal::registry::VisitedRegistry;

/// Level-order exploration.
///
/// The first visit to a page plans a full excursion for every target it
/// offers: walk from the root to the page, probe the target, come back, and
/// finally return to the root. The excursion is deferred until everything
/// already planned has run, so a whole depth level drains before the next
/// one starts. Pages that lead with an input are probed once instead.
#[derive(Debug, Default)]
pub struct BreadthFirst {
    registry: VisitedRegistry,
    plan: PlanStack,
}

impl BreadthFirst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test(&mut self, exec: &mut Executor<'_>, candidates: &[Target]) -> Result<bool, StepError> {
        let registry = &mut self.registry;
        run_planned_step(&mut self.plan, exec, candidates, |plan, exec| {
            let signature = exec.page_signature()?;
            if !registry.is_exhausted(signature) {
                if candidates[0].is_input() {
                    plan_for(plan, registry.handle_page(signature, candidates), candidates);
                } else {
                    plan.plan_path_from_root();
                    while !registry.is_exhausted(signature) {
                        let Some(index) = registry.handle_page(signature, candidates) else {
                            break;
                        };
                        plan_for(plan, Some(index), candidates);
                        if !candidates.get(index).is_some_and(Target::is_external_link) {
                            plan.plan(Action::WebviewBack);
                        }
                    }
                    plan.plan_path_to_root();
                    plan.defer_fresh();
                }
            }
            if plan.is_idle() {
                plan.promote_deferred();
            }
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

fn plan_for(plan: &mut PlanStack, index: Option<usize>, candidates: &[Target]) {
    let action = index.and_then(|i| candidates.get(i).and_then(|t| compose_action(i, t)));
    if let Some(action) = action {
        plan.plan(action);
    }
}
