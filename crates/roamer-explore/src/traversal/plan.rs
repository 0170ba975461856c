use roamer_log::Action;

/// Queues that sequence multi-step moves.
///
/// A strategy pushes onto `fresh` in the order it wants things done.
/// Promoting `fresh` reverses it onto the `ready` stack so the first planned
/// action is popped first. Breadth-first parks a whole expansion in
/// `deferred`, preserving order, until `ready` and `fresh` are both empty.
#[derive(Debug, Clone, Default)]
pub struct PlanStack {
    ready: Vec<Action>,
    fresh: Vec<Action>,
    deferred: Vec<Action>,
    /// Clicks taken since traversal was last at its root page.
    path_from_root: Vec<Action>,
}

impl PlanStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&mut self, action: Action) {
        self.fresh.push(action);
    }

    /// Move freshly planned actions onto the ready stack.
    pub fn promote_fresh(&mut self) {
        while let Some(action) = self.fresh.pop() {
            self.ready.push(action);
        }
    }

    /// Park freshly planned actions, in planning order, behind earlier
    /// deferred ones.
    pub fn defer_fresh(&mut self) {
        self.deferred.append(&mut self.fresh);
    }

    /// Move all deferred actions onto the ready stack, earliest on top.
    pub fn promote_deferred(&mut self) {
        while let Some(action) = self.deferred.pop() {
            self.ready.push(action);
        }
    }

    /// Pop the next ready action and update the path from root: a webview
    /// back retracts one step, a click extends it unless the current page
    /// leads with an input.
    pub fn take_next(&mut self, page_leads_with_input: bool) -> Option<Action> {
        let action = self.ready.pop()?;
        match &action {
            Action::WebviewBack => {
                self.path_from_root.pop();
            }
            Action::ClickTarget { .. } if !page_leads_with_input => {
                self.path_from_root.push(action.clone());
            }
            _ => {}
        }
        Some(action)
    }

    /// Plan the clicks that lead from the root to the current page.
    pub fn plan_path_from_root(&mut self) {
        self.fresh.extend(self.path_from_root.iter().cloned());
    }

    /// Plan one webview back per step of the path from root.
    pub fn plan_path_to_root(&mut self) {
        for _ in 0..self.path_from_root.len() {
            self.fresh.push(Action::WebviewBack);
        }
    }

    /// Nothing ready and nothing freshly planned.
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.fresh.is_empty()
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn fresh(&self) -> &[Action] {
        &self.fresh
    }

    pub fn deferred(&self) -> &[Action] {
        &self.deferred
    }

    pub fn path_from_root(&self) -> &[Action] {
        &self.path_from_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promoted_actions_pop_in_planning_order() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(1));
        plan.plan(Action::WebviewBack);
        plan.promote_fresh();
        assert_eq!(plan.take_next(false), Some(Action::click(1)));
        assert_eq!(plan.take_next(false), Some(Action::WebviewBack));
        assert_eq!(plan.take_next(false), None);
    }

    #[test]
    fn test_newer_plans_run_before_older_ready_actions() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(1));
        plan.plan(Action::WebviewBack);
        plan.promote_fresh();
        plan.take_next(false);

        plan.plan(Action::click(2));
        plan.promote_fresh();
        assert_eq!(plan.take_next(false), Some(Action::click(2)));
        assert_eq!(plan.take_next(false), Some(Action::WebviewBack));
    }

    #[test]
    fn test_deferred_actions_keep_order_across_batches() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(1));
        plan.plan(Action::WebviewBack);
        plan.defer_fresh();
        plan.plan(Action::click(2));
        plan.defer_fresh();
        assert!(plan.is_idle());
        assert_eq!(plan.deferred().len(), 3);

        plan.promote_deferred();
        let order: Vec<Action> = std::iter::from_fn(|| plan.take_next(false)).collect();
        assert_eq!(
            order,
            vec![Action::click(1), Action::WebviewBack, Action::click(2)]
        );
    }

    #[test]
    fn test_path_from_root_tracks_clicks_and_backs() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(1));
        plan.plan(Action::click(2));
        plan.plan(Action::input(0, "a"));
        plan.plan(Action::WebviewBack);
        plan.promote_fresh();

        plan.take_next(false);
        plan.take_next(false);
        assert_eq!(plan.path_from_root(), &[Action::click(1), Action::click(2)]);
        plan.take_next(false);
        assert_eq!(plan.path_from_root().len(), 2);
        plan.take_next(false);
        assert_eq!(plan.path_from_root(), &[Action::click(1)]);
    }

    #[test]
    fn test_clicks_on_input_led_pages_are_not_on_the_path() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(1));
        plan.promote_fresh();
        plan.take_next(true);
        assert!(plan.path_from_root().is_empty());
    }

    #[test]
    fn test_back_on_empty_path_is_harmless() {
        let mut plan = PlanStack::new();
        plan.plan(Action::WebviewBack);
        plan.promote_fresh();
        assert_eq!(plan.take_next(false), Some(Action::WebviewBack));
        assert!(plan.path_from_root().is_empty());
    }

    #[test]
    fn test_path_to_and_from_root_plans() {
        let mut plan = PlanStack::new();
        plan.plan(Action::click(3));
        plan.plan(Action::click(1));
        plan.promote_fresh();
        plan.take_next(false);
        plan.take_next(false);

        plan.plan_path_from_root();
        plan.plan_path_to_root();
        assert_eq!(
            plan.fresh(),
            &[
                Action::click(3),
                Action::click(1),
                Action::WebviewBack,
                Action::WebviewBack,
            ]
        );
    }
}
