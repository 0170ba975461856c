use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use roamer_driver::Target;
use roamer_log::{Action, BACKSPACE};

use crate::traversal::executor::{Executor, StepError};

const DEAD_END_ALERT: &str = "alert: \"Dead-end search detected...\",";
const FALLBACK_INPUT: &str = "a";

/// Act on one uniformly chosen target per step. Inputs are cleared first and
/// then filled with a random dictionary entry.
#[derive(Debug)]
pub struct RandomWalk {
    rng: ChaCha8Rng,
    dictionary: Vec<String>,
}

impl RandomWalk {
    pub fn new(seed: u64, dictionary: Vec<String>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            dictionary,
        }
    }

    pub fn test(&mut self, exec: &mut Executor<'_>, candidates: &[Target]) -> Result<bool, StepError> {
        if candidates.is_empty() {
            exec.perform(&Action::WebviewBack, candidates)?;
            return Ok(true);
        }

        let index = self.rng.gen_range(0..candidates.len());
        let target = &candidates[index];
        let action = if target.is_input() {
            let had_text = self.clear_input(exec, index, candidates)?;
            if had_text && candidates.len() <= 1 {
                exec.comment(DEAD_END_ALERT)?;
                Action::input(index, BACKSPACE)
            } else {
                Action::input(index, self.pick_input())
            }
        } else if target.is_external_link() {
            Action::external(index)
        } else {
            Action::click(index)
        };
        exec.perform(&action, candidates)?;
        Ok(true)
    }

    /// Backspace until the input is empty. Returns whether it held text.
    fn clear_input(
        &mut self,
        exec: &mut Executor<'_>,
        index: usize,
        candidates: &[Target],
    ) -> Result<bool, StepError> {
        let mut remaining = exec.input_len(index)?;
        let had_text = remaining != 0;
        // One extra attempt covers an input that reports a stale length.
        let mut budget = remaining + 1;
        while remaining != 0 && budget > 0 {
            exec.perform(&Action::input(index, BACKSPACE), candidates)?;
            remaining = exec.input_len(index)?;
            budget -= 1;
        }
        if remaining != 0 {
            tracing::warn!(index, remaining, "input did not clear");
        }
        Ok(had_text)
    }

    fn pick_input(&mut self) -> String {
        self.dictionary
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_INPUT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use roamer_driver::{Driver, DriverCall, ScriptedDriver, ScriptedPage};
    use roamer_log::{ActionLogger, MemoryLogSink};

    fn dictionary() -> Vec<String> {
        vec!["x".to_string(), "yz".to_string()]
    }

    #[test]
    fn test_clears_then_fills_input() {
        let mut driver = ScriptedDriver::new(
            "form",
            vec![ScriptedPage::new("form").input_with("Query", "abc")],
        );
        let calls = driver.call_log();
        let candidates = driver.enumerate_candidates().unwrap();
        let mut log = ActionLogger::new(Box::new(MemoryLogSink::new()));
        let mut strategy = RandomWalk::new(7, dictionary());

        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        assert!(strategy.test(&mut exec, &candidates).unwrap());
        // Lone input with text: cleared, then the dead-end backspace.
        assert_eq!(calls.count(&DriverCall::Backspace(0)), 4);
        assert_eq!(driver.input_text("form", 0), Some(""));

        let candidates = driver.enumerate_candidates().unwrap();
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        assert!(strategy.test(&mut exec, &candidates).unwrap());
        let typed = driver.input_text("form", 0).unwrap().to_string();
        assert!(dictionary().contains(&typed));
    }

    #[test]
    fn test_dead_end_is_logged() {
        let mut driver = ScriptedDriver::new(
            "form",
            vec![ScriptedPage::new("form").input_with("Query", "q")],
        );
        let candidates = driver.enumerate_candidates().unwrap();
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut strategy = RandomWalk::new(1, dictionary());

        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        strategy.test(&mut exec, &candidates).unwrap();
        assert!(sink
            .lines()
            .contains(&"\tcomment_alert: \"Dead-end search detected...\",".to_string()));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let pages = || {
            vec![ScriptedPage::new("home")
                .link_to("A", "home")
                .link_to("B", "home")
                .input("Q")
                .link_to("C", "home")]
        };
        let run = |seed: u64| {
            let mut driver = ScriptedDriver::new("home", pages());
            let calls = driver.call_log();
            let mut log = ActionLogger::new(Box::new(MemoryLogSink::new()));
            let mut strategy = RandomWalk::new(seed, dictionary());
            for _ in 0..20 {
                let candidates = driver.enumerate_candidates().unwrap();
                let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
                strategy.test(&mut exec, &candidates).unwrap();
            }
            calls.interactions()
        };
        let first = run(42);
        assert!(first.len() >= 20);
        assert_eq!(first, run(42));
    }

    #[test]
    fn test_empty_page_backs_out() {
        let mut driver = ScriptedDriver::new("blank", vec![ScriptedPage::new("blank")]);
        let calls = driver.call_log();
        let mut log = ActionLogger::new(Box::new(MemoryLogSink::new()));
        let mut strategy = RandomWalk::new(0, Vec::new());

        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        assert!(strategy.test(&mut exec, &[]).unwrap());
        assert_eq!(calls.interactions(), vec![DriverCall::WebviewBack]);
    }

    #[test]
    fn test_empty_dictionary_falls_back() {
        let mut strategy = RandomWalk::new(0, Vec::new());
        assert_eq!(strategy.pick_input(), "a");
    }
}
