use std::thread;
use std::time::Duration;

use roamer_driver::{Driver, DriverError, PageSignature, Target, TargetKind};
use roamer_log::{Action, ActionLogger, LogError, BACKSPACE};

const SMS_SCHEME: &str = "sms";
const HTTP_SCHEME: &str = "http";

/// Failure of one supervised step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("action log error: {0}")]
    Log(#[from] LogError),

    #[error("target index {index} out of range for {len} candidates")]
    TargetOutOfRange { index: usize, len: usize },
}

impl StepError {
    /// Whether re-foregrounding the application and carrying on is
    /// reasonable. Fatal driver errors and a broken action log are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StepError::Driver(error) => !error.is_fatal(),
            StepError::Log(_) => false,
            StepError::TargetOutOfRange { .. } => true,
        }
    }
}

/// Performs actions against the driver and records them in the action log.
///
/// Target actions dispatch on the kind of the target at the action's index,
/// not on the action variant, so a replayed log takes the same route the
/// recording did.
pub struct Executor<'a> {
    driver: &'a mut dyn Driver,
    log: &'a mut ActionLogger,
    settle: Duration,
}

impl<'a> Executor<'a> {
    pub fn new(driver: &'a mut dyn Driver, log: &'a mut ActionLogger, settle: Duration) -> Self {
        Self {
            driver,
            log,
            settle,
        }
    }

    /// Open a step record with the page metadata comments.
    pub fn begin_step(&mut self, candidates: &[Target]) -> Result<(), StepError> {
        let pages_visited = self.driver.coverage().pages_visited;
        self.log.open_step()?;
        self.log.comment(&format!("pagesVisited: {pages_visited},"))?;
        self.log
            .comment(&format!("pageComponents: {},", candidates.len()))?;
        Ok(())
    }

    pub fn end_step(&mut self) -> Result<(), StepError> {
        self.log.close_step()?;
        Ok(())
    }

    pub fn comment(&mut self, text: &str) -> Result<(), StepError> {
        self.log.comment(text)?;
        Ok(())
    }

    pub fn page_signature(&mut self) -> Result<PageSignature, StepError> {
        Ok(self.driver.page_signature()?)
    }

    /// Live length of an input's text.
    pub fn input_len(&mut self, index: usize) -> Result<usize, StepError> {
        Ok(self.driver.input_len(index)?)
    }

    /// Perform one action inside its own `{ … }` block.
    pub fn perform(&mut self, action: &Action, candidates: &[Target]) -> Result<(), StepError> {
        let opened = self.log.begin_action()?;
        let result = self.dispatch(action, candidates);
        if opened {
            self.log.end_action()?;
        }
        result
    }

    fn dispatch(&mut self, action: &Action, candidates: &[Target]) -> Result<(), StepError> {
        tracing::debug!(action = %action, "performing");
        match action {
            Action::ClickTarget { index } | Action::FollowExternalAndReturn { index } => {
                self.act_on_target(*index, candidates, "")
            }
            Action::InputText { index, text } => self.act_on_target(*index, candidates, text),
            Action::Delay => {
                self.log.action(action)?;
                thread::sleep(self.settle);
                Ok(())
            }
            Action::HardwareBack => {
                self.log.action(action)?;
                self.driver.hardware_back()?;
                Ok(())
            }
            Action::DelayedHardwareBack => {
                self.log.action(action)?;
                thread::sleep(self.settle);
                self.driver.hardware_back()?;
                Ok(())
            }
            Action::WebviewBack => {
                self.log.action(action)?;
                self.driver.webview_back()?;
                Ok(())
            }
        }
    }

    fn act_on_target(
        &mut self,
        index: usize,
        candidates: &[Target],
        text: &str,
    ) -> Result<(), StepError> {
        let target = candidates.get(index).ok_or(StepError::TargetOutOfRange {
            index,
            len: candidates.len(),
        })?;
        self.log_target(target)?;

        match target.kind {
            TargetKind::Input => {
                if text == BACKSPACE {
                    self.driver.backspace(index)?;
                } else {
                    self.driver.type_text(index, text)?;
                }
                self.log.action(&Action::input(index, text))?;
            }
            TargetKind::Link => {
                self.driver.record_link_clicked(&target.href);
                if target.is_external_link() {
                    self.follow_external(index, target)?;
                } else {
                    self.driver.click(index)?;
                    self.log.action(&Action::click(index))?;
                }
            }
            TargetKind::Other => {
                tracing::warn!(index, label = %target.label, "target is neither link nor input");
            }
        }
        Ok(())
    }

    /// Logged before anything happens: leaving the app may not come back.
    fn follow_external(&mut self, index: usize, target: &Target) -> Result<(), StepError> {
        self.log.action(&Action::external(index))?;
        if target.href.starts_with(SMS_SCHEME) {
            return Ok(());
        }
        if target.href.starts_with(HTTP_SCHEME) {
            thread::sleep(self.settle);
            self.driver.hardware_back()?;
        } else {
            self.driver.click(index)?;
            thread::sleep(self.settle);
            self.driver.foreground()?;
        }
        Ok(())
    }

    fn log_target(&mut self, target: &Target) -> Result<(), LogError> {
        self.log.comment_field("tagName", target.kind.tag_name())?;
        self.log.comment_field("text", &target.label)?;
        self.log.comment_field("location", &target.bounds.location())?;
        self.log.comment_field("dimension", &target.bounds.dimension())?;
        self.log.comment_field("hypertextReference", &target.href)
    }
}

/// The action that probes a target once: follow or click a link, type into
/// an empty input or clear one with text. `None` for anything else.
pub fn compose_action(index: usize, target: &Target) -> Option<Action> {
    match target.kind {
        TargetKind::Link if target.is_external_link() => Some(Action::external(index)),
        TargetKind::Link => Some(Action::click(index)),
        TargetKind::Input if target.value.is_empty() => Some(Action::input(index, "a")),
        TargetKind::Input => Some(Action::input(index, BACKSPACE)),
        TargetKind::Other => {
            tracing::warn!(index, "no action for target that is neither link nor input");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roamer_driver::{DriverCall, ScriptedDriver, ScriptedPage};
    use roamer_log::MemoryLogSink;

    fn app() -> ScriptedDriver {
        ScriptedDriver::new(
            "home",
            vec![
                ScriptedPage::new("home")
                    .link_to("List", "list")
                    .external("Site", "http://example.com")
                    .external("Text", "sms:5550100")
                    .external("Call", "tel:5550100")
                    .input_with("Search", "hi")
                    .other("Banner"),
                ScriptedPage::new("list"),
            ],
        )
    }

    fn action_lines(sink: &MemoryLogSink) -> Vec<String> {
        sink.lines()
            .into_iter()
            .filter(|l| l.starts_with("\taction: "))
            .collect()
    }

    #[test]
    fn test_local_click_logs_after_clicking() {
        let mut driver = app();
        let calls = driver.call_log();
        let candidates = driver.enumerate_candidates().unwrap();
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));

        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        exec.perform(&Action::click(0), &candidates).unwrap();

        assert_eq!(calls.interactions(), vec![DriverCall::Click(0)]);
        let lines = sink.lines();
        assert_eq!(lines.first().map(String::as_str), Some("{"));
        assert_eq!(lines.last().map(String::as_str), Some("}"));
        assert!(lines.contains(&"\tcomment_tagName: \"a\",".to_string()));
        assert!(lines.contains(&"\tcomment_location: \"(0, 0)\",".to_string()));
        assert_eq!(action_lines(&sink), vec!["\taction: \"clickedTarget: 0\","]);
        assert_eq!(driver.current_page(), "list");
        assert_eq!(driver.coverage().links_clicked, 1);
    }

    #[test]
    fn test_external_links_by_scheme() {
        let mut driver = app();
        let calls = driver.call_log();
        let candidates = driver.enumerate_candidates().unwrap();
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);

        exec.perform(&Action::external(1), &candidates).unwrap();
        exec.perform(&Action::external(2), &candidates).unwrap();
        exec.perform(&Action::external(3), &candidates).unwrap();

        assert_eq!(
            calls.calls()[1..],
            [
                DriverCall::HardwareBack,
                DriverCall::Click(3),
                DriverCall::Foreground,
            ]
        );
        assert_eq!(
            action_lines(&sink),
            vec![
                "\taction: \"Briefly Visiting Target#1\",",
                "\taction: \"Briefly Visiting Target#2\",",
                "\taction: \"Briefly Visiting Target#3\",",
            ]
        );
        assert!(driver.is_in_foreground());
        assert_eq!(driver.coverage().links_clicked, 3);
    }

    #[test]
    fn test_external_action_is_logged_even_when_driver_fails() {
        let mut driver = app();
        let candidates = driver.enumerate_candidates().unwrap();
        driver.fail_next(DriverError::Fatal("device gone".to_string()));
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);

        let err = exec.perform(&Action::external(3), &candidates).unwrap_err();
        assert!(!err.is_recoverable());
        assert_eq!(action_lines(&sink), vec!["\taction: \"Briefly Visiting Target#3\","]);
        assert_eq!(sink.lines().last().map(String::as_str), Some("}"));
    }

    #[test]
    fn test_backspace_token_sends_one_key() {
        let mut driver = app();
        let candidates = driver.enumerate_candidates().unwrap();
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);

        exec.perform(&Action::input(4, BACKSPACE), &candidates).unwrap();
        exec.perform(&Action::input(4, "yo"), &candidates).unwrap();
        assert_eq!(driver.input_text("home", 4), Some("hyo"));
        assert_eq!(
            action_lines(&sink),
            vec![
                "\taction: \"Input to Target#4:Keys.BACK_SPACE\",",
                "\taction: \"Input to Target#4:yo\",",
            ]
        );
    }

    #[test]
    fn test_other_target_and_out_of_range() {
        let mut driver = app();
        let calls = driver.call_log();
        let candidates = driver.enumerate_candidates().unwrap();
        let mut log = ActionLogger::new(Box::new(MemoryLogSink::new()));
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);

        exec.perform(&Action::click(5), &candidates).unwrap();
        assert!(calls.interactions().is_empty());

        let err = exec.perform(&Action::click(9), &candidates).unwrap_err();
        assert!(matches!(err, StepError::TargetOutOfRange { index: 9, len: 6 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_step_record_carries_page_metadata() {
        let mut driver = app();
        let candidates = driver.enumerate_candidates().unwrap();
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);

        exec.begin_step(&candidates).unwrap();
        exec.perform(&Action::WebviewBack, &candidates).unwrap();
        exec.end_step().unwrap();
        assert_eq!(
            sink.lines(),
            vec![
                "{",
                "\tcomment_pagesVisited: 1,",
                "\tcomment_pageComponents: 6,",
                "{",
                "\taction: \"Used Webview Back\",",
                "}",
                "}",
            ]
        );
    }

    #[test]
    fn test_compose_action_by_target() {
        let local = Target::link("file:///android_asset/www/a.html", "A");
        let remote = Target::link("mailto:x@example.com", "Mail");
        assert_eq!(compose_action(0, &local), Some(Action::click(0)));
        assert_eq!(compose_action(1, &remote), Some(Action::external(1)));
        assert_eq!(compose_action(2, &Target::input("q")), Some(Action::input(2, "a")));
        assert_eq!(
            compose_action(3, &Target::input("q").with_value("x")),
            Some(Action::input(3, BACKSPACE))
        );
        assert_eq!(compose_action(4, &Target::other("div")), None);
    }
}
