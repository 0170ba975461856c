use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use roamer_driver::Target;
use roamer_log::{ActionReader, LogError};

use crate::traversal::executor::{Executor, StepError};

/// Re-executes a recorded action log, one action per step, against the
/// candidate list of the moment. Ends the run at end of log.
pub struct Replay {
    reader: ActionReader<Box<dyn BufRead + Send>>,
}

impl Replay {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let file = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "replaying action log");
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(source: impl BufRead + Send + 'static) -> Self {
        let source: Box<dyn BufRead + Send> = Box::new(source);
        Self {
            reader: ActionReader::new(source),
        }
    }

    pub fn test(&mut self, exec: &mut Executor<'_>, candidates: &[Target]) -> Result<bool, StepError> {
        match self.reader.next_action()? {
            Some(action) => {
                exec.perform(&action, candidates)?;
                Ok(true)
            }
            None => {
                tracing::info!(
                    lines = self.reader.line_number(),
                    skipped = self.reader.skipped_malformed(),
                    "reached end of the action log"
                );
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for Replay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replay")
            .field("line", &self.reader.line_number())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;
    use roamer_driver::{Driver, DriverCall, ScriptedDriver, ScriptedPage};
    use roamer_log::{ActionLogger, MemoryLogSink};

    const LOG: &str = "{\n\
        \tcomment_pagesVisited: 1,\n\
        {\n\
        \tcomment_tagName: \"a\",\n\
        \taction: \"clickedTarget: 0\",\n\
        }\n\
        }\n\
        \tcomment_something new,\n\
        \taction: \"Used Webview Back\",\n\
        --SUMMARY STATISTICS--\n";

    #[test]
    fn test_replays_actions_then_ends() {
        let mut driver = ScriptedDriver::new(
            "home",
            vec![ScriptedPage::new("home").link_to("Next", "next"), ScriptedPage::new("next")],
        );
        let calls = driver.call_log();
        let mut log = ActionLogger::new(Box::new(MemoryLogSink::new()));
        let mut replay = Replay::from_reader(Cursor::new(LOG.to_string()));

        let mut results = Vec::new();
        for _ in 0..3 {
            let candidates = driver.enumerate_candidates().unwrap();
            let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
            results.push(replay.test(&mut exec, &candidates).unwrap());
        }
        assert_eq!(results, vec![true, true, false]);
        assert_eq!(
            calls.interactions(),
            vec![DriverCall::Click(0), DriverCall::WebviewBack]
        );
    }

    #[test]
    fn test_replay_records_what_it_runs() {
        let mut driver = ScriptedDriver::new("home", vec![ScriptedPage::new("home")]);
        let sink = MemoryLogSink::new();
        let mut log = ActionLogger::new(Box::new(sink.clone()));
        let mut replay = Replay::from_reader(Cursor::new("\taction: \"Slept\",\n".to_string()));

        let mut exec = Executor::new(&mut driver, &mut log, Duration::ZERO);
        assert!(replay.test(&mut exec, &[]).unwrap());
        assert_eq!(sink.lines(), vec!["{", "\taction: \"Slept\",", "}"]);
    }

    #[test]
    fn test_missing_log_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Replay::open(dir.path().join("absent.log")),
            Err(LogError::Io(_))
        ));
    }
}
