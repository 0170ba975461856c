use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::action::{decode, Action};
use crate::sink::LogError;

/// Reads recorded actions forward from a log, skipping everything that is
/// not an action line.
pub struct ActionReader<R> {
    source: R,
    line_number: u64,
    skipped_malformed: u64,
    finished: bool,
}

impl ActionReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ActionReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            line_number: 0,
            skipped_malformed: 0,
            finished: false,
        }
    }

    /// Next recorded action, or `None` once the log is exhausted.
    ///
    /// Malformed action lines are skipped with a warning rather than
    /// ending the replay.
    pub fn next_action(&mut self) -> Result<Option<Action>, LogError> {
        if self.finished {
            return Ok(None);
        }
        let mut line = String::new();
        loop {
            line.clear();
            if self.source.read_line(&mut line)? == 0 {
                self.finished = true;
                tracing::debug!(lines = self.line_number, "reached end of action log");
                return Ok(None);
            }
            self.line_number += 1;
            match decode(&line) {
                Ok(Some(action)) => return Ok(Some(action)),
                Ok(None) => continue,
                Err(e) => {
                    self.skipped_malformed += 1;
                    tracing::warn!(line = self.line_number, error = %e, "skipping malformed action line");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn skipped_malformed(&self) -> u64 {
        self.skipped_malformed
    }
}

impl<R: BufRead> Iterator for ActionReader<R> {
    type Item = Result<Action, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_action().transpose()
    }
}
