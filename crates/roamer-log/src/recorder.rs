use crate::action::{encode, encode_comment, Action};
use crate::sink::{LogError, LogSink};
use crate::summary::RunSummary;

/// Writes the structured action log: step braces, comment lines, action
/// lines and the closing summary block.
pub struct ActionLogger {
    sink: Box<dyn LogSink>,
    action_open: bool,
    actions_logged: u64,
}

impl ActionLogger {
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        Self {
            sink,
            action_open: false,
            actions_logged: 0,
        }
    }

    pub fn open_step(&mut self) -> Result<(), LogError> {
        self.sink.log("{")
    }

    pub fn close_step(&mut self) -> Result<(), LogError> {
        self.sink.log("}")
    }

    /// Open a per-action block unless one is already open.
    /// Returns whether this call opened it.
    pub fn begin_action(&mut self) -> Result<bool, LogError> {
        if self.action_open {
            return Ok(false);
        }
        self.sink.log("{")?;
        self.action_open = true;
        Ok(true)
    }

    pub fn end_action(&mut self) -> Result<(), LogError> {
        if self.action_open {
            self.action_open = false;
            self.sink.log("}")?;
        }
        Ok(())
    }

    /// Log free text as comment lines, one per input line.
    pub fn comment(&mut self, text: &str) -> Result<(), LogError> {
        for line in text.split('\n') {
            self.sink.log(&encode_comment(line))?;
        }
        Ok(())
    }

    /// Log a `label: "value",` comment.
    pub fn comment_field(&mut self, label: &str, value: &str) -> Result<(), LogError> {
        self.comment(&format!("{label}: \"{value}\","))
    }

    /// Record one action line. Fails without writing when the action
    /// cannot be encoded on a single line.
    pub fn action(&mut self, action: &Action) -> Result<(), LogError> {
        let line = encode(action)?;
        tracing::debug!(action = %action, "recording action");
        self.sink.log(&line)?;
        self.actions_logged += 1;
        Ok(())
    }

    pub fn summary(&mut self, summary: &RunSummary) -> Result<(), LogError> {
        self.sink.log_block(&summary.render())?;
        self.sink.flush()
    }

    pub fn flush(&mut self) -> Result<(), LogError> {
        self.sink.flush()
    }

    pub fn actions_logged(&self) -> u64 {
        self.actions_logged
    }
}
