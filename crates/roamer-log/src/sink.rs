use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::action::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed log line: {0}")]
    Codec(#[from] CodecError),
}

/// Durable, append-only destination for action-log lines.
pub trait LogSink: Send {
    /// Append one line. Implementations must not buffer across calls.
    fn log(&mut self, line: &str) -> Result<(), LogError>;

    /// Append several lines as written, without per-line framing.
    fn log_block(&mut self, lines: &[String]) -> Result<(), LogError> {
        for line in lines {
            self.log(line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

/// Writes lines to `<dir>/<prefix>.<n>.log`, picking the first unused `n`.
pub struct FileLogSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogSink {
    pub fn create(dir: impl AsRef<Path>, prefix: &str) -> Result<Self, LogError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut number = 0u32;
        loop {
            let path = dir.join(format!("{prefix}.{number}.log"));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    tracing::info!(path = %path.display(), "opened action log");
                    return Ok(Self {
                        writer: BufWriter::new(file),
                        path,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => number += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLogSink {
    fn log(&mut self, line: &str) -> Result<(), LogError> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LogError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink. Clones share the same buffer, so a caller can keep a
/// handle while the runner owns the sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole log as one newline-terminated text.
    pub fn contents(&self) -> String {
        let lines = self.lines.lock().unwrap();
        let mut text = String::new();
        for line in lines.iter() {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

impl LogSink for MemoryLogSink {
    fn log(&mut self, line: &str) -> Result<(), LogError> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}
