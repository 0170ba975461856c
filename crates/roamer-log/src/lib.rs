pub mod action;
pub mod reader;
pub mod recorder;
pub mod sink;
pub mod summary;

pub use action::{classify, decode, encode, encode_comment, Action, CodecError, LineKind, BACKSPACE};
pub use reader::ActionReader;
pub use recorder::ActionLogger;
pub use sink::{FileLogSink, LogError, LogSink, MemoryLogSink};
pub use summary::RunSummary;
