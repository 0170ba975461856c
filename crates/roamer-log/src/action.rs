//! Canonical one-line text encoding of a single interaction.
//!
//! An action line looks like `\taction: "<payload>",` and a comment line like
//! `\tcomment_<text>`. Everything else in a log (braces, summary text) is
//! ignored when decoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Input text that means "press backspace once" instead of typing.
pub const BACKSPACE: &str = "Keys.BACK_SPACE";

const ACTION_PREFIX: &str = "\taction: ";
const COMMENT_PREFIX: &str = "\tcomment_";

const CLICK: &str = "clickedTarget: ";
const INPUT: &str = "Input to Target#";
const EXTERNAL: &str = "Briefly Visiting Target#";
const DELAY: &str = "Slept";
const HARDWARE_BACK: &str = "Used Hardware Back";
const DELAYED_HARDWARE_BACK: &str = "Used Delayed Hardware Back";
const WEBVIEW_BACK: &str = "Used Webview Back";
const DATA_SEPARATOR: char = ':';

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CodecError {
    #[error("action line is not quoted: {line:?}")]
    Unquoted { line: String },

    #[error("unknown action payload: {payload:?}")]
    UnknownPayload { payload: String },

    #[error("bad target index in payload {payload:?}")]
    BadIndex { payload: String },

    #[error("input payload has no data separator: {payload:?}")]
    MissingSeparator { payload: String },

    #[error("action payload spans several lines: {payload:?}")]
    LineBreak { payload: String },
}

/// One atomic interaction with the application under test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    ClickTarget { index: usize },
    InputText { index: usize, text: String },
    FollowExternalAndReturn { index: usize },
    Delay,
    HardwareBack,
    DelayedHardwareBack,
    WebviewBack,
}

impl Action {
    pub fn click(index: usize) -> Self {
        Action::ClickTarget { index }
    }

    pub fn input(index: usize, text: impl Into<String>) -> Self {
        Action::InputText {
            index,
            text: text.into(),
        }
    }

    pub fn external(index: usize) -> Self {
        Action::FollowExternalAndReturn { index }
    }

    /// Index of the target this action operates on, if any.
    pub fn target_index(&self) -> Option<usize> {
        match self {
            Action::ClickTarget { index }
            | Action::InputText { index, .. }
            | Action::FollowExternalAndReturn { index } => Some(*index),
            _ => None,
        }
    }

    /// The text between the quotes of an action line.
    pub fn payload(&self) -> String {
        match self {
            Action::ClickTarget { index } => format!("{CLICK}{index}"),
            Action::InputText { index, text } => {
                format!("{INPUT}{index}{DATA_SEPARATOR}{text}")
            }
            Action::FollowExternalAndReturn { index } => format!("{EXTERNAL}{index}"),
            Action::Delay => DELAY.to_string(),
            Action::HardwareBack => HARDWARE_BACK.to_string(),
            Action::DelayedHardwareBack => DELAYED_HARDWARE_BACK.to_string(),
            Action::WebviewBack => WEBVIEW_BACK.to_string(),
        }
    }

    pub fn from_payload(payload: &str) -> Result<Self, CodecError> {
        if let Some(rest) = payload.strip_prefix(CLICK) {
            return Ok(Action::ClickTarget {
                index: parse_index(rest, payload)?,
            });
        }
        if let Some(rest) = payload.strip_prefix(INPUT) {
            let (index, text) =
                rest.split_once(DATA_SEPARATOR)
                    .ok_or_else(|| CodecError::MissingSeparator {
                        payload: payload.to_string(),
                    })?;
            return Ok(Action::InputText {
                index: parse_index(index, payload)?,
                text: text.to_string(),
            });
        }
        if let Some(rest) = payload.strip_prefix(EXTERNAL) {
            return Ok(Action::FollowExternalAndReturn {
                index: parse_index(rest, payload)?,
            });
        }
        match payload {
            DELAY => Ok(Action::Delay),
            HARDWARE_BACK => Ok(Action::HardwareBack),
            DELAYED_HARDWARE_BACK => Ok(Action::DelayedHardwareBack),
            WEBVIEW_BACK => Ok(Action::WebviewBack),
            _ => Err(CodecError::UnknownPayload {
                payload: payload.to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload())
    }
}

fn parse_index(digits: &str, payload: &str) -> Result<usize, CodecError> {
    digits.parse().map_err(|_| CodecError::BadIndex {
        payload: payload.to_string(),
    })
}

/// What a single log line is.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Action(Action),
    Comment(String),
    OpenBrace,
    CloseBrace,
    Other,
}

/// Encode an action as its canonical log line. A payload must fit on one
/// line or the reader could not recover it.
pub fn encode(action: &Action) -> Result<String, CodecError> {
    let payload = action.payload();
    if payload.contains(['\n', '\r']) {
        return Err(CodecError::LineBreak { payload });
    }
    Ok(format!("{ACTION_PREFIX}\"{payload}\","))
}

/// Encode one comment line. Callers split multi-line text first.
pub fn encode_comment(text: &str) -> String {
    format!("{COMMENT_PREFIX}{text}")
}

/// Classify a log line. Only lines carrying the action prefix can fail.
pub fn classify(line: &str) -> Result<LineKind, CodecError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix(ACTION_PREFIX) {
        let payload = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix("\","))
            .ok_or_else(|| CodecError::Unquoted {
                line: line.to_string(),
            })?;
        return Action::from_payload(payload).map(LineKind::Action);
    }
    if let Some(text) = line.strip_prefix(COMMENT_PREFIX) {
        return Ok(LineKind::Comment(text.to_string()));
    }
    Ok(match line {
        "{" => LineKind::OpenBrace,
        "}" => LineKind::CloseBrace,
        _ => LineKind::Other,
    })
}

/// Decode a log line; `Ok(None)` for anything that is not an action line.
pub fn decode(line: &str) -> Result<Option<Action>, CodecError> {
    match classify(line)? {
        LineKind::Action(action) => Ok(Some(action)),
        _ => Ok(None),
    }
}
