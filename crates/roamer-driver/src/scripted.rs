//! In-memory application model implementing [`Driver`].
//!
//! Pages are named; local links navigate between them with a webview
//! history, non-local links leave the app (sending it to the background
//! when clicked), inputs keep their text per page. Every call is appended
//! to a shared [`CallLog`] so tests can compare exact driver traffic.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::coverage::{Coverage, CoverageCounters};
use crate::driver::{Driver, DriverError};
use crate::target::{Bounds, PageSignature, Target};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Enumerate,
    Click(usize),
    Type(usize, String),
    Backspace(usize),
    WebviewBack,
    HardwareBack,
    Foreground,
    Background,
}

impl DriverCall {
    /// Whether the call acts on the application (as opposed to reading it
    /// or recovering the session).
    pub fn is_interaction(&self) -> bool {
        !matches!(
            self,
            DriverCall::Enumerate | DriverCall::Foreground | DriverCall::Background
        )
    }
}

/// Shared, append-only record of driver calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Interactions only, in call order.
    pub fn interactions(&self) -> Vec<DriverCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_interaction())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, call: &DriverCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }
}

#[derive(Debug, Clone)]
struct ScriptedTarget {
    target: Target,
    leads_to: Option<String>,
}

/// A page of the scripted application, built fluently.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    name: String,
    targets: Vec<ScriptedTarget>,
}

impl ScriptedPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: Vec::new(),
        }
    }

    /// A bundled link to another scripted page.
    pub fn link_to(mut self, label: &str, page: &str) -> Self {
        let href = format!("file:///android_asset/www/{page}.html");
        self.push(Target::link(href, label), Some(page.to_string()));
        self
    }

    /// A link that leaves the application.
    pub fn external(mut self, label: &str, href: &str) -> Self {
        self.push(Target::link(href, label), None);
        self
    }

    pub fn input(mut self, label: &str) -> Self {
        self.push(Target::input(label), None);
        self
    }

    pub fn input_with(mut self, label: &str, value: &str) -> Self {
        self.push(Target::input(label).with_value(value), None);
        self
    }

    pub fn other(mut self, label: &str) -> Self {
        self.push(Target::other(label), None);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn push(&mut self, target: Target, leads_to: Option<String>) {
        let row = self.targets.len() as i32;
        let bounds = Bounds {
            x: 0,
            y: row * 48,
            width: 320,
            height: 48,
        };
        self.targets.push(ScriptedTarget {
            target: target.with_bounds(bounds),
            leads_to,
        });
    }
}

pub struct ScriptedDriver {
    pages: HashMap<String, ScriptedPage>,
    current: String,
    history: Vec<String>,
    inputs: HashMap<(String, usize), String>,
    in_foreground: bool,
    ended: bool,
    failures: VecDeque<DriverError>,
    counters: CoverageCounters,
    calls: CallLog,
}

impl ScriptedDriver {
    /// Start on `start`, which must be one of `pages`.
    pub fn new(start: &str, pages: Vec<ScriptedPage>) -> Self {
        let mut inputs = HashMap::new();
        for page in &pages {
            for (i, t) in page.targets.iter().enumerate() {
                if t.target.is_input() {
                    inputs.insert((page.name.clone(), i), t.target.value.clone());
                }
            }
        }
        Self {
            pages: pages.into_iter().map(|p| (p.name.clone(), p)).collect(),
            current: start.to_string(),
            history: Vec::new(),
            inputs,
            in_foreground: true,
            ended: false,
            failures: VecDeque::new(),
            counters: CoverageCounters::new(),
            calls: CallLog::default(),
        }
    }

    /// Handle on the call record, valid after the driver is moved away.
    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    /// Make the next recorded call fail with `error`.
    pub fn fail_next(&mut self, error: DriverError) {
        self.failures.push_back(error);
    }

    pub fn current_page(&self) -> &str {
        &self.current
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    pub fn is_in_foreground(&self) -> bool {
        self.in_foreground
    }

    pub fn input_text(&self, page: &str, index: usize) -> Option<&str> {
        self.inputs
            .get(&(page.to_string(), index))
            .map(String::as_str)
    }

    fn begin(&mut self, call: DriverCall) -> Result<(), DriverError> {
        if self.ended {
            return Err(DriverError::Fatal("session ended".to_string()));
        }
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn page(&self) -> Result<&ScriptedPage, DriverError> {
        self.pages
            .get(&self.current)
            .ok_or_else(|| DriverError::Fatal(format!("unknown page {:?}", self.current)))
    }

    fn scripted_target(&self, index: usize) -> Result<ScriptedTarget, DriverError> {
        self.page()?
            .targets
            .get(index)
            .cloned()
            .ok_or_else(|| DriverError::Transient(format!("no element at index {index}")))
    }

    fn input_key(&self, index: usize) -> Result<(String, usize), DriverError> {
        let target = self.scripted_target(index)?;
        if !target.target.is_input() {
            return Err(DriverError::Transient(format!(
                "element {index} does not accept text"
            )));
        }
        Ok((self.current.clone(), index))
    }

    fn go_back(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.current = previous;
        }
    }
}

impl Driver for ScriptedDriver {
    fn enumerate_candidates(&mut self) -> Result<Vec<Target>, DriverError> {
        self.begin(DriverCall::Enumerate)?;
        if !self.in_foreground {
            return Err(DriverError::Transient(
                "application is in the background".to_string(),
            ));
        }
        let page = self.page()?;
        let targets: Vec<Target> = page
            .targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut target = t.target.clone();
                if let Some(value) = self.inputs.get(&(page.name.clone(), i)) {
                    target.value = value.clone();
                }
                target
            })
            .collect();
        self.counters.record_enumeration(&targets);
        let signature = PageSignature::of_markup(&self.current);
        self.counters.record_page(signature);
        Ok(targets)
    }

    fn page_signature(&mut self) -> Result<PageSignature, DriverError> {
        if self.ended {
            return Err(DriverError::Fatal("session ended".to_string()));
        }
        Ok(PageSignature::of_markup(&self.current))
    }

    fn click(&mut self, index: usize) -> Result<(), DriverError> {
        self.begin(DriverCall::Click(index))?;
        let target = self.scripted_target(index)?;
        if let Some(next) = target.leads_to {
            let previous = std::mem::replace(&mut self.current, next);
            self.history.push(previous);
        } else if target.target.is_external_link() {
            self.in_foreground = false;
        }
        Ok(())
    }

    fn type_text(&mut self, index: usize, text: &str) -> Result<(), DriverError> {
        self.begin(DriverCall::Type(index, text.to_string()))?;
        let key = self.input_key(index)?;
        self.inputs.entry(key).or_default().push_str(text);
        Ok(())
    }

    fn backspace(&mut self, index: usize) -> Result<(), DriverError> {
        self.begin(DriverCall::Backspace(index))?;
        let key = self.input_key(index)?;
        self.inputs.entry(key).or_default().pop();
        Ok(())
    }

    fn input_len(&mut self, index: usize) -> Result<usize, DriverError> {
        let key = self.input_key(index)?;
        Ok(self.inputs.get(&key).map_or(0, |v| v.chars().count()))
    }

    fn webview_back(&mut self) -> Result<(), DriverError> {
        self.begin(DriverCall::WebviewBack)?;
        self.go_back();
        Ok(())
    }

    fn hardware_back(&mut self) -> Result<(), DriverError> {
        self.begin(DriverCall::HardwareBack)?;
        if self.in_foreground {
            self.go_back();
        } else {
            self.in_foreground = true;
        }
        Ok(())
    }

    fn foreground(&mut self) -> Result<(), DriverError> {
        self.begin(DriverCall::Foreground)?;
        self.in_foreground = true;
        Ok(())
    }

    fn background(&mut self) -> Result<(), DriverError> {
        self.begin(DriverCall::Background)?;
        self.in_foreground = false;
        Ok(())
    }

    fn record_link_clicked(&mut self, href: &str) {
        self.counters.record_click(href);
    }

    fn coverage(&self) -> Coverage {
        self.counters.snapshot()
    }

    fn end_session(&mut self) {
        tracing::debug!(page = %self.current, "scripted session ended");
        self.ended = true;
    }
}
